use std::io::Write;

use litgraph_core::alias::{AliasStatistics, BatchOutcome, EntryOutcome};
use litgraph_core::{CitationReport, MatchResult, ReferenceOutcome};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the result of an alias/fuzzy resolution.
pub fn print_resolution(
    w: &mut dyn Write,
    lid: Option<&str>,
    via: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    match lid {
        Some(lid) => {
            if color.enabled() {
                writeln!(w, "{} {} ({})", "resolved:".green().bold(), lid, via)
            } else {
                writeln!(w, "resolved: {} ({})", lid, via)
            }
        }
        None => {
            if color.enabled() {
                writeln!(w, "{}", "no match".yellow())
            } else {
                writeln!(w, "no match")
            }
        }
    }
}

/// Print ranked fuzzy match candidates.
pub fn print_matches(
    w: &mut dyn Write,
    matches: &[MatchResult],
    color: ColorMode,
) -> std::io::Result<()> {
    for (rank, m) in matches.iter().enumerate() {
        let fields: Vec<&str> = m.matched_fields.iter().map(|f| f.as_str()).collect();
        let line = format!(
            "{}. {}  confidence {:.3}  via [{}]",
            rank + 1,
            m.lid,
            m.confidence,
            fields.join(", ")
        );
        if color.enabled() && rank == 0 {
            writeln!(w, "{}", line.bold())?;
        } else {
            writeln!(w, "{}", line)?;
        }
    }
    Ok(())
}

/// Print per-entry outcomes of an alias registration.
pub fn print_batch_outcome(
    w: &mut dyn Write,
    outcome: &BatchOutcome,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "registered aliases for {}:", outcome.lid)?;
    for entry in &outcome.entries {
        match entry {
            EntryOutcome::Written(r) => {
                if color.enabled() {
                    writeln!(w, "  {} {} = {}", "+".green(), r.ty, r.normalized_value)?;
                } else {
                    writeln!(w, "  + {} = {}", r.ty, r.normalized_value)?;
                }
            }
            EntryOutcome::AlreadyMapped(r) => {
                writeln!(w, "  = {} = {} (already mapped)", r.ty, r.normalized_value)?;
            }
            EntryOutcome::ConflictKept(r) => {
                let line = format!(
                    "  ! {} = {} kept by {}",
                    r.ty, r.normalized_value, r.lid
                );
                if color.enabled() {
                    writeln!(w, "{}", line.red())?;
                } else {
                    writeln!(w, "{}", line)?;
                }
            }
            EntryOutcome::Skipped { ty, reason } => {
                let line = format!("  - {} skipped: {}", ty, reason);
                if color.enabled() {
                    writeln!(w, "{}", line.dimmed())?;
                } else {
                    writeln!(w, "{}", line)?;
                }
            }
        }
    }
    Ok(())
}

/// Print a citation resolution report.
pub fn print_report(
    w: &mut dyn Write,
    report: &CitationReport,
    color: ColorMode,
) -> std::io::Result<()> {
    for (index, outcome) in report.outcomes.iter().enumerate() {
        match outcome {
            ReferenceOutcome::Cited { lid, confidence } => {
                let line = format!("[{}] cited {} (confidence {:.3})", index + 1, lid, confidence);
                if color.enabled() {
                    writeln!(w, "{}", line.green())?;
                } else {
                    writeln!(w, "{}", line)?;
                }
            }
            ReferenceOutcome::Placeholder { id } => {
                let line = format!("[{}] placeholder {}", index + 1, id);
                if color.enabled() {
                    writeln!(w, "{}", line.yellow())?;
                } else {
                    writeln!(w, "{}", line)?;
                }
            }
            ReferenceOutcome::Skipped { reason } => {
                let line = format!("[{}] skipped: {}", index + 1, reason);
                if color.enabled() {
                    writeln!(w, "{}", line.dimmed())?;
                } else {
                    writeln!(w, "{}", line)?;
                }
            }
        }
    }
    writeln!(w)?;
    writeln!(
        w,
        "resolved {} / unresolved {} / skipped {}  (rate {:.1}%)",
        report.resolved_count,
        report.unresolved_count,
        report.skipped_count,
        report.resolution_rate * 100.0
    )
}

/// Print alias statistics plus graph totals.
pub fn print_stats(
    w: &mut dyn Write,
    stats: &AliasStatistics,
    literature: u64,
    edges: u64,
    unresolved: u64,
    color: ColorMode,
) -> std::io::Result<()> {
    if stats.degraded {
        let warning = "warning: storage unavailable, counts are zeroed";
        if color.enabled() {
            writeln!(w, "{}", warning.red())?;
        } else {
            writeln!(w, "{}", warning)?;
        }
    }
    writeln!(w, "alias mappings: {}", stats.total_mappings)?;
    for (ty, count) in &stats.mappings_by_type {
        writeln!(w, "  {:<8} {}", ty.to_string(), count)?;
    }
    writeln!(w, "literature:     {}", literature)?;
    writeln!(w, "citation edges: {}", edges)?;
    writeln!(w, "unresolved:     {}", unresolved)?;
    Ok(())
}

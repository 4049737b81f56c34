use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod config_file;
mod output;

use litgraph_core::{
    AliasIndex, CitationResolver, GraphStore, Lid, MatchEngine, MatchType, ReferenceInput,
    SourceRecord,
};
use litgraph_sqlite::SqliteStore;
use output::ColorMode;

/// Literature graph toolkit - resolve identifiers, deduplicate records, and
/// build the citation graph
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite graph database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a literature record: catalogue it and bind its identifiers
    Register {
        /// Path to a JSON record file
        record: PathBuf,

        /// Canonical literature ID to bind the record's identifiers to
        #[arg(long)]
        lid: String,

        /// Confidence to record on each alias
        #[arg(long, default_value_t = 1.0)]
        confidence: f64,
    },

    /// Resolve a record to a canonical literature ID
    Resolve {
        /// Path to a JSON record file (optional if identifier flags are given)
        record: Option<PathBuf>,

        /// DOI to resolve
        #[arg(long)]
        doi: Option<String>,

        /// arXiv ID to resolve
        #[arg(long)]
        arxiv: Option<String>,

        /// PubMed ID to resolve
        #[arg(long)]
        pmid: Option<String>,

        /// Title to resolve
        #[arg(long)]
        title: Option<String>,

        /// Fall back to fuzzy matching when the exact alias lookup misses
        #[arg(long)]
        fuzzy: bool,

        /// Candidates to show in fuzzy mode
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Resolve a reference list into citation edges and placeholders
    Cite {
        /// LID of the citing work
        citing: String,

        /// Path to a JSON file containing an array of references
        references: PathBuf,
    },

    /// Print alias and graph statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = config_file::load_config();

    init_tracing(&config);

    let db_path = resolve_db_path(cli.db.clone(), &config)
        .context("no database path: pass --db, set LITGRAPH_DB, or configure [store] path")?;
    let store = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("failed to open graph store at {}", db_path.display()))?,
    );

    let color = ColorMode(!cli.no_color);
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Register {
            record,
            lid,
            confidence,
        } => register(&store, &record, &lid, confidence, &mut stdout, color).await,
        Command::Resolve {
            record,
            doi,
            arxiv,
            pmid,
            title,
            fuzzy,
            limit,
        } => {
            let input = build_record(record.as_deref(), doi, arxiv, pmid, title)?;
            let limit = limit.or_else(|| config.candidate_limit()).unwrap_or(5);
            resolve(&store, &input, fuzzy, limit, &mut stdout, color).await
        }
        Command::Cite { citing, references } => {
            cite(&store, &citing, &references, &mut stdout, color).await
        }
        Command::Stats => stats(&store, &mut stdout, color).await,
    }
}

fn init_tracing(config: &config_file::ConfigFile) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| config.log_filter())
        .unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the database path: CLI flag > env var > config file > platform
/// data directory.
fn resolve_db_path(flag: Option<PathBuf>, config: &config_file::ConfigFile) -> Option<PathBuf> {
    flag.or_else(|| std::env::var("LITGRAPH_DB").ok().map(PathBuf::from))
        .or_else(|| config.store_path())
        .or_else(|| dirs::data_dir().map(|d| d.join("litgraph").join("graph.db")))
}

fn read_json(path: &std::path::Path) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn build_record(
    path: Option<&std::path::Path>,
    doi: Option<String>,
    arxiv: Option<String>,
    pmid: Option<String>,
    title: Option<String>,
) -> anyhow::Result<SourceRecord> {
    let mut record = match path {
        Some(path) => SourceRecord::from_json(&read_json(path)?),
        None => SourceRecord::default(),
    };
    // Flags override file contents.
    record.doi = doi.or(record.doi);
    record.arxiv_id = arxiv.or(record.arxiv_id);
    record.pmid = pmid.or(record.pmid);
    record.title = title.or(record.title);

    if record.is_empty() {
        anyhow::bail!("nothing to resolve: supply a record file or identifier flags");
    }
    Ok(record)
}

async fn register(
    store: &Arc<SqliteStore>,
    record_path: &std::path::Path,
    lid: &str,
    confidence: f64,
    w: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    let record = SourceRecord::from_json(&read_json(record_path)?);
    if record.is_empty() {
        anyhow::bail!("record has no identifiers to register");
    }
    let lid = Lid::new(lid);

    store
        .upsert_literature(&lid, &record)
        .map_err(|e| anyhow::anyhow!("failed to catalogue record: {e}"))?;

    let graph: Arc<dyn GraphStore> = store.clone();
    let aliases = AliasIndex::new(graph);
    let outcome = aliases
        .register_record(&record, &lid, confidence, serde_json::Value::Null)
        .await;

    output::print_batch_outcome(w, &outcome, color)?;
    Ok(())
}

async fn resolve(
    store: &Arc<SqliteStore>,
    record: &SourceRecord,
    fuzzy: bool,
    limit: usize,
    w: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    let graph: Arc<dyn GraphStore> = store.clone();
    let aliases = AliasIndex::new(graph.clone());

    if let Some(lid) = aliases.resolve(record).await {
        output::print_resolution(w, Some(lid.as_str()), "alias index", color)?;
        return Ok(());
    }

    if fuzzy {
        let engine = MatchEngine::new(graph);
        let matches = engine.find_matches(record, MatchType::General, limit).await;
        if matches.is_empty() {
            output::print_resolution(w, None, "", color)?;
        } else {
            output::print_matches(w, &matches, color)?;
        }
        return Ok(());
    }

    output::print_resolution(w, None, "", color)?;
    Ok(())
}

async fn cite(
    store: &Arc<SqliteStore>,
    citing: &str,
    references_path: &std::path::Path,
    w: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    let value = read_json(references_path)?;
    let entries = value
        .as_array()
        .context("references file must contain a JSON array")?;
    let references: Vec<ReferenceInput> = entries.iter().map(ReferenceInput::from_json).collect();

    let graph: Arc<dyn GraphStore> = store.clone();
    let resolver = CitationResolver::new(graph);
    let report = resolver
        .resolve_citations(&Lid::new(citing), &references)
        .await;

    output::print_report(w, &report, color)?;
    Ok(())
}

async fn stats(store: &Arc<SqliteStore>, w: &mut dyn Write, color: ColorMode) -> anyhow::Result<()> {
    let graph: Arc<dyn GraphStore> = store.clone();
    let aliases = AliasIndex::new(graph);
    let stats = aliases.statistics().await;

    let literature = store.literature_count().unwrap_or(0);
    let edges = store.edge_count().unwrap_or(0);
    let unresolved = store.unresolved_count().unwrap_or(0);

    output::print_stats(w, &stats, literature, edges, unresolved, color)?;
    Ok(())
}

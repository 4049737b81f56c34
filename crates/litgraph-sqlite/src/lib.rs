//! SQLite-backed [`GraphStore`] for the litgraph resolution engine.
//!
//! Layout follows the usual WAL split: a single writer connection behind a
//! mutex handles all mutations, while lookups run on a pool of read-only
//! connections (WAL mode allows concurrent readers). Every mutation is an
//! `INSERT … ON CONFLICT` merge on the row's natural key, so repeated and
//! concurrent resolution runs are harmless by construction.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags, OptionalExtension, params, params_from_iter};
use thiserror::Error;

use litgraph_core::norm::{normalize_identifier, normalize_text, tokens};
use litgraph_core::store::{
    AliasCounts, AliasRecord, AliasSpec, AliasWriteOutcome, AliasWriteResult, Candidate,
    CitationEdge, GraphStore, StoreError, StoreFuture, UnresolvedNode, now_epoch,
};
use litgraph_core::{IdentifierType, Lid, MatchType, SourceRecord};

#[derive(Error, Debug)]
pub enum SqliteStoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Candidate prefilter limits per scenario: citation matching wants recall,
/// deduplication only needs the near-exact neighborhood.
fn candidate_limit(match_type: MatchType) -> usize {
    match match_type {
        MatchType::Deduplication => 50,
        MatchType::Citation | MatchType::General => 200,
    }
}

/// Open a SQLite connection with WAL mode and standard pragmas.
fn open_sqlite(path: &Path, read_only: bool) -> Result<Connection, rusqlite::Error> {
    let flags = if read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
    };
    let conn = Connection::open_with_flags(path, flags)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS aliases (
            ty               TEXT NOT NULL,
            normalized_value TEXT NOT NULL,
            lid              TEXT NOT NULL,
            confidence       REAL NOT NULL,
            metadata         TEXT,
            created_at       INTEGER NOT NULL,
            PRIMARY KEY (ty, normalized_value)
        );

        CREATE INDEX IF NOT EXISTS idx_aliases_lid ON aliases(lid);

        CREATE TABLE IF NOT EXISTS literature (
            lid        TEXT PRIMARY KEY,
            record     TEXT NOT NULL,
            title_norm TEXT,
            doi        TEXT,
            arxiv_id   TEXT,
            pmid       TEXT,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_literature_doi ON literature(doi);
        CREATE INDEX IF NOT EXISTS idx_literature_arxiv ON literature(arxiv_id);
        CREATE INDEX IF NOT EXISTS idx_literature_pmid ON literature(pmid);

        CREATE TABLE IF NOT EXISTS citation_edges (
            from_lid   TEXT NOT NULL,
            to_key     TEXT NOT NULL,
            confidence REAL NOT NULL,
            raw_text   TEXT NOT NULL,
            source     TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (from_lid, to_key)
        );

        CREATE INDEX IF NOT EXISTS idx_edges_to ON citation_edges(to_key);

        CREATE TABLE IF NOT EXISTS unresolved_nodes (
            id         TEXT PRIMARY KEY,
            raw_text   TEXT NOT NULL,
            fragments  TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        "#,
    )
}

fn db_err(error: rusqlite::Error) -> StoreError {
    StoreError::Io(error.to_string())
}

/// Pool of read-only connections for concurrent lookups. Connections are
/// returned after use; an empty pool opens a fresh one.
struct ReadPool {
    pool: Mutex<Vec<Connection>>,
    path: PathBuf,
}

impl ReadPool {
    fn new(path: &Path) -> Self {
        Self {
            pool: Mutex::new(Vec::new()),
            path: path.to_path_buf(),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&Connection) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let conn = self
            .acquire()
            .ok_or_else(|| StoreError::Unavailable("no read connection".to_string()))?;
        let result = f(&conn);
        self.release(conn);
        result
    }

    fn acquire(&self) -> Option<Connection> {
        if let Ok(mut pool) = self.pool.lock()
            && let Some(conn) = pool.pop()
        {
            return Some(conn);
        }
        open_sqlite(&self.path, true).ok()
    }

    fn release(&self, conn: Connection) {
        if let Ok(mut pool) = self.pool.lock() {
            pool.push(conn);
        }
    }
}

/// Persistent graph store on a single SQLite file.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    read_pool: ReadPool,
}

impl SqliteStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, SqliteStoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = open_sqlite(path, false)?;
        init_schema(&conn)?;
        tracing::debug!(path = %path.display(), "opened graph store");
        Ok(Self {
            writer: Mutex::new(conn),
            read_pool: ReadPool::new(path),
        })
    }

    fn write<T>(&self, f: impl FnOnce(&Connection) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let conn = self
            .writer
            .lock()
            .map_err(|_| StoreError::Unavailable("writer lock poisoned".to_string()))?;
        f(&conn)
    }

    /// Merge a catalogued literature record into the candidate pool.
    /// Metadata may be enriched later; the LID never changes.
    pub fn upsert_literature(&self, lid: &Lid, record: &SourceRecord) -> Result<(), StoreError> {
        let record_json =
            serde_json::to_string(record).map_err(|e| StoreError::Io(e.to_string()))?;
        let title_norm = record.title.as_deref().map(normalize_text);
        let doi = record
            .doi
            .as_deref()
            .map(|v| normalize_identifier(IdentifierType::Doi, v));
        let arxiv = record
            .arxiv_id
            .as_deref()
            .map(|v| normalize_identifier(IdentifierType::Arxiv, v));
        let pmid = record
            .pmid
            .as_deref()
            .map(|v| normalize_identifier(IdentifierType::Pmid, v));

        self.write(|conn| {
            conn.prepare_cached(
                "INSERT INTO literature (lid, record, title_norm, doi, arxiv_id, pmid, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(lid) DO UPDATE SET
                     record = excluded.record,
                     title_norm = excluded.title_norm,
                     doi = excluded.doi,
                     arxiv_id = excluded.arxiv_id,
                     pmid = excluded.pmid,
                     updated_at = excluded.updated_at",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    lid.as_str(),
                    record_json,
                    title_norm,
                    doi,
                    arxiv,
                    pmid,
                    now_epoch() as i64,
                ])
            })
            .map_err(db_err)?;
            Ok(())
        })
    }

    pub fn literature_count(&self) -> Result<u64, StoreError> {
        self.count_table("literature")
    }

    pub fn edge_count(&self) -> Result<u64, StoreError> {
        self.count_table("citation_edges")
    }

    pub fn unresolved_count(&self) -> Result<u64, StoreError> {
        self.count_table("unresolved_nodes")
    }

    fn count_table(&self, table: &str) -> Result<u64, StoreError> {
        // Table names are fixed strings from this module, never user input.
        let sql = format!("SELECT COUNT(*) FROM {table}");
        self.read_pool.with(|conn| {
            conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n as u64)
                .map_err(db_err)
        })
    }
}

fn load_alias(
    conn: &Connection,
    ty: IdentifierType,
    normalized_value: &str,
) -> Result<Option<AliasRecord>, StoreError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT lid, confidence, metadata, created_at
             FROM aliases WHERE ty = ?1 AND normalized_value = ?2",
        )
        .map_err(db_err)?;
    let row = stmt
        .query_row(params![ty.as_str(), normalized_value], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .optional()
        .map_err(db_err)?;

    Ok(row.map(|(lid, confidence, metadata, created_at)| AliasRecord {
        id: AliasRecord::handle(ty, normalized_value),
        ty,
        normalized_value: normalized_value.to_string(),
        lid: Lid::new(lid),
        confidence,
        metadata: metadata
            .and_then(|m| serde_json::from_str(&m).ok())
            .unwrap_or(serde_json::Value::Null),
        created_at: created_at.max(0) as u64,
    }))
}

/// Merge one alias fact. The insert never overwrites: on key conflict the
/// existing row wins and the outcome reports whose claim survived.
fn merge_alias(conn: &Connection, spec: &AliasSpec) -> Result<AliasWriteOutcome, StoreError> {
    let metadata_json =
        serde_json::to_string(&spec.metadata).unwrap_or_else(|_| "null".to_string());
    let inserted = conn
        .prepare_cached(
            "INSERT INTO aliases (ty, normalized_value, lid, confidence, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(ty, normalized_value) DO NOTHING",
        )
        .and_then(|mut stmt| {
            stmt.execute(params![
                spec.ty.as_str(),
                spec.normalized_value,
                spec.lid.as_str(),
                spec.confidence,
                metadata_json,
                now_epoch() as i64,
            ])
        })
        .map_err(db_err)?;

    let record = load_alias(conn, spec.ty, &spec.normalized_value)?.ok_or_else(|| {
        StoreError::Corrupt {
            key: AliasRecord::handle(spec.ty, &spec.normalized_value),
            detail: "alias row missing after merge".to_string(),
        }
    })?;

    if inserted == 1 {
        Ok(AliasWriteOutcome::Created(record))
    } else if record.lid == spec.lid {
        Ok(AliasWriteOutcome::Existing(record))
    } else {
        Ok(AliasWriteOutcome::Conflict {
            existing: record,
            rejected: spec.lid.clone(),
        })
    }
}

fn query_candidates(
    conn: &Connection,
    record: &SourceRecord,
    limit: usize,
) -> Result<Vec<Candidate>, StoreError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();

    for (column, ty) in [
        ("doi", IdentifierType::Doi),
        ("arxiv_id", IdentifierType::Arxiv),
        ("pmid", IdentifierType::Pmid),
    ] {
        if let Some(value) = record.identifier(ty) {
            clauses.push(format!("{column} = ?{}", values.len() + 1));
            values.push(normalize_identifier(ty, value));
        }
    }

    if let Some(title) = record.title.as_deref() {
        let all = tokens(title);
        let mut long: Vec<&String> = all.iter().filter(|t| t.len() >= 4).take(6).collect();
        if long.is_empty() {
            long = all.iter().take(6).collect();
        }
        for token in long {
            clauses.push(format!("title_norm LIKE ?{}", values.len() + 1));
            values.push(format!("%{token}%"));
        }
    }

    if clauses.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT lid, record FROM literature WHERE {} LIMIT {limit}",
        clauses.join(" OR "),
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(db_err)?;

    let mut candidates = Vec::new();
    for row in rows {
        let (lid, record_json) = row.map_err(db_err)?;
        match serde_json::from_str::<SourceRecord>(&record_json) {
            Ok(record) => candidates.push(Candidate {
                lid: Lid::new(lid),
                record,
            }),
            Err(error) => {
                tracing::warn!(%lid, %error, "skipping corrupt literature record");
            }
        }
    }
    Ok(candidates)
}

impl GraphStore for SqliteStore {
    fn lookup_alias<'a>(
        &'a self,
        ty: IdentifierType,
        normalized_value: &'a str,
    ) -> StoreFuture<'a, Option<Lid>> {
        Box::pin(async move {
            self.read_pool.with(|conn| {
                Ok(load_alias(conn, ty, normalized_value)?.map(|record| record.lid))
            })
        })
    }

    fn write_alias(&self, spec: AliasSpec) -> StoreFuture<'_, AliasWriteOutcome> {
        Box::pin(async move { self.write(|conn| merge_alias(conn, &spec)) })
    }

    fn write_aliases(&self, specs: Vec<AliasSpec>) -> StoreFuture<'_, Vec<AliasWriteResult>> {
        Box::pin(async move {
            self.write(|conn| {
                let tx = conn.unchecked_transaction().map_err(db_err)?;
                let results: Vec<AliasWriteResult> =
                    specs.iter().map(|spec| merge_alias(&tx, spec)).collect();
                tx.commit().map_err(db_err)?;
                Ok(results)
            })
        })
    }

    fn find_candidates<'a>(
        &'a self,
        record: &'a SourceRecord,
        match_type: MatchType,
    ) -> StoreFuture<'a, Vec<Candidate>> {
        Box::pin(async move {
            self.read_pool
                .with(|conn| query_candidates(conn, record, candidate_limit(match_type)))
        })
    }

    fn upsert_citation_edge<'a>(&'a self, edge: &'a CitationEdge) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.write(|conn| {
                conn.prepare_cached(
                    "INSERT INTO citation_edges
                         (from_lid, to_key, confidence, raw_text, source, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(from_lid, to_key) DO NOTHING",
                )
                .and_then(|mut stmt| {
                    stmt.execute(params![
                        edge.from.as_str(),
                        edge.to.key(),
                        edge.confidence,
                        edge.raw_text,
                        edge.source,
                        edge.created_at as i64,
                    ])
                })
                .map_err(db_err)?;
                Ok(())
            })
        })
    }

    fn upsert_unresolved<'a>(&'a self, node: &'a UnresolvedNode) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let fragments =
                serde_json::to_string(&node.fragments).unwrap_or_else(|_| "null".to_string());
            self.write(|conn| {
                conn.prepare_cached(
                    "INSERT INTO unresolved_nodes (id, raw_text, fragments, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO NOTHING",
                )
                .and_then(|mut stmt| {
                    stmt.execute(params![
                        node.id.as_str(),
                        node.raw_text,
                        fragments,
                        node.created_at as i64,
                    ])
                })
                .map_err(db_err)?;
                Ok(())
            })
        })
    }

    fn alias_counts(&self) -> StoreFuture<'_, AliasCounts> {
        Box::pin(async move {
            self.read_pool.with(|conn| {
                let mut counts = AliasCounts::default();
                let mut stmt = conn
                    .prepare_cached("SELECT ty, COUNT(*) FROM aliases GROUP BY ty")
                    .map_err(db_err)?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                    })
                    .map_err(db_err)?;
                for row in rows {
                    let (ty, count) = row.map_err(db_err)?;
                    match ty.parse::<IdentifierType>() {
                        Ok(ty) => {
                            counts.by_type.insert(ty, count as u64);
                            counts.total += count as u64;
                        }
                        Err(error) => {
                            tracing::warn!(%error, "skipping unknown alias type in counts");
                        }
                    }
                }
                Ok(counts)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::{Value, json};

    use litgraph_core::store::CitationTarget;
    use litgraph_core::{AliasIndex, CitationResolver, MatchEngine, ReferenceInput};

    fn temp_store() -> (tempfile::TempDir, Arc<SqliteStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("graph.db")).unwrap();
        (dir, Arc::new(store))
    }

    fn record(value: Value) -> SourceRecord {
        SourceRecord::from_json(&value)
    }

    fn spec(ty: IdentifierType, value: &str, lid: &str) -> AliasSpec {
        AliasSpec {
            ty,
            normalized_value: value.to_string(),
            lid: Lid::new(lid),
            confidence: 1.0,
            metadata: Value::Null,
        }
    }

    #[tokio::test]
    async fn alias_roundtrip_and_idempotence() {
        let (_dir, store) = temp_store();
        let outcome = store
            .write_alias(spec(IdentifierType::Doi, "10.1/x", "L1"))
            .await
            .unwrap();
        assert!(matches!(outcome, AliasWriteOutcome::Created(_)));

        let again = store
            .write_alias(spec(IdentifierType::Doi, "10.1/x", "L1"))
            .await
            .unwrap();
        assert!(matches!(again, AliasWriteOutcome::Existing(_)));

        let lid = store
            .lookup_alias(IdentifierType::Doi, "10.1/x")
            .await
            .unwrap();
        assert_eq!(lid, Some(Lid::new("L1")));
    }

    #[tokio::test]
    async fn conflict_keeps_first_write() {
        let (_dir, store) = temp_store();
        store
            .write_alias(spec(IdentifierType::Doi, "10.1/x", "L1"))
            .await
            .unwrap();
        let outcome = store
            .write_alias(spec(IdentifierType::Doi, "10.1/x", "L2"))
            .await
            .unwrap();
        match outcome {
            AliasWriteOutcome::Conflict { existing, rejected } => {
                assert_eq!(existing.lid, Lid::new("L1"));
                assert_eq!(rejected, Lid::new("L2"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn batch_writes_in_one_transaction() {
        let (_dir, store) = temp_store();
        let results = store
            .write_aliases(vec![
                spec(IdentifierType::Doi, "10.1/a", "L1"),
                spec(IdentifierType::Arxiv, "2101.00001", "L1"),
                spec(IdentifierType::Title, "a paper", "L1"),
            ])
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| matches!(
            r,
            Ok(AliasWriteOutcome::Created(_))
        )));

        let counts = store.alias_counts().await.unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.by_type[&IdentifierType::Doi], 1);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .write_alias(spec(IdentifierType::Doi, "10.1/x", "L1"))
                .await
                .unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let lid = store
            .lookup_alias(IdentifierType::Doi, "10.1/x")
            .await
            .unwrap();
        assert_eq!(lid, Some(Lid::new("L1")));
    }

    #[tokio::test]
    async fn candidate_prefilter_by_identifier_and_title() {
        let (_dir, store) = temp_store();
        store
            .upsert_literature(
                &Lid::new("by-doi"),
                &record(json!({ "title": "Unrelated Name", "doi": "10.1/x" })),
            )
            .unwrap();
        store
            .upsert_literature(
                &Lid::new("by-title"),
                &record(json!({ "title": "Neural Machine Translation Systems" })),
            )
            .unwrap();
        store
            .upsert_literature(
                &Lid::new("noise"),
                &record(json!({ "title": "Gardening for Beginners" })),
            )
            .unwrap();

        let probe = record(json!({
            "title": "Neural Machine Translation",
            "doi": "https://doi.org/10.1/X",
        }));
        let candidates = store
            .find_candidates(&probe, MatchType::Citation)
            .await
            .unwrap();
        let lids: Vec<&str> = candidates.iter().map(|c| c.lid.as_str()).collect();
        assert!(lids.contains(&"by-doi"));
        assert!(lids.contains(&"by-title"));
        assert!(!lids.contains(&"noise"));
    }

    #[tokio::test]
    async fn literature_upsert_enriches_without_duplicating() {
        let (_dir, store) = temp_store();
        let lid = Lid::new("L1");
        store
            .upsert_literature(&lid, &record(json!({ "title": "A Paper" })))
            .unwrap();
        store
            .upsert_literature(
                &lid,
                &record(json!({ "title": "A Paper", "doi": "10.1/x", "year": 2020 })),
            )
            .unwrap();
        assert_eq!(store.literature_count().unwrap(), 1);

        let candidates = store
            .find_candidates(&record(json!({ "doi": "10.1/x" })), MatchType::General)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].record.year, Some(2020));
    }

    #[tokio::test]
    async fn edge_and_node_upserts_are_idempotent() {
        let (_dir, store) = temp_store();
        let edge = CitationEdge {
            from: Lid::new("citer"),
            to: CitationTarget::Literature(Lid::new("cited")),
            confidence: 0.8,
            raw_text: "[1] Cited work".to_string(),
            source: "citation_resolver".to_string(),
            created_at: now_epoch(),
        };
        store.upsert_citation_edge(&edge).await.unwrap();
        store.upsert_citation_edge(&edge).await.unwrap();
        assert_eq!(store.edge_count().unwrap(), 1);

        let node = UnresolvedNode {
            id: litgraph_core::PlaceholderId("unresolved:abcd0123abcd0123".to_string()),
            raw_text: "pamphlet".to_string(),
            fragments: json!({ "title": null }),
            created_at: now_epoch(),
        };
        store.upsert_unresolved(&node).await.unwrap();
        store.upsert_unresolved(&node).await.unwrap();
        assert_eq!(store.unresolved_count().unwrap(), 1);
    }

    /// The whole engine stack runs against the persistent store exactly as
    /// it does against the in-memory one.
    #[tokio::test]
    async fn full_resolution_flow_on_sqlite() {
        let (_dir, store) = temp_store();
        let graph: Arc<dyn GraphStore> = store.clone();

        let lid = Lid::new("lit-w2v");
        let catalogued = record(json!({
            "title": "Efficient Estimation of Word Representations in Vector Space",
            "authors": ["Tomas Mikolov", "Kai Chen"],
            "year": 2013,
            "arxiv_id": "1301.3781",
        }));
        store.upsert_literature(&lid, &catalogued).unwrap();

        let aliases = AliasIndex::new(graph.clone());
        aliases
            .register_record(&catalogued, &lid, 1.0, Value::Null)
            .await;
        assert_eq!(
            aliases
                .resolve(&record(json!({ "arxiv_id": "arXiv:1301.3781" })))
                .await,
            Some(lid.clone())
        );

        let engine = MatchEngine::new(graph.clone());
        let matches = engine
            .find_matches(
                &record(json!({ "title": "Efficient Estimation of Word Representations" })),
                MatchType::Citation,
                3,
            )
            .await;
        assert_eq!(matches.first().map(|m| m.lid.clone()), Some(lid.clone()));

        let resolver = CitationResolver::new(graph);
        let refs = vec![
            ReferenceInput::from_json(&json!({
                "raw": "[1] Mikolov et al. 2013.",
                "title": "Efficient Estimation of Word Representations",
            })),
            ReferenceInput::from_json(&json!({ "raw": "Some obscure 1950 pamphlet" })),
        ];
        let report = resolver.resolve_citations(&Lid::new("citer"), &refs).await;
        assert_eq!(report.resolved_count, 1);
        assert_eq!(report.unresolved_count, 1);

        // Re-run: counts stable.
        resolver.resolve_citations(&Lid::new("citer"), &refs).await;
        assert_eq!(store.edge_count().unwrap(), 2);
        assert_eq!(store.unresolved_count().unwrap(), 1);
    }
}

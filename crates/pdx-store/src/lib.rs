//! # pdx-store
//!
//! SQLite store for the paper/entity graph.
//!
//! Three tables:
//! - `papers` keyed by the unique paper name
//! - `entities` keyed by the unique `(entity_name, entity_type)` pair
//! - `papers_have_entities` linking the two with an occurrence count
//!
//! Writes are upserts only; nothing is ever deleted.

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::debug;

use pdx_core::error::PdxError;
use pdx_core::Paper;

/// Owns the single connection to the graph database.
pub struct GraphStore {
    conn: Connection,
}

impl GraphStore {
    /// Open or create a graph database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, PdxError> {
        let conn = Connection::open(path).map_err(|e| PdxError::Store(e.to_string()))?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    /// Create an in-memory graph (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if schema creation fails.
    pub fn in_memory() -> Result<Self, PdxError> {
        let conn = Connection::open_in_memory().map_err(|e| PdxError::Store(e.to_string()))?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<(), PdxError> {
        self.conn
            .execute_batch(
                "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS papers (
                paper_id INTEGER PRIMARY KEY,
                paper_name TEXT NOT NULL UNIQUE,
                paper_pdf TEXT NOT NULL,
                paper_docx TEXT NOT NULL,
                paper_json TEXT NOT NULL,
                paper_entities TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entities (
                entity_id INTEGER PRIMARY KEY,
                entity_name TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                UNIQUE(entity_name, entity_type)
            );

            CREATE TABLE IF NOT EXISTS papers_have_entities (
                entity_id INTEGER,
                paper_id INTEGER,
                count INTEGER DEFAULT 1,
                FOREIGN KEY(entity_id) REFERENCES entities(entity_id),
                FOREIGN KEY(paper_id) REFERENCES papers(paper_id),
                PRIMARY KEY(entity_id, paper_id)
            );
            ",
            )
            .map_err(|e| PdxError::Store(e.to_string()))?;

        Ok(())
    }

    /// Insert a paper, or refresh the artifact paths of the paper with the
    /// same name. Returns the paper id, which is stable across calls.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if the upsert fails.
    pub fn upsert_paper(&self, paper: &Paper) -> Result<i64, PdxError> {
        let paths = &paper.artifacts;
        self.conn
            .query_row(
                "INSERT INTO papers(paper_name, paper_pdf, paper_docx, paper_json, paper_entities)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(paper_name) DO UPDATE SET
                    paper_pdf = excluded.paper_pdf,
                    paper_docx = excluded.paper_docx,
                    paper_json = excluded.paper_json,
                    paper_entities = excluded.paper_entities
                 RETURNING paper_id",
                params![
                    paper.name,
                    paths.source.to_string_lossy(),
                    paths.document.to_string_lossy(),
                    paths.snapshot.to_string_lossy(),
                    paths.entities.to_string_lossy(),
                ],
                |row| row.get(0),
            )
            .map_err(|e| PdxError::Store(e.to_string()))
    }

    /// Insert an entity, or return the id of the identical `(name, type)`
    /// pair.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if the upsert fails.
    pub fn upsert_entity(&self, name: &str, entity_type: &str) -> Result<i64, PdxError> {
        self.conn
            .query_row(
                "INSERT INTO entities(entity_name, entity_type)
                 VALUES (?1, ?2)
                 ON CONFLICT(entity_name, entity_type) DO UPDATE SET
                    entity_name = excluded.entity_name
                 RETURNING entity_id",
                params![name, entity_type],
                |row| row.get(0),
            )
            .map_err(|e| PdxError::Store(e.to_string()))
    }

    /// Record one co-occurrence of an entity in a paper: creates the link
    /// with count 1, or increments an existing link's count by 1.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if either id does not exist or the
    /// write fails.
    pub fn link_paper_entity(&self, paper_id: i64, entity_id: i64) -> Result<(), PdxError> {
        self.conn
            .execute(
                "INSERT INTO papers_have_entities(entity_id, paper_id)
                 VALUES (?1, ?2)
                 ON CONFLICT(entity_id, paper_id) DO UPDATE SET count = count + 1",
                params![entity_id, paper_id],
            )
            .map_err(|e| PdxError::Store(e.to_string()))?;
        Ok(())
    }

    /// Run a read-only query whose result columns are `papers.*`.
    ///
    /// Returns an empty vector when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if the SQL is invalid or execution
    /// fails.
    pub fn query_papers(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<PaperRecord>, PdxError> {
        debug!(sql, params = params.len(), "executing paper query");
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| PdxError::Store(e.to_string()))?;

        let results = stmt
            .query_map(params_from_iter(params.iter()), PaperRecord::from_row)
            .map_err(|e| PdxError::Store(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PdxError::Store(e.to_string()))?;

        Ok(results)
    }

    /// Look up a paper by its unique name.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if the query fails.
    pub fn paper_by_name(&self, name: &str) -> Result<Option<PaperRecord>, PdxError> {
        self.conn
            .query_row(
                "SELECT * FROM papers WHERE paper_name = ?1",
                params![name],
                PaperRecord::from_row,
            )
            .optional()
            .map_err(|e| PdxError::Store(e.to_string()))
    }

    /// The count stored on a link, or `None` if the pair was never linked.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if the query fails.
    pub fn link_count(&self, paper_id: i64, entity_id: i64) -> Result<Option<u32>, PdxError> {
        self.conn
            .query_row(
                "SELECT count FROM papers_have_entities WHERE paper_id = ?1 AND entity_id = ?2",
                params![paper_id, entity_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| PdxError::Store(e.to_string()))
    }

    /// Entities linked to a paper, most frequent first.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if the query fails.
    pub fn entities_for_paper(&self, paper_id: i64) -> Result<Vec<EntityMention>, PdxError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT e.entity_id, e.entity_name, e.entity_type, l.count
                 FROM papers_have_entities l
                 JOIN entities e ON e.entity_id = l.entity_id
                 WHERE l.paper_id = ?1
                 ORDER BY l.count DESC, e.entity_name",
            )
            .map_err(|e| PdxError::Store(e.to_string()))?;

        let results = stmt
            .query_map(params![paper_id], |row| {
                Ok(EntityMention {
                    entity_id: row.get(0)?,
                    name: row.get(1)?,
                    entity_type: row.get(2)?,
                    count: row.get(3)?,
                })
            })
            .map_err(|e| PdxError::Store(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PdxError::Store(e.to_string()))?;

        Ok(results)
    }

    /// Row counts across the graph.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if the query fails.
    pub fn stats(&self) -> Result<GraphStats, PdxError> {
        self.conn
            .query_row(
                "SELECT
                    (SELECT COUNT(*) FROM papers),
                    (SELECT COUNT(*) FROM entities),
                    (SELECT COUNT(*) FROM papers_have_entities),
                    (SELECT COALESCE(SUM(count), 0) FROM papers_have_entities)",
                [],
                |row| {
                    Ok(GraphStats {
                        papers: row.get(0)?,
                        entities: row.get(1)?,
                        links: row.get(2)?,
                        mentions: row.get(3)?,
                    })
                },
            )
            .map_err(|e| PdxError::Store(e.to_string()))
    }

    /// Start the transaction that wraps one ingestion batch.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if a transaction is already open.
    pub fn begin_batch(&self) -> Result<(), PdxError> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(|e| PdxError::Store(e.to_string()))
    }

    /// Commit the batch transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Store`] if no transaction is open or the commit
    /// fails.
    pub fn commit_batch(&self) -> Result<(), PdxError> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| PdxError::Store(e.to_string()))
    }

    /// Run `f` inside a savepoint: its writes are kept if it succeeds and
    /// undone if it fails, without disturbing the enclosing batch.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or [`PdxError::Store`] if the savepoint
    /// itself cannot be managed.
    pub fn savepoint<T>(
        &self,
        f: impl FnOnce(&Self) -> Result<T, PdxError>,
    ) -> Result<T, PdxError> {
        self.conn
            .execute_batch("SAVEPOINT paper")
            .map_err(|e| PdxError::Store(e.to_string()))?;

        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("RELEASE paper")
                    .map_err(|e| PdxError::Store(e.to_string()))?;
                Ok(value)
            }
            Err(err) => {
                self.conn
                    .execute_batch("ROLLBACK TO paper; RELEASE paper")
                    .map_err(|e| PdxError::Store(e.to_string()))?;
                Err(err)
            }
        }
    }
}

/// A row of the `papers` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperRecord {
    pub paper_id: i64,
    pub paper_name: String,
    pub paper_pdf: String,
    pub paper_docx: String,
    pub paper_json: String,
    pub paper_entities: String,
}

impl PaperRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            paper_id: row.get("paper_id")?,
            paper_name: row.get("paper_name")?,
            paper_pdf: row.get("paper_pdf")?,
            paper_docx: row.get("paper_docx")?,
            paper_json: row.get("paper_json")?,
            paper_entities: row.get("paper_entities")?,
        })
    }
}

/// An entity as linked to one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMention {
    pub entity_id: i64,
    pub name: String,
    pub entity_type: String,
    pub count: u32,
}

/// Row counts across the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub papers: i64,
    pub entities: i64,
    pub links: i64,
    /// Sum of all link counts.
    pub mentions: i64,
}

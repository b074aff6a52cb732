//! SQLite checkpoint store implementation

use crate::crawler::{Frontier, PendingBatch, ScoredCandidate};
use crate::graph::{GraphAccumulator, NodeId};
use crate::pool::CredentialState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::storage::{CheckpointState, RunRecord, RunStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

/// SQLite-backed checkpoint store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates a checkpoint database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn meta_value(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM checkpoint_meta WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn load_level(&self, level: &str) -> StorageResult<Vec<NodeId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT node_id FROM frontier WHERE level = ?1 ORDER BY position")?;
        let nodes = stmt
            .query_map([level], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes.into_iter().map(|id| id as NodeId).collect())
    }

    fn load_pending(&self) -> StorageResult<Option<PendingBatch>> {
        let parent: Option<i64> = self
            .conn
            .query_row("SELECT parent FROM pending_batch LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        let Some(parent) = parent else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare("SELECT node_id FROM pending_remaining ORDER BY position")?;
        let remaining = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|id| id as NodeId)
            .collect();

        let mut stmt = self
            .conn
            .prepare("SELECT node_id, popularity FROM pending_scored ORDER BY position")?;
        let scored = stmt
            .query_map([], |row| {
                Ok(ScoredCandidate {
                    id: row.get::<_, i64>(0)? as NodeId,
                    popularity: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(PendingBatch {
            parent: parent as NodeId,
            remaining,
            scored,
        }))
    }

    fn clear_checkpoint_tables(tx: &rusqlite::Transaction<'_>) -> StorageResult<()> {
        for table in [
            "checkpoint_meta",
            "credentials",
            "frontier",
            "nodes",
            "edges",
            "pending_batch",
            "pending_remaining",
            "pending_scored",
        ] {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
        }
        Ok(())
    }
}

impl CheckpointStore for SqliteStore {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status
             FROM runs ORDER BY id DESC LIMIT 1",
        )?;

        let run = stmt
            .query_row([], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(RunStatus::Running),
                })
            })
            .optional()?;

        Ok(run)
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Checkpoint =====

    fn save(&mut self, state: &CheckpointState) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        Self::clear_checkpoint_tables(&tx)?;

        for (position, credential) in state.credentials.iter().enumerate() {
            tx.execute(
                "INSERT INTO credentials (position, credential_id, cooldown_ms, blocked_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    position as i64,
                    credential.id,
                    credential.remaining_cooldown.as_millis() as i64,
                    credential.blocked_at.map(|t| t.to_rfc3339()),
                ],
            )?;
        }

        for (level, nodes) in [
            ("current", &state.frontier.current_level),
            ("next", &state.frontier.next_level),
        ] {
            for (position, node) in nodes.iter().enumerate() {
                tx.execute(
                    "INSERT INTO frontier (level, position, node_id) VALUES (?1, ?2, ?3)",
                    params![level, position as i64, *node as i64],
                )?;
            }
        }

        for node in state.graph.nodes() {
            tx.execute(
                "INSERT INTO nodes (node_id) VALUES (?1)",
                params![node as i64],
            )?;
        }
        for (a, b) in state.graph.edges() {
            tx.execute(
                "INSERT INTO edges (a, b) VALUES (?1, ?2)",
                params![a as i64, b as i64],
            )?;
        }

        if let Some(pending) = &state.pending {
            tx.execute(
                "INSERT INTO pending_batch (parent) VALUES (?1)",
                params![pending.parent as i64],
            )?;
            for (position, node) in pending.remaining.iter().enumerate() {
                tx.execute(
                    "INSERT INTO pending_remaining (position, node_id) VALUES (?1, ?2)",
                    params![position as i64, *node as i64],
                )?;
            }
            for (position, candidate) in pending.scored.iter().enumerate() {
                tx.execute(
                    "INSERT INTO pending_scored (position, node_id, popularity)
                     VALUES (?1, ?2, ?3)",
                    params![
                        position as i64,
                        candidate.id as i64,
                        candidate.popularity as i64
                    ],
                )?;
            }
        }

        tx.execute(
            "INSERT INTO checkpoint_meta (key, value) VALUES ('search_index', ?1)",
            params![state.frontier.search_index.to_string()],
        )?;
        tx.execute(
            "INSERT INTO checkpoint_meta (key, value) VALUES ('present', '1')",
            [],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn load(&self) -> StorageResult<CheckpointState> {
        if !self.has_checkpoint()? {
            return Err(StorageError::NoCheckpoint);
        }

        let search_index = self
            .meta_value("search_index")?
            .ok_or_else(|| StorageError::Corrupt("missing search_index".to_string()))?
            .parse::<i64>()
            .map_err(|e| StorageError::Corrupt(format!("bad search_index: {}", e)))?;

        let mut stmt = self.conn.prepare(
            "SELECT credential_id, cooldown_ms, blocked_at FROM credentials ORDER BY position",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut credentials = Vec::with_capacity(rows.len());
        for (id, cooldown_ms, blocked_at) in rows {
            let blocked_at = match blocked_at {
                Some(text) => Some(
                    DateTime::parse_from_rfc3339(&text)
                        .map_err(|e| {
                            StorageError::Corrupt(format!("bad blocked_at timestamp: {}", e))
                        })?
                        .with_timezone(&Utc),
                ),
                None => None,
            };
            credentials.push(CredentialState {
                id,
                remaining_cooldown: Duration::from_millis(cooldown_ms.max(0) as u64),
                blocked_at,
            });
        }

        let frontier = Frontier {
            current_level: self.load_level("current")?,
            search_index,
            next_level: self.load_level("next")?,
        };

        let mut graph = GraphAccumulator::new();
        let mut stmt = self.conn.prepare("SELECT node_id FROM nodes")?;
        let nodes = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        for node in nodes {
            graph.add_node(node as NodeId);
        }
        let mut stmt = self.conn.prepare("SELECT a, b FROM edges")?;
        let edges = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        for (a, b) in edges {
            graph.add_edge(a as NodeId, b as NodeId);
        }

        let pending = self.load_pending()?;

        Ok(CheckpointState {
            credentials,
            frontier,
            graph,
            pending,
        })
    }

    fn has_checkpoint(&self) -> StorageResult<bool> {
        Ok(self.meta_value("present")?.as_deref() == Some("1"))
    }

    fn delete(&mut self) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        Self::clear_checkpoint_tables(&tx)?;
        tx.commit()?;
        Ok(())
    }
}

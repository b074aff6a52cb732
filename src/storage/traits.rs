//! Storage traits and error types

use crate::storage::{CheckpointState, RunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No checkpoint found")]
    NoCheckpoint,

    #[error("Checkpoint is corrupt: {0}")]
    Corrupt(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint storage backends
///
/// A store holds at most one checkpoint at a time; `save` overwrites any
/// prior state in a single transaction.
pub trait CheckpointStore {
    // ===== Run Management =====

    /// Creates a new crawl run identified by the configuration hash
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Checkpoint =====

    /// Persists the full crawl state, replacing any existing checkpoint
    fn save(&mut self, state: &CheckpointState) -> StorageResult<()>;

    /// Loads the stored crawl state
    ///
    /// Fails with [`StorageError::NoCheckpoint`] when none has been saved.
    fn load(&self) -> StorageResult<CheckpointState>;

    /// Whether a checkpoint is currently stored
    fn has_checkpoint(&self) -> StorageResult<bool>;

    /// Removes the checkpoint; a no-op when none exists
    fn delete(&mut self) -> StorageResult<()>;
}

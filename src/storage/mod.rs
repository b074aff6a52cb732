//! Checkpoint persistence
//!
//! The checkpoint store serializes the full crawl state (credential
//! cooldowns, frontier, accumulator, pending batch) so an interrupted run can
//! resume exactly where it stopped. Runs are tracked in a `runs` table keyed
//! by the configuration hash.

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStore;
pub use traits::{CheckpointStore, StorageError, StorageResult};

use crate::crawler::{Frontier, PendingBatch};
use crate::graph::GraphAccumulator;
use crate::pool::CredentialState;

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
}

impl RunStatus {
    pub fn to_db_string(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            _ => None,
        }
    }
}

/// One row of the runs table
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Point-in-time serialization of the crawl state
///
/// Credential entries carry identity and cooldown only; live keys are
/// re-loaded from configuration on resume.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointState {
    pub credentials: Vec<CredentialState>,
    pub frontier: Frontier,
    pub graph: GraphAccumulator,
    pub pending: Option<PendingBatch>,
}

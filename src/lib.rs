//! Ripplegraph: a credential-rotating social graph crawler
//!
//! This crate implements the core of a breadth-first crawler over a remote,
//! rate-limited social graph. It rotates through a pool of access credentials,
//! prunes per-node fan-out by popularity, and checkpoints the full crawl state
//! so an interrupted run resumes exactly where it stopped.
//!
//! The remote graph itself is consumed through the [`source::DataSource`]
//! capability; this crate does not implement its transport.

pub mod config;
pub mod crawler;
pub mod graph;
pub mod output;
pub mod pool;
pub mod source;
pub mod storage;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Per-node failures and rate limits are handled inside the crawl loop and
/// never surface here; only configuration, pool, and persistence failures
/// abort a run.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No credentials loaded in the pool")]
    EmptyPool,

    #[error("Starting node '{0}' could not be resolved")]
    StartingNodeNotFound(String),

    #[error("Checkpoint error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlState, Frontier, PendingBatch};
pub use graph::{GraphAccumulator, NodeId};
pub use pool::{Credential, CredentialPool};

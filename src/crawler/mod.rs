//! Crawler module for graph traversal
//!
//! This module contains the core traversal logic, including:
//! - Breadth-first frontier bookkeeping
//! - Leaf selection with bounded fan-out
//! - The coordinator state machine tying pool, frontier, and accumulator
//!   together

mod coordinator;
mod frontier;
mod leaf;
mod state;

pub use coordinator::Coordinator;
pub use frontier::Frontier;
pub use leaf::{LeafSelector, ScoredCandidate, MAX_LEAF_CEILING};
pub use state::{CrawlState, PendingBatch};

use crate::config::Config;
use crate::source::DataSource;
use crate::CrawlError;

/// Runs a complete crawl operation
///
/// Builds a coordinator over the given data source and drives it to
/// completion, resuming an interrupted run unless `fresh` is set.
pub async fn crawl<S: DataSource>(
    config: Config,
    source: S,
    config_hash: &str,
    fresh: bool,
) -> Result<(), CrawlError> {
    let mut coordinator = Coordinator::new(config, source, config_hash, fresh)?;
    coordinator.run().await
}

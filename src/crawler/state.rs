//! Explicit crawl state
//!
//! All mutable traversal state lives in one struct owned by the coordinator:
//! the credential pool, the frontier, the accumulator, and the optional
//! in-flight lookup batch. Nothing is module-global, and resumption is
//! decided by the presence of the `pending` field, not by probing.

use crate::crawler::frontier::Frontier;
use crate::crawler::leaf::ScoredCandidate;
use crate::graph::{GraphAccumulator, NodeId};
use crate::pool::CredentialPool;
use serde::{Deserialize, Serialize};

/// A neighbor lookup interrupted mid-flight by a rate limit
///
/// Captures the parent being expanded, the candidate ids not yet looked up,
/// and the partial scored results so far. On resume, only `remaining` is
/// looked up and the results are merged into `scored` before truncation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBatch {
    pub parent: NodeId,
    pub remaining: Vec<NodeId>,
    pub scored: Vec<ScoredCandidate>,
}

/// Full mutable state of one crawl run
#[derive(Debug)]
pub struct CrawlState {
    pub pool: CredentialPool,
    pub frontier: Frontier,
    pub graph: GraphAccumulator,
    pub pending: Option<PendingBatch>,
}

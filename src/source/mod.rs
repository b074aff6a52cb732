//! Data source capability
//!
//! The remote social graph is consumed through the [`DataSource`] trait; its
//! transport (HTTP, auth handshakes) lives outside this crate. Every call is
//! made with the keys of the currently active credential, so the pool decides
//! which identity the source sees.

mod replay;

pub use replay::ReplaySource;

// Re-exported so external DataSource implementations (including test
// doubles) use the same macro version.
pub use async_trait::async_trait;

use crate::graph::NodeId;
use crate::pool::CredentialKeys;
use thiserror::Error;

/// Maximum number of ids accepted by a single `lookup_batch` call
pub const LOOKUP_BATCH_SIZE: usize = 100;

/// Errors surfaced by the data source
///
/// `RateLimited` is expected and high-frequency: the controller blocks the
/// active credential and rotates. `NotFound` and `Transient` are per-node
/// conditions handled by skipping.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("node not found")]
    NotFound,

    #[error("transient source error: {0}")]
    Transient(String),
}

/// Summary returned by batched lookups
///
/// Popularity is a cheap proxy (follower plus friend count) used only to rank
/// leaf candidates. The declared language feeds the optional language filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: NodeId,
    pub popularity: u64,
    pub language: Option<String>,
}

/// Abstract capability over the remote graph
#[async_trait]
pub trait DataSource {
    /// Returns the neighbor ids (followers plus friends) of `node`
    async fn neighbor_ids(
        &self,
        keys: &CredentialKeys,
        node: NodeId,
    ) -> Result<Vec<NodeId>, SourceError>;

    /// Looks up summaries for up to [`LOOKUP_BATCH_SIZE`] ids
    ///
    /// Ids unknown to the remote are silently omitted from the result.
    async fn lookup_batch(
        &self,
        keys: &CredentialKeys,
        ids: &[NodeId],
    ) -> Result<Vec<UserSummary>, SourceError>;

    /// Resolves a username to its node id
    async fn resolve_username(
        &self,
        keys: &CredentialKeys,
        name: &str,
    ) -> Result<NodeId, SourceError>;
}

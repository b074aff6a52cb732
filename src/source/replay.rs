//! File-backed replay source
//!
//! Replays a recorded slice of the remote graph from a TOML fixture. This is
//! what the binary crawls when no live transport is wired in: offline runs,
//! demos, and larger end-to-end tests all use it.
//!
//! Fixture shape:
//!
//! ```toml
//! [[users]]
//! id = 1
//! username = "alice"
//! popularity = 42
//! language = "en"
//! neighbors = [2, 3]
//! ```

use crate::graph::NodeId;
use crate::pool::CredentialKeys;
use crate::source::{DataSource, SourceError, UserSummary};
use crate::ConfigError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    users: Vec<FixtureUser>,
}

#[derive(Debug, Deserialize)]
struct FixtureUser {
    id: NodeId,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    popularity: u64,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    neighbors: Vec<NodeId>,
}

/// Data source replaying a recorded graph fixture
#[derive(Debug)]
pub struct ReplaySource {
    users: HashMap<NodeId, FixtureUser>,
    by_name: HashMap<String, NodeId>,
}

impl ReplaySource {
    /// Loads a fixture from `path`
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let fixture: Fixture = toml::from_str(&content)?;

        let mut by_name = HashMap::new();
        let mut users = HashMap::new();
        for user in fixture.users {
            if let Some(name) = &user.username {
                by_name.insert(name.clone(), user.id);
            }
            users.insert(user.id, user);
        }

        Ok(Self { users, by_name })
    }

    /// Number of users in the fixture
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl DataSource for ReplaySource {
    async fn neighbor_ids(
        &self,
        _keys: &CredentialKeys,
        node: NodeId,
    ) -> Result<Vec<NodeId>, SourceError> {
        self.users
            .get(&node)
            .map(|user| user.neighbors.clone())
            .ok_or(SourceError::NotFound)
    }

    async fn lookup_batch(
        &self,
        _keys: &CredentialKeys,
        ids: &[NodeId],
    ) -> Result<Vec<UserSummary>, SourceError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id))
            .map(|user| UserSummary {
                id: user.id,
                popularity: user.popularity,
                language: user.language.clone(),
            })
            .collect())
    }

    async fn resolve_username(
        &self,
        _keys: &CredentialKeys,
        name: &str,
    ) -> Result<NodeId, SourceError> {
        self.by_name.get(name).copied().ok_or(SourceError::NotFound)
    }
}

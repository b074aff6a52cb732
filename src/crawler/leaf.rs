//! Leaf selection: bounded fan-out for the next frontier level
//!
//! Raw neighbor candidates of one parent are ranked by popularity and
//! truncated to the configured cap before they may enter the next level.
//! Without the cap a single celebrity node would flood the frontier.

use crate::config::CrawlerConfig;
use crate::graph::NodeId;
use crate::source::UserSummary;
use serde::{Deserialize, Serialize};

/// Hard upper bound on the configurable fan-out cap
pub const MAX_LEAF_CEILING: u32 = 5000;

/// A looked-up candidate with its popularity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: NodeId,
    pub popularity: u64,
}

/// Ranks and truncates neighbor candidates for one parent node
#[derive(Debug, Clone)]
pub struct LeafSelector {
    max_leaves: u32,
    language_filter: Option<String>,
    accept_unspecified_language: bool,
}

impl LeafSelector {
    /// Builds a selector from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_leaves: config.max_leaves,
            language_filter: config.language_filter.clone(),
            accept_unspecified_language: config.accept_unspecified_language,
        }
    }

    /// Whether a looked-up candidate passes the language filter
    ///
    /// With no filter configured everything passes. With a filter, a matching
    /// declared language passes, and an undeclared language passes only when
    /// `accept-unspecified-language` is set.
    pub fn accepts(&self, candidate: &UserSummary) -> bool {
        let Some(filter) = &self.language_filter else {
            return true;
        };
        match candidate.language.as_deref() {
            Some(declared) if !declared.is_empty() => filter.eq_ignore_ascii_case(declared),
            _ => self.accept_unspecified_language,
        }
    }

    /// Selects at most `max-leaves` candidates, most popular first
    ///
    /// The sort is stable: ties keep their batch order, so selection is
    /// deterministic for a given candidate sequence.
    pub fn select(&self, mut candidates: Vec<ScoredCandidate>) -> Vec<NodeId> {
        candidates.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        candidates.truncate(self.max_leaves as usize);
        candidates.into_iter().map(|c| c.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(max_leaves: u32) -> LeafSelector {
        LeafSelector {
            max_leaves,
            language_filter: None,
            accept_unspecified_language: true,
        }
    }

    fn candidate(id: NodeId, popularity: u64) -> ScoredCandidate {
        ScoredCandidate { id, popularity }
    }

    fn summary(id: NodeId, language: Option<&str>) -> UserSummary {
        UserSummary {
            id,
            popularity: 0,
            language: language.map(str::to_string),
        }
    }

    #[test]
    fn test_select_orders_by_descending_popularity() {
        let selected = selector(10).select(vec![
            candidate(1, 5),
            candidate(2, 3),
            candidate(3, 8),
        ]);
        assert_eq!(selected, vec![3, 1, 2]);
    }

    #[test]
    fn test_select_truncates_to_cap() {
        let selected = selector(2).select(vec![
            candidate(1, 5),
            candidate(2, 3),
            candidate(3, 8),
        ]);
        assert_eq!(selected, vec![3, 1]);
    }

    #[test]
    fn test_ties_keep_batch_order() {
        let selected = selector(10).select(vec![
            candidate(1, 7),
            candidate(2, 7),
            candidate(3, 9),
            candidate(4, 7),
        ]);
        assert_eq!(selected, vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_select_empty_candidates() {
        let selected = selector(5).select(Vec::new());
        assert!(selected.is_empty());
    }

    #[test]
    fn test_no_filter_accepts_everything() {
        let selector = selector(5);
        assert!(selector.accepts(&summary(1, Some("en"))));
        assert!(selector.accepts(&summary(2, None)));
    }

    #[test]
    fn test_filter_matches_case_insensitively() {
        let selector = LeafSelector {
            max_leaves: 5,
            language_filter: Some("en".to_string()),
            accept_unspecified_language: false,
        };

        assert!(selector.accepts(&summary(1, Some("en"))));
        assert!(selector.accepts(&summary(1, Some("EN"))));
        assert!(!selector.accepts(&summary(2, Some("ko"))));
        assert!(!selector.accepts(&summary(3, None)));
    }

    #[test]
    fn test_unspecified_language_fallback() {
        let selector = LeafSelector {
            max_leaves: 5,
            language_filter: Some("en".to_string()),
            accept_unspecified_language: true,
        };

        assert!(selector.accepts(&summary(1, None)));
        assert!(selector.accepts(&summary(2, Some(""))));
        assert!(!selector.accepts(&summary(3, Some("ko"))));
    }
}

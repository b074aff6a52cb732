//! Statistics reporting from the checkpoint store

use crate::storage::{CheckpointStore, RunRecord, StorageError};
use crate::CrawlError;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStats {
    /// The most recent run, if any
    pub run: Option<RunRecord>,

    /// Nodes in the accumulator
    pub node_count: usize,

    /// Edges in the accumulator
    pub edge_count: usize,

    /// Nodes awaiting expansion in the current level
    pub current_level: usize,

    /// Nodes queued for the next level
    pub next_level: usize,

    /// Position within the current level (-1 before a level starts)
    pub search_index: i64,

    /// Credential ids with their remaining cooldowns, rotation-ordered
    pub credentials: Vec<(String, Duration)>,

    /// The interrupted lookup, if one was checkpointed:
    /// (parent, ids left to look up, candidates scored so far)
    pub pending: Option<(u64, usize, usize)>,
}

/// Loads statistics from a checkpoint store
///
/// With no checkpoint on disk, the counts are zero and only run metadata is
/// reported.
pub fn load_stats(store: &dyn CheckpointStore) -> Result<CrawlStats, CrawlError> {
    let run = store.latest_run()?;

    let checkpoint = match store.load() {
        Ok(state) => Some(state),
        Err(StorageError::NoCheckpoint) => None,
        Err(e) => return Err(e.into()),
    };

    let stats = match checkpoint {
        Some(state) => CrawlStats {
            run,
            node_count: state.graph.node_count(),
            edge_count: state.graph.edge_count(),
            current_level: state.frontier.current_level.len(),
            next_level: state.frontier.next_level.len(),
            search_index: state.frontier.search_index,
            credentials: state
                .credentials
                .iter()
                .map(|c| (c.id.clone(), c.remaining_cooldown))
                .collect(),
            pending: state
                .pending
                .as_ref()
                .map(|p| (p.parent, p.remaining.len(), p.scored.len())),
        },
        None => CrawlStats {
            run,
            node_count: 0,
            edge_count: 0,
            current_level: 0,
            next_level: 0,
            search_index: -1,
            credentials: Vec::new(),
            pending: None,
        },
    };

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_stats(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    match &stats.run {
        Some(run) => {
            println!("Run {} ({:?})", run.id, run.status);
            println!("  Started:  {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
        }
        None => println!("No runs recorded"),
    }
    println!();

    println!("Graph:");
    println!("  Nodes: {}", stats.node_count);
    println!("  Edges: {}", stats.edge_count);
    println!();

    println!("Frontier:");
    println!(
        "  Current level: {} (position {})",
        stats.current_level, stats.search_index
    );
    println!("  Next level:    {}", stats.next_level);

    if let Some((parent, remaining, scored)) = stats.pending {
        println!(
            "  Interrupted lookup: node {} ({} ids left, {} scored)",
            parent, remaining, scored
        );
    }
    println!();

    if !stats.credentials.is_empty() {
        println!("Credentials:");
        for (id, cooldown) in &stats.credentials {
            if cooldown.is_zero() {
                println!("  {} - ready", id);
            } else {
                println!("  {} - blocked for {:.0}s", id, cooldown.as_secs_f64());
            }
        }
    }
}

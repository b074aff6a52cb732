//! Crawl coordinator - main traversal orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the traversal, including:
//! - Resuming from a checkpoint or starting fresh
//! - Walking the frontier level by level
//! - Rotating credentials on rate limits and waiting out lockouts
//! - Pruning fan-out through the leaf selector
//! - Persisting state and exporting the final edge list

use crate::config::Config;
use crate::crawler::frontier::Frontier;
use crate::crawler::leaf::{LeafSelector, ScoredCandidate};
use crate::crawler::state::{CrawlState, PendingBatch};
use crate::graph::{GraphAccumulator, NodeId};
use crate::output::write_edge_list;
use crate::pool::{CredentialPool, RATE_LIMIT_LOCKOUT};
use crate::source::{DataSource, SourceError, LOOKUP_BATCH_SIZE};
use crate::storage::{CheckpointState, CheckpointStore, RunStatus, SqliteStore};
use crate::CrawlError;
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Safety margin added on top of the reported cooldown before retrying
const COOLDOWN_MARGIN: Duration = Duration::from_secs(1);

/// Expansions between periodic checkpoints
const CHECKPOINT_INTERVAL: u64 = 25;

/// Main crawl coordinator
///
/// Owns the full [`CrawlState`]; no other component mutates the pool,
/// frontier, or accumulator.
pub struct Coordinator<S: DataSource> {
    config: Config,
    source: S,
    store: SqliteStore,
    selector: LeafSelector,
    state: CrawlState,
    run_id: i64,
}

impl<S: DataSource> Coordinator<S> {
    /// Creates a coordinator, resuming an interrupted run unless `fresh`
    ///
    /// With `fresh` set, any existing checkpoint is removed and a new run is
    /// created. Otherwise, a `running` run with a stored checkpoint is
    /// resumed: cooldown state is merged onto the freshly loaded credentials
    /// and the frontier, accumulator, and pending batch are restored
    /// verbatim.
    pub fn new(
        config: Config,
        source: S,
        config_hash: &str,
        fresh: bool,
    ) -> Result<Self, CrawlError> {
        let mut store = SqliteStore::new(Path::new(&config.output.database_path))?;
        let mut pool = CredentialPool::from_config(&config.credentials)?;

        let (run_id, frontier, graph, pending) = if fresh {
            store.delete()?;
            tracing::info!("Starting fresh crawl");
            (
                store.create_run(config_hash)?,
                Frontier::default(),
                GraphAccumulator::new(),
                None,
            )
        } else {
            let resumable = match store.latest_run()? {
                Some(run) if run.status == RunStatus::Running && store.has_checkpoint()? => {
                    Some(run.id)
                }
                _ => None,
            };

            if let Some(run_id) = resumable {
                let checkpoint = store.load()?;
                pool.restore(&checkpoint.credentials);
                tracing::info!("Resuming interrupted run {}", run_id);
                (
                    run_id,
                    checkpoint.frontier,
                    checkpoint.graph,
                    checkpoint.pending,
                )
            } else {
                tracing::info!("No interrupted run found, starting new run");
                (
                    store.create_run(config_hash)?,
                    Frontier::default(),
                    GraphAccumulator::new(),
                    None,
                )
            }
        };

        let selector = LeafSelector::from_config(&config.crawler);

        Ok(Self {
            config,
            source,
            store,
            selector,
            state: CrawlState {
                pool,
                frontier,
                graph,
                pending,
            },
            run_id,
        })
    }

    /// The accumulated graph
    pub fn graph(&self) -> &GraphAccumulator {
        &self.state.graph
    }

    /// The current frontier
    pub fn frontier(&self) -> &Frontier {
        &self.state.frontier
    }

    /// The id of the run this coordinator progresses
    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// The data source this coordinator crawls
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs the traversal to completion
    ///
    /// Levels are expanded in stored order. The loop ends when the
    /// accumulator reaches the target size or the frontier is exhausted; the
    /// edge list is then exported and the checkpoint removed unless retention
    /// was requested.
    pub async fn run(&mut self) -> Result<(), CrawlError> {
        let max_nodes = self.config.crawler.max_nodes as usize;

        if self.state.frontier.is_exhausted() && self.state.graph.node_count() == 0 {
            let start = self.resolve_starting_node().await?;
            self.state.frontier = Frontier::seeded(start);
        }

        // Worst-case estimate assuming every call window must be waited out,
        // the operator aid carried over from long rate-limited runs.
        let estimated_hours = max_nodes as f64 / (15.0 * self.state.pool.len() as f64)
            * RATE_LIMIT_LOCKOUT.as_secs_f64()
            / 3600.0;
        tracing::info!(
            "Crawl run {}: target {} nodes, {} credentials, worst case ~{:.2}h",
            self.run_id,
            max_nodes,
            self.state.pool.len(),
            estimated_hours
        );

        let pause = Duration::from_millis(self.config.crawler.request_pause_ms);
        let started = std::time::Instant::now();
        let mut expanded: u64 = 0;

        while self.state.graph.node_count() < max_nodes {
            if self.state.frontier.is_exhausted() {
                tracing::info!("Frontier exhausted before reaching target size");
                break;
            }
            self.state.frontier.begin_level();

            while let Some(parent) = self.state.frontier.current_node() {
                if self.state.graph.node_count() >= max_nodes {
                    break;
                }

                tracing::debug!("Expanding node {}", parent);
                self.expand_node(parent).await?;
                self.state.frontier.advance();
                expanded += 1;

                if expanded % 10 == 0 {
                    let rate = expanded as f64 / started.elapsed().as_secs_f64();
                    tracing::info!(
                        "Progress: {} nodes expanded, graph size {}, {:.2} nodes/sec",
                        expanded,
                        self.state.graph.node_count(),
                        rate
                    );
                }
                if expanded % CHECKPOINT_INTERVAL == 0 {
                    self.checkpoint()?;
                }
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }

            self.state.frontier.promote();
        }

        tracing::info!(
            "Crawl complete: {} nodes, {} edges in {:?}",
            self.state.graph.node_count(),
            self.state.graph.edge_count(),
            started.elapsed()
        );

        write_edge_list(&self.state.graph, Path::new(&self.config.output.edges_path))?;
        self.store.complete_run(self.run_id)?;

        if self.config.output.retain_checkpoint {
            self.checkpoint()?;
        } else {
            self.store.delete()?;
        }

        Ok(())
    }

    /// Expands a single frontier node
    ///
    /// Fetches neighbor ids, scores them in batches, and adds the selected
    /// leaves to the accumulator and next level. Rate limits rotate the pool
    /// and retry without losing position; other per-node failures skip the
    /// node.
    async fn expand_node(&mut self, parent: NodeId) -> Result<(), CrawlError> {
        let (mut remaining, mut scored) = match self.state.pending.take() {
            Some(batch) if batch.parent == parent => {
                tracing::info!(
                    "Resuming interrupted lookup for node {} ({} ids left)",
                    parent,
                    batch.remaining.len()
                );
                (batch.remaining, batch.scored)
            }
            stale => {
                if let Some(batch) = stale {
                    tracing::warn!("Discarding stale pending batch for node {}", batch.parent);
                }
                let Some(ids) = self.fetch_neighbor_ids(parent).await? else {
                    return Ok(());
                };
                (ids, Vec::new())
            }
        };

        while !remaining.is_empty() {
            let take = remaining.len().min(LOOKUP_BATCH_SIZE);
            let keys = self.state.pool.active()?.keys().clone();

            match self.source.lookup_batch(&keys, &remaining[..take]).await {
                Ok(users) => {
                    remaining.drain(..take);
                    for user in users {
                        // Nodes already in the accumulator never re-enter a
                        // frontier level.
                        if self.state.graph.has_node(user.id) {
                            continue;
                        }
                        if !self.selector.accepts(&user) {
                            continue;
                        }
                        scored.push(ScoredCandidate {
                            id: user.id,
                            popularity: user.popularity,
                        });
                    }
                }
                Err(SourceError::RateLimited) => {
                    self.state.pending = Some(PendingBatch {
                        parent,
                        remaining: remaining.clone(),
                        scored: scored.clone(),
                    });
                    self.handle_rate_limit().await?;
                    self.state.pending = None;
                }
                Err(err) => {
                    tracing::warn!(
                        "Lookup failed for node {}: {}; selecting from {} scored candidates",
                        parent,
                        err,
                        scored.len()
                    );
                    break;
                }
            }
        }

        let selected = self.selector.select(scored);
        let max_nodes = self.config.crawler.max_nodes as usize;

        for id in selected {
            let mut added_nodes = 0;
            if !self.state.graph.has_node(parent) {
                added_nodes += 1;
            }
            if !self.state.graph.has_node(id) {
                added_nodes += 1;
            }
            if self.state.graph.node_count() + added_nodes > max_nodes {
                break;
            }

            let newly_discovered = !self.state.graph.has_node(id);
            self.state.graph.add_edge(parent, id);
            if newly_discovered {
                self.state.frontier.push_next(id);
            }
        }

        tracing::debug!(
            "Node {} expanded, graph size now {}",
            parent,
            self.state.graph.node_count()
        );
        Ok(())
    }

    /// Fetches and deduplicates the neighbor ids of `parent`
    ///
    /// Returns `None` when the node is skipped because of a per-node failure.
    async fn fetch_neighbor_ids(
        &mut self,
        parent: NodeId,
    ) -> Result<Option<Vec<NodeId>>, CrawlError> {
        loop {
            let keys = self.state.pool.active()?.keys().clone();
            match self.source.neighbor_ids(&keys, parent).await {
                Ok(ids) => {
                    let mut seen = HashSet::with_capacity(ids.len());
                    let deduped: Vec<NodeId> =
                        ids.into_iter().filter(|id| seen.insert(*id)).collect();
                    return Ok(Some(deduped));
                }
                Err(SourceError::RateLimited) => self.handle_rate_limit().await?,
                Err(err) => {
                    tracing::warn!("Skipping node {}: {}", parent, err);
                    return Ok(None);
                }
            }
        }
    }

    /// Blocks the active credential, rotates, and waits out a full lockout
    ///
    /// The checkpoint is written before any sleep: the all-blocked wait is
    /// the window where an external kill is expected.
    async fn handle_rate_limit(&mut self) -> Result<(), CrawlError> {
        let now = Utc::now();
        let blocked_id = self.state.pool.active()?.id().to_string();
        self.state.pool.block_active(now)?;
        let wait = self.state.pool.recycle(now)?;
        tracing::info!("Credential '{}' rate limited, rotating pool", blocked_id);

        self.checkpoint()?;

        if !wait.is_zero() {
            let sleep_for = wait + COOLDOWN_MARGIN;
            tracing::info!(
                "All credentials are blocked, sleeping for {:.0}s",
                sleep_for.as_secs_f64()
            );
            tokio::time::sleep(sleep_for).await;
        }
        Ok(())
    }

    /// Persists the full crawl state
    fn checkpoint(&mut self) -> Result<(), CrawlError> {
        let snapshot = CheckpointState {
            credentials: self.state.pool.snapshot(),
            frontier: self.state.frontier.clone(),
            graph: self.state.graph.clone(),
            pending: self.state.pending.clone(),
        };
        self.store.save(&snapshot)?;
        tracing::debug!(
            "Checkpoint saved ({} nodes, {} edges)",
            self.state.graph.node_count(),
            self.state.graph.edge_count()
        );
        Ok(())
    }

    /// Resolves the configured starting node to an id
    ///
    /// Numeric values are used directly; anything else is resolved as a
    /// username through the data source, with the usual rate-limit rotation.
    async fn resolve_starting_node(&mut self) -> Result<NodeId, CrawlError> {
        let start = self.config.crawler.starting_node.clone();
        if let Ok(id) = start.parse::<NodeId>() {
            return Ok(id);
        }

        loop {
            let keys = self.state.pool.active()?.keys().clone();
            match self.source.resolve_username(&keys, &start).await {
                Ok(id) => {
                    tracing::info!("Resolved starting user '{}' to node {}", start, id);
                    return Ok(id);
                }
                Err(SourceError::RateLimited) => self.handle_rate_limit().await?,
                Err(_) => return Err(CrawlError::StartingNodeNotFound(start)),
            }
        }
    }
}

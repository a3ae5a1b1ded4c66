//! Search orchestration: the produce and consume loops around each plugin.
//!
//! ```text
//! SearchOrchestrator
//!     │
//!     ├─► produce loop (per plugin)
//!     │       FrontierStore::get_oldest → WorkQueue::publish → FrontierStore::delete_task
//!     │
//!     └─► consume loop (per plugin)
//!             WorkQueue delivery → CrawlerPlugin::expand
//!                 ├─► EdgeLedger::bulk_record_edges
//!                 ├─► FrontierStore::create_task (one per new connection)
//!                 └─► on the closing edge: purge frontier, mark status found
//! ```
//!
//! Delivery is at-least-once. Every effect of processing a task is idempotent,
//! so a task published twice costs an extra plugin call and nothing else.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::OrchestratorConfig;
use crate::error::{Result, SeekerError};
use crate::hash::generate_id;
use crate::queue::WorkQueue;
use crate::skip::{MemorySkipCache, SkipCache};
use crate::traits::{CrawlerPlugin, EdgeLedger, ExpandRequest, FrontierStore, SeekerStore};
use crate::types::path::{join_trace, NewEdge, PathRecord, PathStatus};
use crate::types::task::{FrontierTask, NewTask};

/// What happened to one delivered task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The origin had already concluded; the plugin was not called
    Skipped,

    /// The plugin failed; the task was dropped
    FetchFailed,

    /// Connections were queued as frontier tasks (`next_tasks`, existing rows included)
    Expanded { next_tasks: usize, new_edges: u64 },

    /// A connection reached the destination and the search was finalized
    Reached,
}

#[derive(Clone)]
struct PluginWorker {
    plugin: Arc<dyn CrawlerPlugin>,
    queue: Arc<WorkQueue>,
}

/// Drives every registered plugin's searches to termination.
pub struct SearchOrchestrator {
    frontier: Arc<dyn FrontierStore>,
    ledger: Arc<dyn EdgeLedger>,
    workers: Vec<PluginWorker>,
    skip_cache: Arc<dyn SkipCache>,
    config: OrchestratorConfig,
}

impl SearchOrchestrator {
    /// Create an orchestrator with one work queue per plugin.
    ///
    /// Fails with `NoPlugins` when `plugins` is empty.
    pub fn new(
        frontier: Arc<dyn FrontierStore>,
        ledger: Arc<dyn EdgeLedger>,
        plugins: Vec<Arc<dyn CrawlerPlugin>>,
    ) -> Result<Self> {
        if plugins.is_empty() {
            return Err(SeekerError::NoPlugins);
        }

        let workers = plugins
            .into_iter()
            .map(|plugin| {
                let queue_config = plugin.queue_config();
                debug!(
                    plugin = plugin.name(),
                    delay_ms = queue_config.delay.as_millis() as u64,
                    queue_size = queue_config.queue_size,
                    "Registering crawler plugin"
                );
                PluginWorker {
                    queue: Arc::new(WorkQueue::new(queue_config)),
                    plugin,
                }
            })
            .collect();

        Ok(Self {
            frontier,
            ledger,
            workers,
            skip_cache: Arc::new(MemorySkipCache::new()),
            config: OrchestratorConfig::default(),
        })
    }

    /// Create an orchestrator over a single backend that stores both the
    /// frontier and the ledger.
    pub fn from_store<S>(store: Arc<S>, plugins: Vec<Arc<dyn CrawlerPlugin>>) -> Result<Self>
    where
        S: SeekerStore + 'static,
    {
        let frontier: Arc<dyn FrontierStore> = store.clone();
        let ledger: Arc<dyn EdgeLedger> = store;
        Self::new(frontier, ledger, plugins)
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_skip_cache(mut self, skip_cache: Arc<dyn SkipCache>) -> Self {
        self.skip_cache = skip_cache;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Names of the registered plugins, in registration order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.plugin.name()).collect()
    }

    /// Start a search, or subscribe to the one already running for the pair.
    ///
    /// Returns the origin id. A concluded search is returned as is.
    pub async fn submit_search(&self, source_node: &str, dest_node: &str) -> Result<String> {
        let origin_id = generate_id(source_node, dest_node);

        match self.ledger.get_status_by_origin(&origin_id).await {
            Ok(status) if status.status.is_concluded() => {
                debug!(origin_id = %origin_id, status = %status.status, "Search already concluded");
                return Ok(origin_id);
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        // Status first, so a worker never sees a frontier row without one
        self.ledger
            .create_status_record(&origin_id, source_node, dest_node)
            .await?;
        let subscription = self.frontier.subscribe_root(source_node, dest_node).await?;

        if subscription.is_fresh() {
            self.skip_cache.clear(&origin_id);
        }

        info!(
            origin_id = %origin_id,
            source = source_node,
            dest = dest_node,
            requests_count = subscription.requests_count,
            fresh = subscription.is_fresh(),
            "Search submitted"
        );
        Ok(origin_id)
    }

    /// Drop one client subscription. Returns the remaining count.
    ///
    /// At zero the origin's pending frontier is purged. The ledger is left
    /// untouched. `NotFound` when the search has no subscription left.
    pub async fn unsubscribe(&self, origin_id: &str) -> Result<i64> {
        let remaining = self.frontier.adjust_requests_count(origin_id, -1).await?;

        if remaining == 0 {
            let purged = self.frontier.delete_all_with_origin(origin_id).await?;
            self.skip_cache.mark(origin_id);
            info!(origin_id = %origin_id, purged, "Search abandoned");
        } else {
            debug!(origin_id = %origin_id, remaining, "Subscription dropped");
        }

        Ok(remaining)
    }

    /// Current status of a search, with its trace filled in once found.
    pub async fn get_result(&self, origin_id: &str) -> Result<PathRecord> {
        let mut record = self.ledger.get_status_by_origin(origin_id).await?;

        if record.status == PathStatus::Found && !record.has_trace() {
            match self.ledger.reconstruct_trace(origin_id).await {
                Ok(chain) => record.trace = join_trace(&chain),
                Err(e) if e.is_not_found() => {
                    warn!(origin_id = %origin_id, "Search found but no chain in ledger");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(record)
    }

    /// True when work for this task's origin should be dropped.
    pub async fn should_skip(&self, task: &FrontierTask) -> bool {
        if self.skip_cache.contains(&task.origin_id) {
            return true;
        }

        match self.frontier.should_skip(task).await {
            Ok(skip) => skip,
            Err(e) => {
                warn!(origin_id = %task.origin_id, error = %e, "Skip check failed");
                false
            }
        }
    }

    /// Decode a queue delivery and process it.
    pub async fn handle_delivery(
        &self,
        plugin: &dyn CrawlerPlugin,
        payload: &[u8],
    ) -> Result<TaskOutcome> {
        let task = FrontierTask::from_payload(payload)?;
        self.process_task(plugin, &task).await
    }

    /// Expand one task with `plugin` and apply the results.
    pub async fn process_task(
        &self,
        plugin: &dyn CrawlerPlugin,
        task: &FrontierTask,
    ) -> Result<TaskOutcome> {
        if self.should_skip(task).await {
            debug!(task_id = %task.id, origin_id = %task.origin_id, "Skipping task of concluded search");
            return Ok(TaskOutcome::Skipped);
        }

        let request = ExpandRequest {
            source_node: task.source_node.clone(),
            dest_node: task.dest_node.clone(),
            cursor: task.cursor.clone(),
        };

        let response = match plugin.expand(&request).await {
            Ok(response) => response,
            Err(e) => {
                let e = SeekerError::from(e);
                warn!(
                    plugin = plugin.name(),
                    task_id = %task.id,
                    source = %task.source_node,
                    error = %e,
                    "Expansion failed, dropping task"
                );
                return Ok(TaskOutcome::FetchFailed);
            }
        };

        let mut edges = Vec::new();
        let mut children = Vec::new();
        let mut reached = false;

        for connection in &response.connections {
            if connection.source_node != task.source_node {
                edges.push(NewEdge::discovered(
                    task.origin_id.as_str(),
                    task.source_node.as_str(),
                    connection.source_node.as_str(),
                ));
            }

            if connection.reaches_destination() {
                reached = true;
                break;
            }

            children.push(NewTask::child_of(
                task,
                connection.source_node.as_str(),
                connection.dest_node.as_str(),
                connection.cursor.as_str(),
            ));
        }

        let new_edges = match self.ledger.bulk_record_edges(&edges).await {
            Ok(new_edges) => new_edges,
            Err(e) if reached => {
                error!(
                    origin_id = %task.origin_id,
                    task_id = %task.id,
                    error = %e,
                    "Failed to record edges of closing expansion"
                );
                0
            }
            Err(e) => return Err(e),
        };

        if reached {
            self.finalize(task).await?;
            return Ok(TaskOutcome::Reached);
        }

        let mut next_tasks = 0;
        for child in children {
            match self.frontier.create_task(child).await {
                Ok(_) => next_tasks += 1,
                Err(e) => {
                    warn!(origin_id = %task.origin_id, error = %e, "Failed to create frontier task");
                }
            }
        }

        debug!(
            plugin = plugin.name(),
            task_id = %task.id,
            next_tasks,
            new_edges,
            "Task expanded"
        );
        Ok(TaskOutcome::Expanded {
            next_tasks,
            new_edges,
        })
    }

    async fn finalize(&self, task: &FrontierTask) -> Result<()> {
        let purged = self.frontier.delete_all_with_origin(&task.origin_id).await?;
        let transitioned = self
            .ledger
            .update_status(&task.origin_id, PathStatus::Found)
            .await?;
        self.skip_cache.mark(&task.origin_id);

        if transitioned {
            info!(origin_id = %task.origin_id, purged, "Destination reached");
        } else {
            debug!(origin_id = %task.origin_id, "Destination reached again, status already final");
        }
        Ok(())
    }

    /// Spawn the produce and consume loops for every plugin.
    ///
    /// The loops run until `shutdown` is cancelled.
    pub fn start(self: &Arc<Self>, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(self.workers.len() * 2);

        for worker in &self.workers {
            handles.push(tokio::spawn(
                Arc::clone(self).produce_loop(worker.clone(), shutdown.clone()),
            ));
            handles.push(tokio::spawn(
                Arc::clone(self).consume_loop(worker.clone(), shutdown.clone()),
            ));
        }

        handles
    }

    async fn produce_loop(self: Arc<Self>, worker: PluginWorker, shutdown: CancellationToken) {
        let plugin = worker.plugin.name().to_string();
        let batch_size = worker.queue.config().queue_size;
        info!(plugin = %plugin, batch_size, "Production loop starting");

        'poll: loop {
            if shutdown.is_cancelled() {
                break;
            }

            let tasks = match self.frontier.get_oldest(batch_size).await {
                Ok(tasks) => tasks,
                Err(e) => {
                    error!(plugin = %plugin, error = %e, "Failed to poll frontier");
                    Vec::new()
                }
            };

            if tasks.is_empty() {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.config.poll_backoff) => {}
                }
                continue;
            }

            for task in tasks {
                let payload = match task.to_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!(task_id = %task.id, error = %e, "Failed to encode task");
                        continue;
                    }
                };

                let published = tokio::select! {
                    _ = shutdown.cancelled() => break 'poll,
                    published = worker.queue.publish(payload) => published,
                };

                if let Err(e) = published {
                    error!(plugin = %plugin, error = %e, "Work queue unavailable");
                    break 'poll;
                }

                if let Err(e) = self.frontier.delete_task(&task.id, &task.origin_id).await {
                    warn!(task_id = %task.id, error = %e, "Failed to delete published task");
                }
            }

            debug!(plugin = %plugin, buffered = worker.queue.len(), "Published frontier batch");
        }

        info!(plugin = %plugin, "Production loop stopped");
    }

    async fn consume_loop(self: Arc<Self>, worker: PluginWorker, shutdown: CancellationToken) {
        let plugin = worker.plugin.name().to_string();

        let mut deliveries = match worker.queue.start_consuming(shutdown).await {
            Ok(deliveries) => deliveries,
            Err(e) => {
                error!(plugin = %plugin, error = %e, "Failed to start consuming");
                return;
            }
        };
        info!(plugin = %plugin, "Consumption loop starting");

        while let Some(payload) = deliveries.next().await {
            if let Err(e) = self
                .handle_delivery(worker.plugin.as_ref(), &payload)
                .await
            {
                error!(plugin = %plugin, error = %e, "Failed to process task");
            }
        }

        info!(plugin = %plugin, "Consumption loop stopped");
    }
}

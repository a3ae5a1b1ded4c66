//! Testing utilities including a scripted crawler plugin.
//!
//! Useful for exercising the orchestrator without network calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::Duration;

use crate::config::QueueConfig;
use crate::error::{FetchError, FetchResult};
use crate::traits::{Connection, CrawlerPlugin, ExpandRequest, ExpandResponse};

/// A crawler plugin that answers from a fixed link graph.
///
/// Links for a node become connections toward the request's destination, so
/// a link to the destination itself closes the search.
pub struct MockPlugin {
    name: String,

    /// Outgoing links by source node
    links: RwLock<HashMap<String, Vec<String>>>,

    /// Explicit connections by source node, returned instead of links
    connections: RwLock<HashMap<String, Vec<Connection>>>,

    /// Source nodes whose expansion fails
    failures: RwLock<HashSet<String>>,

    queue_config: QueueConfig,

    /// Call tracking for assertions
    calls: RwLock<Vec<ExpandRequest>>,
}

impl Default for MockPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlugin {
    pub fn new() -> Self {
        Self::named("mock")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: RwLock::new(HashMap::new()),
            connections: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashSet::new()),
            queue_config: QueueConfig::new(Duration::ZERO, 8),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Add outgoing links for a node.
    pub fn with_links(self, source: impl Into<String>, links: &[&str]) -> Self {
        self.links
            .write()
            .unwrap()
            .insert(source.into(), links.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Return exactly these connections when expanding `source`.
    pub fn with_connections(self, source: impl Into<String>, connections: Vec<Connection>) -> Self {
        self.connections
            .write()
            .unwrap()
            .insert(source.into(), connections);
        self
    }

    /// Make expansion of `source` fail.
    pub fn with_failure(self, source: impl Into<String>) -> Self {
        self.failures.write().unwrap().insert(source.into());
        self
    }

    pub fn with_queue_config(mut self, queue_config: QueueConfig) -> Self {
        self.queue_config = queue_config;
        self
    }

    /// Every request received, in order.
    pub fn calls(&self) -> Vec<ExpandRequest> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Number of times `source` was expanded.
    pub fn calls_for(&self, source: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.source_node == source)
            .count()
    }
}

#[async_trait]
impl CrawlerPlugin for MockPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn expand(&self, request: &ExpandRequest) -> FetchResult<ExpandResponse> {
        self.calls.write().unwrap().push(request.clone());

        if self.failures.read().unwrap().contains(&request.source_node) {
            return Err(FetchError::Rejected(format!(
                "scripted failure for {}",
                request.source_node
            )));
        }

        if let Some(connections) = self.connections.read().unwrap().get(&request.source_node) {
            return Ok(ExpandResponse {
                connections: connections.clone(),
            });
        }

        let connections = self
            .links
            .read()
            .unwrap()
            .get(&request.source_node)
            .map(|links| {
                links
                    .iter()
                    .map(|link| Connection::new(link.as_str(), request.dest_node.as_str(), ""))
                    .collect()
            })
            .unwrap_or_default();

        Ok(ExpandResponse { connections })
    }

    fn queue_config(&self) -> QueueConfig {
        self.queue_config
    }
}

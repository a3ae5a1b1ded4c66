//! Crawler plugin contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::QueueConfig;
use crate::error::FetchResult;

/// A request to expand one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandRequest {
    pub source_node: String,
    pub dest_node: String,
    /// Continuation token from a previous page, empty for the first page
    pub cursor: String,
}

/// One discovered connection.
///
/// A connection with `source_node == dest_node` means the destination was
/// reached. A connection back to the request's own `source_node` is a
/// continuation carrying the next `cursor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source_node: String,
    pub dest_node: String,
    pub cursor: String,
}

impl Connection {
    pub fn new(
        source_node: impl Into<String>,
        dest_node: impl Into<String>,
        cursor: impl Into<String>,
    ) -> Self {
        Self {
            source_node: source_node.into(),
            dest_node: dest_node.into(),
            cursor: cursor.into(),
        }
    }

    pub fn reaches_destination(&self) -> bool {
        self.source_node == self.dest_node
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandResponse {
    pub connections: Vec<Connection>,
}

/// A source of graph edges.
#[async_trait]
pub trait CrawlerPlugin: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Fetch the outgoing connections of `request.source_node`.
    async fn expand(&self, request: &ExpandRequest) -> FetchResult<ExpandResponse>;

    /// Pacing and capacity of this plugin's work queue. Read once at registration.
    fn queue_config(&self) -> QueueConfig;
}

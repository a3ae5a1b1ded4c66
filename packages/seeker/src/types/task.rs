//! Frontier task types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash::generate_id;

/// A pending request to expand one graph node within a search.
///
/// `id` is the content address of `(source_node, dest_node)`. The root task of
/// a search has `origin_id == id`; every task discovered while expanding it
/// carries the root's id as `origin_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierTask {
    /// Content address of (source_node, dest_node)
    pub id: String,

    /// Id of the root task this work contributes to
    pub origin_id: String,

    pub source_node: String,

    pub dest_node: String,

    /// Opaque continuation token from a previous expansion, empty if none
    #[serde(default)]
    pub cursor: String,

    /// Live client subscriptions to the origin search
    #[serde(default)]
    pub requests_count: i64,

    /// Creation time, used for FIFO polling
    pub created_at: DateTime<Utc>,
}

impl FrontierTask {
    /// True for the task a client search started from.
    pub fn is_root(&self) -> bool {
        self.id == self.origin_id
    }

    /// Encode the task for a work queue.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a task delivered by a work queue.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// Arguments for creating a frontier task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub id: String,
    pub origin_id: String,
    pub source_node: String,
    pub dest_node: String,
    pub cursor: String,
    /// Count used when the origin has no subscription count yet
    pub requests_count: i64,
}

impl NewTask {
    /// The root task of a fresh client search.
    pub fn root(source_node: impl Into<String>, dest_node: impl Into<String>) -> Self {
        let source_node = source_node.into();
        let dest_node = dest_node.into();
        let id = generate_id(&source_node, &dest_node);

        Self {
            origin_id: id.clone(),
            id,
            source_node,
            dest_node,
            cursor: String::new(),
            requests_count: 1,
        }
    }

    /// A task discovered while expanding `parent`.
    pub fn child_of(
        parent: &FrontierTask,
        source_node: impl Into<String>,
        dest_node: impl Into<String>,
        cursor: impl Into<String>,
    ) -> Self {
        let source_node = source_node.into();
        let dest_node = dest_node.into();

        Self {
            id: generate_id(&source_node, &dest_node),
            origin_id: parent.origin_id.clone(),
            source_node,
            dest_node,
            cursor: cursor.into(),
            requests_count: parent.requests_count,
        }
    }

    /// Materialize the row as a store would on first insert.
    pub fn into_task(self, requests_count: i64) -> FrontierTask {
        FrontierTask {
            id: self.id,
            origin_id: self.origin_id,
            source_node: self.source_node,
            dest_node: self.dest_node,
            cursor: self.cursor,
            requests_count,
            created_at: Utc::now(),
        }
    }
}

/// A client's subscription to a search, as recorded by the frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub origin_id: String,

    /// Live subscriptions after this one was added
    pub requests_count: i64,

    /// The root row queued by this call. `None` when the search was already
    /// running, whether or not its root is still pending.
    pub root: Option<FrontierTask>,
}

impl Subscription {
    /// True when this call started (or restarted) the search.
    pub fn is_fresh(&self) -> bool {
        self.root.is_some()
    }
}

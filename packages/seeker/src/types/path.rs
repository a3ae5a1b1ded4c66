//! Edge ledger types: status records and discovered edges.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SeekerError;
use crate::hash::generate_id;

/// Separator between node names in a stored trace.
pub const TRACE_SEPARATOR: char = ',';

/// Lifecycle of a search, and the fixed status of edge rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStatus {
    NotStarted,
    InProgress,
    Found,
    NotFound,
    Cancelled,
}

impl PathStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathStatus::NotStarted => "not_started",
            PathStatus::InProgress => "in_progress",
            PathStatus::Found => "found",
            PathStatus::NotFound => "not_found",
            PathStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PathStatus::Found | PathStatus::NotFound | PathStatus::Cancelled
        )
    }

    /// The search reached an answer; further expansion is wasted work.
    pub fn is_concluded(&self) -> bool {
        matches!(self, PathStatus::Found | PathStatus::NotFound)
    }
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathStatus {
    type Err = SeekerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(PathStatus::NotStarted),
            "in_progress" => Ok(PathStatus::InProgress),
            "found" => Ok(PathStatus::Found),
            "not_found" => Ok(PathStatus::NotFound),
            "cancelled" => Ok(PathStatus::Cancelled),
            other => Err(SeekerError::Storage(
                format!("unknown path status: {}", other).into(),
            )),
        }
    }
}

/// Which role a ledger row plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Overall status of one search (one per origin)
    Status,
    /// One discovered edge
    Edge,
}

impl PathKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathKind::Status => "status",
            PathKind::Edge => "edge",
        }
    }
}

impl FromStr for PathKind {
    type Err = SeekerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(PathKind::Status),
            "edge" => Ok(PathKind::Edge),
            other => Err(SeekerError::Storage(
                format!("unknown path kind: {}", other).into(),
            )),
        }
    }
}

/// A row of the edge ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    /// Storage-assigned id; also the table order used for tie-breaks
    pub id: i64,

    pub origin_id: String,

    pub kind: PathKind,

    /// Origin id for status rows, the edge's content address for edge rows
    pub task_hash: String,

    pub source_node: String,

    pub dest_node: String,

    pub status: PathStatus,

    /// Comma-joined node names, empty until known
    pub trace: String,

    pub created_at: DateTime<Utc>,
}

impl PathRecord {
    pub fn has_trace(&self) -> bool {
        !self.trace.is_empty()
    }

    /// Node names along the trace, in order.
    pub fn trace_nodes(&self) -> Vec<&str> {
        if self.trace.is_empty() {
            return Vec::new();
        }
        self.trace.split(TRACE_SEPARATOR).collect()
    }
}

/// Join node names into the stored trace format.
pub fn join_trace<S: AsRef<str>>(nodes: &[S]) -> String {
    let mut trace = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            trace.push(TRACE_SEPARATOR);
        }
        trace.push_str(node.as_ref());
    }
    trace
}

/// A discovered edge waiting to be written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEdge {
    pub origin_id: String,
    pub source_node: String,
    pub dest_node: String,
    pub trace: String,
}

impl NewEdge {
    /// An edge found while expanding `source_node`, with its two-hop trace.
    pub fn discovered(
        origin_id: impl Into<String>,
        source_node: impl Into<String>,
        dest_node: impl Into<String>,
    ) -> Self {
        let source_node = source_node.into();
        let dest_node = dest_node.into();
        let trace = join_trace(&[&source_node, &dest_node]);

        Self {
            origin_id: origin_id.into(),
            source_node,
            dest_node,
            trace,
        }
    }

    /// Content address of the edge.
    pub fn task_hash(&self) -> String {
        generate_id(&self.source_node, &self.dest_node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            PathStatus::NotStarted,
            PathStatus::InProgress,
            PathStatus::Found,
            PathStatus::NotFound,
            PathStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<PathStatus>().unwrap(), status);
        }
        assert!("done".parse::<PathStatus>().is_err());
    }

    #[test]
    fn test_terminal_and_concluded() {
        assert!(!PathStatus::InProgress.is_terminal());
        assert!(PathStatus::Cancelled.is_terminal());
        assert!(!PathStatus::Cancelled.is_concluded());
        assert!(PathStatus::Found.is_concluded());
        assert!(PathStatus::NotFound.is_concluded());
    }

    #[test]
    fn test_discovered_edge_trace() {
        let edge = NewEdge::discovered("origin", "Kevin Bacon", "Footloose");

        assert_eq!(edge.trace, "Kevin Bacon,Footloose");
        assert_eq!(edge.task_hash(), generate_id("Kevin Bacon", "Footloose"));
    }

    #[test]
    fn test_trace_nodes() {
        let record = PathRecord {
            id: 1,
            origin_id: "o".into(),
            kind: PathKind::Status,
            task_hash: "o".into(),
            source_node: "A".into(),
            dest_node: "C".into(),
            status: PathStatus::Found,
            trace: join_trace(&["A", "B", "C"]),
            created_at: Utc::now(),
        };

        assert_eq!(record.trace_nodes(), vec!["A", "B", "C"]);
        assert!(record.has_trace());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PathStatus::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
    }
}

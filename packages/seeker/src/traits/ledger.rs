//! Edge ledger: discovered edges and per-search status.

use async_trait::async_trait;

use crate::error::{Result, SeekerError};
use crate::trace::find_chain;
use crate::types::path::{join_trace, NewEdge, PathRecord, PathStatus};

/// Durable record of discovered edges and of each search's status.
#[async_trait]
pub trait EdgeLedger: Send + Sync {
    /// The status record of a search.
    async fn get_status_by_origin(&self, origin_id: &str) -> Result<PathRecord>;

    /// Create the status record as `in_progress`, or return the existing one.
    async fn create_status_record(
        &self,
        origin_id: &str,
        source_node: &str,
        dest_node: &str,
    ) -> Result<PathRecord>;

    /// Move a non-terminal status record to `status`.
    ///
    /// Returns `false` when the record was already terminal and nothing changed.
    async fn update_status(&self, origin_id: &str, status: PathStatus) -> Result<bool>;

    /// Record one edge, or return the existing row for the same edge.
    async fn record_edge(&self, edge: NewEdge) -> Result<PathRecord>;

    /// Record a batch of edges, returning how many were new.
    async fn bulk_record_edges(&self, edges: &[NewEdge]) -> Result<u64>;

    /// Edge rows of a search in table order.
    async fn list_edges(&self, origin_id: &str) -> Result<Vec<PathRecord>>;

    /// Store the reconstructed trace on the status record.
    async fn set_trace(&self, origin_id: &str, trace: &str) -> Result<()>;

    /// Ordered node names from the search's source to its destination.
    ///
    /// The first computation is cached on the status record.
    async fn reconstruct_trace(&self, origin_id: &str) -> Result<Vec<String>> {
        let status = self.get_status_by_origin(origin_id).await?;
        if status.has_trace() {
            return Ok(status.trace_nodes().into_iter().map(String::from).collect());
        }

        let edges = self.list_edges(origin_id).await?;
        let chain = find_chain(
            edges
                .iter()
                .map(|e| (e.source_node.as_str(), e.dest_node.as_str())),
            &status.source_node,
            &status.dest_node,
        )
        .ok_or_else(|| SeekerError::not_found("trace for", origin_id))?;

        self.set_trace(origin_id, &join_trace(&chain)).await?;
        Ok(chain)
    }
}

//! Frontier storage: pending exploration tasks per search origin.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::task::{FrontierTask, NewTask, Subscription};

/// Durable, deduplicated set of pending exploration tasks.
///
/// Rows are unique on `(id, origin_id)`. Each origin also owns a subscription
/// counter that outlives its rows: publishing a task deletes the row, never
/// the counter. Every row of an origin mirrors the counter.
#[async_trait]
pub trait FrontierStore: Send + Sync {
    /// Insert a task, or return the existing row for `(id, origin_id)` unchanged.
    ///
    /// A new row takes the origin's subscription count when it has one, else
    /// `task.requests_count`.
    async fn create_task(&self, task: NewTask) -> Result<FrontierTask>;

    /// Look up a task by content address, preferring the root row.
    async fn get_task(&self, id: &str) -> Result<FrontierTask>;

    /// Up to `limit` tasks in creation order.
    async fn get_oldest(&self, limit: usize) -> Result<Vec<FrontierTask>>;

    /// Delete one task. Deleting a missing task is not an error.
    async fn delete_task(&self, id: &str, origin_id: &str) -> Result<()>;

    /// Delete every task of an origin, returning how many were removed.
    ///
    /// The origin's subscription counter is kept.
    async fn delete_all_with_origin(&self, origin_id: &str) -> Result<u64>;

    /// Add `delta` to the origin's subscription count, clamped at zero, and
    /// mirror it onto the origin's rows.
    ///
    /// Returns the new count. `NotFound` when the origin was never subscribed,
    /// or when `delta` is negative and no subscription is left to drop.
    async fn adjust_requests_count(&self, origin_id: &str, delta: i64) -> Result<i64>;

    /// Subscribe a client to the search `(source_node, dest_node)`.
    ///
    /// Atomically increments the origin's subscription count. The root row is
    /// queued only when the count goes from zero to one; a running search is
    /// never re-seeded.
    async fn subscribe_root(&self, source_node: &str, dest_node: &str) -> Result<Subscription>;

    /// Number of pending tasks for an origin.
    async fn count_with_origin(&self, origin_id: &str) -> Result<usize>;

    /// True when the task's origin has already concluded.
    async fn should_skip(&self, task: &FrontierTask) -> Result<bool>;
}

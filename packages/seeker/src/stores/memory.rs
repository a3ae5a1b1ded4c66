//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::error::{Result, SeekerError};
use crate::hash::generate_id;
use crate::traits::{EdgeLedger, FrontierStore};
use crate::types::path::{NewEdge, PathKind, PathRecord, PathStatus};
use crate::types::task::{FrontierTask, NewTask, Subscription};

#[derive(Default)]
struct FrontierState {
    /// Rows keyed by insertion sequence
    tasks: BTreeMap<u64, FrontierTask>,
    /// (id, origin_id) -> sequence
    index: HashMap<(String, String), u64>,
    /// origin_id -> live subscriptions; survives its rows being published
    subscriptions: HashMap<String, i64>,
    next_seq: u64,
}

impl FrontierState {
    fn origin_count(&self, origin_id: &str) -> Option<i64> {
        self.subscriptions.get(origin_id).copied().or_else(|| {
            self.tasks
                .values()
                .filter(|t| t.origin_id == origin_id)
                .map(|t| t.requests_count)
                .max()
        })
    }

    fn set_count(&mut self, origin_id: &str, count: i64) {
        self.subscriptions.insert(origin_id.to_string(), count);
        for task in self
            .tasks
            .values_mut()
            .filter(|t| t.origin_id == origin_id)
        {
            task.requests_count = count;
        }
    }

    fn insert(&mut self, task: NewTask) -> FrontierTask {
        let key = (task.id.clone(), task.origin_id.clone());
        if let Some(seq) = self.index.get(&key) {
            if let Some(existing) = self.tasks.get(seq) {
                return existing.clone();
            }
        }

        let count = self
            .origin_count(&task.origin_id)
            .unwrap_or(task.requests_count);
        let row = task.into_task(count);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert(seq, row.clone());
        self.index.insert(key, seq);
        row
    }
}

#[derive(Default)]
struct LedgerState {
    /// Rows in id order
    paths: Vec<PathRecord>,
    /// (origin_id, kind, task_hash) -> position in `paths`
    index: HashMap<(String, PathKind, String), usize>,
}

impl LedgerState {
    fn find(&self, origin_id: &str, kind: PathKind, task_hash: &str) -> Option<&PathRecord> {
        self.index
            .get(&(origin_id.to_string(), kind, task_hash.to_string()))
            .and_then(|&pos| self.paths.get(pos))
    }

    fn status_mut(&mut self, origin_id: &str) -> Option<&mut PathRecord> {
        let pos = *self.index.get(&(
            origin_id.to_string(),
            PathKind::Status,
            origin_id.to_string(),
        ))?;
        self.paths.get_mut(pos)
    }

    /// Insert a row unless its key exists. Returns the stored row and whether
    /// it was new.
    fn insert(&mut self, mut record: PathRecord) -> (PathRecord, bool) {
        let key = (
            record.origin_id.clone(),
            record.kind,
            record.task_hash.clone(),
        );
        if let Some(&pos) = self.index.get(&key) {
            return (self.paths[pos].clone(), false);
        }

        record.id = self.paths.len() as i64 + 1;
        self.index.insert(key, self.paths.len());
        self.paths.push(record.clone());
        (record, true)
    }

    fn edge_record(edge: &NewEdge) -> PathRecord {
        PathRecord {
            id: 0,
            origin_id: edge.origin_id.clone(),
            kind: PathKind::Edge,
            task_hash: edge.task_hash(),
            source_node: edge.source_node.clone(),
            dest_node: edge.dest_node.clone(),
            status: PathStatus::Found,
            trace: edge.trace.clone(),
            created_at: Utc::now(),
        }
    }
}

/// In-memory frontier and edge ledger.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    frontier: RwLock<FrontierState>,
    ledger: RwLock<LedgerState>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of pending frontier tasks.
    pub async fn task_count(&self) -> usize {
        self.frontier.read().await.tasks.len()
    }

    /// Total number of ledger rows, status and edge.
    pub async fn path_count(&self) -> usize {
        self.ledger.read().await.paths.len()
    }
}

#[async_trait]
impl FrontierStore for MemoryStore {
    async fn create_task(&self, task: NewTask) -> Result<FrontierTask> {
        Ok(self.frontier.write().await.insert(task))
    }

    async fn get_task(&self, id: &str) -> Result<FrontierTask> {
        let frontier = self.frontier.read().await;

        let root_key = (id.to_string(), id.to_string());
        if let Some(task) = frontier
            .index
            .get(&root_key)
            .and_then(|seq| frontier.tasks.get(seq))
        {
            return Ok(task.clone());
        }

        frontier
            .tasks
            .values()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| SeekerError::not_found("task", id))
    }

    async fn get_oldest(&self, limit: usize) -> Result<Vec<FrontierTask>> {
        Ok(self
            .frontier
            .read()
            .await
            .tasks
            .values()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_task(&self, id: &str, origin_id: &str) -> Result<()> {
        let mut frontier = self.frontier.write().await;
        if let Some(seq) = frontier
            .index
            .remove(&(id.to_string(), origin_id.to_string()))
        {
            frontier.tasks.remove(&seq);
        }
        Ok(())
    }

    async fn delete_all_with_origin(&self, origin_id: &str) -> Result<u64> {
        let mut frontier = self.frontier.write().await;
        let before = frontier.tasks.len();

        frontier.tasks.retain(|_, t| t.origin_id != origin_id);
        frontier.index.retain(|(_, origin), _| origin != origin_id);

        Ok((before - frontier.tasks.len()) as u64)
    }

    async fn adjust_requests_count(&self, origin_id: &str, delta: i64) -> Result<i64> {
        let mut frontier = self.frontier.write().await;
        let current = frontier
            .subscriptions
            .get(origin_id)
            .copied()
            .filter(|&count| count > 0 || delta >= 0)
            .ok_or_else(|| SeekerError::not_found("subscription for", origin_id))?;

        let updated = (current + delta).max(0);
        frontier.set_count(origin_id, updated);
        Ok(updated)
    }

    async fn subscribe_root(&self, source_node: &str, dest_node: &str) -> Result<Subscription> {
        let mut frontier = self.frontier.write().await;
        let origin_id = generate_id(source_node, dest_node);

        let requests_count = frontier.subscriptions.get(&origin_id).copied().unwrap_or(0) + 1;
        frontier.set_count(&origin_id, requests_count);

        let root = (requests_count == 1)
            .then(|| frontier.insert(NewTask::root(source_node, dest_node)));

        Ok(Subscription {
            origin_id,
            requests_count,
            root,
        })
    }

    async fn count_with_origin(&self, origin_id: &str) -> Result<usize> {
        Ok(self
            .frontier
            .read()
            .await
            .tasks
            .values()
            .filter(|t| t.origin_id == origin_id)
            .count())
    }

    async fn should_skip(&self, task: &FrontierTask) -> Result<bool> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .find(&task.origin_id, PathKind::Status, &task.origin_id)
            .map(|record| record.status.is_concluded())
            .unwrap_or(false))
    }
}

#[async_trait]
impl EdgeLedger for MemoryStore {
    async fn get_status_by_origin(&self, origin_id: &str) -> Result<PathRecord> {
        self.ledger
            .read()
            .await
            .find(origin_id, PathKind::Status, origin_id)
            .cloned()
            .ok_or_else(|| SeekerError::not_found("status for", origin_id))
    }

    async fn create_status_record(
        &self,
        origin_id: &str,
        source_node: &str,
        dest_node: &str,
    ) -> Result<PathRecord> {
        let record = PathRecord {
            id: 0,
            origin_id: origin_id.to_string(),
            kind: PathKind::Status,
            task_hash: origin_id.to_string(),
            source_node: source_node.to_string(),
            dest_node: dest_node.to_string(),
            status: PathStatus::InProgress,
            trace: String::new(),
            created_at: Utc::now(),
        };
        Ok(self.ledger.write().await.insert(record).0)
    }

    async fn update_status(&self, origin_id: &str, status: PathStatus) -> Result<bool> {
        let mut ledger = self.ledger.write().await;
        let record = ledger
            .status_mut(origin_id)
            .ok_or_else(|| SeekerError::not_found("status for", origin_id))?;

        if record.status.is_terminal() {
            return Ok(false);
        }
        record.status = status;
        Ok(true)
    }

    async fn record_edge(&self, edge: NewEdge) -> Result<PathRecord> {
        let record = LedgerState::edge_record(&edge);
        Ok(self.ledger.write().await.insert(record).0)
    }

    async fn bulk_record_edges(&self, edges: &[NewEdge]) -> Result<u64> {
        let mut ledger = self.ledger.write().await;
        let inserted = edges
            .iter()
            .filter(|edge| ledger.insert(LedgerState::edge_record(edge)).1)
            .count();
        Ok(inserted as u64)
    }

    async fn list_edges(&self, origin_id: &str) -> Result<Vec<PathRecord>> {
        Ok(self
            .ledger
            .read()
            .await
            .paths
            .iter()
            .filter(|p| p.origin_id == origin_id && p.kind == PathKind::Edge)
            .cloned()
            .collect())
    }

    async fn set_trace(&self, origin_id: &str, trace: &str) -> Result<()> {
        let mut ledger = self.ledger.write().await;
        let record = ledger
            .status_mut(origin_id)
            .ok_or_else(|| SeekerError::not_found("status for", origin_id))?;
        record.trace = trace.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_task_is_idempotent() {
        let store = MemoryStore::new();

        let first = store.create_task(NewTask::root("A", "C")).await.unwrap();
        let second = store.create_task(NewTask::root("A", "C")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.task_count().await, 1);
    }

    #[tokio::test]
    async fn test_same_id_allowed_once_per_origin() {
        let store = MemoryStore::new();
        let root = store.create_task(NewTask::root("A", "C")).await.unwrap();

        // B->C discovered under A->C, then requested directly by a client
        store
            .create_task(NewTask::child_of(&root, "B", "C", ""))
            .await
            .unwrap();
        let direct = store.subscribe_root("B", "C").await.unwrap().root.unwrap();

        assert!(direct.is_root());
        assert_eq!(store.task_count().await, 3);

        let found = store.get_task(&direct.id).await.unwrap();
        assert!(found.is_root());
    }

    #[tokio::test]
    async fn test_children_inherit_origin_count() {
        let store = MemoryStore::new();
        let root = store.subscribe_root("A", "C").await.unwrap().root.unwrap();
        store.subscribe_root("A", "C").await.unwrap();

        let mut new_child = NewTask::child_of(&root, "B", "C", "");
        new_child.requests_count = 1;
        let child = store.create_task(new_child).await.unwrap();

        assert_eq!(child.requests_count, 2);
    }

    #[tokio::test]
    async fn test_adjust_clamps_and_mirrors() {
        let store = MemoryStore::new();
        let root = store.subscribe_root("A", "C").await.unwrap().root.unwrap();
        let child = store
            .create_task(NewTask::child_of(&root, "B", "C", ""))
            .await
            .unwrap();

        assert_eq!(store.adjust_requests_count(&root.id, 2).await.unwrap(), 3);
        assert_eq!(store.adjust_requests_count(&root.id, -10).await.unwrap(), 0);

        let oldest = store.get_oldest(10).await.unwrap();
        assert!(oldest.iter().all(|t| t.requests_count == 0));
        assert_eq!(oldest[1].id, child.id);
    }

    #[tokio::test]
    async fn test_adjust_unknown_origin() {
        let store = MemoryStore::new();
        let err = store.adjust_requests_count("nope", -1).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_count_survives_published_root() {
        let store = MemoryStore::new();
        let first = store.subscribe_root("A", "C").await.unwrap();
        let root = first.root.unwrap();

        // Published roots leave the table
        store.delete_task(&root.id, &root.origin_id).await.unwrap();

        let second = store.subscribe_root("A", "C").await.unwrap();
        assert_eq!(second.requests_count, 2);
        assert!(!second.is_fresh());
        assert_eq!(store.task_count().await, 0);

        assert_eq!(store.adjust_requests_count(&root.id, -1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_running_search_not_requeued() {
        let store = MemoryStore::new();
        store.subscribe_root("A", "C").await.unwrap();
        let again = store.subscribe_root("A", "C").await.unwrap();

        assert_eq!(again.requests_count, 2);
        assert!(again.root.is_none());
        assert_eq!(store.task_count().await, 1);
        assert_eq!(store.get_oldest(10).await.unwrap()[0].requests_count, 2);
    }

    #[tokio::test]
    async fn test_drained_subscription() {
        let store = MemoryStore::new();
        let origin_id = store.subscribe_root("A", "C").await.unwrap().origin_id;

        assert_eq!(store.adjust_requests_count(&origin_id, -1).await.unwrap(), 0);
        let err = store.adjust_requests_count(&origin_id, -1).await.unwrap_err();
        assert!(err.is_not_found());

        store.delete_all_with_origin(&origin_id).await.unwrap();
        let again = store.subscribe_root("A", "C").await.unwrap();
        assert_eq!(again.requests_count, 1);
        assert!(again.is_fresh());
        assert_eq!(store.count_with_origin(&origin_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_oldest_is_fifo() {
        let store = MemoryStore::new();
        for (src, dst) in [("A", "Z"), ("B", "Z"), ("C", "Z")] {
            store.subscribe_root(src, dst).await.unwrap();
        }

        let oldest = store.get_oldest(2).await.unwrap();
        let sources: Vec<_> = oldest.iter().map(|t| t.source_node.as_str()).collect();
        assert_eq!(sources, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_deletes_are_idempotent() {
        let store = MemoryStore::new();
        let root = store.subscribe_root("A", "C").await.unwrap().root.unwrap();
        store
            .create_task(NewTask::child_of(&root, "B", "C", ""))
            .await
            .unwrap();

        store.delete_task(&root.id, &root.origin_id).await.unwrap();
        store.delete_task(&root.id, &root.origin_id).await.unwrap();
        assert_eq!(store.count_with_origin(&root.id).await.unwrap(), 1);

        assert_eq!(store.delete_all_with_origin(&root.id).await.unwrap(), 1);
        assert_eq!(store.delete_all_with_origin(&root.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_edge_is_one_row() {
        let store = MemoryStore::new();

        let first = store
            .record_edge(NewEdge::discovered("o", "A", "B"))
            .await
            .unwrap();
        let second = store
            .record_edge(NewEdge::discovered("o", "A", "B"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.list_edges("o").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_counts_new_rows() {
        let store = MemoryStore::new();
        let edges = vec![
            NewEdge::discovered("o", "A", "B"),
            NewEdge::discovered("o", "A", "D"),
            NewEdge::discovered("o", "A", "B"),
        ];

        assert_eq!(store.bulk_record_edges(&edges).await.unwrap(), 2);
        assert_eq!(store.bulk_record_edges(&edges).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_first_terminal_status_wins() {
        let store = MemoryStore::new();
        store.create_status_record("o", "A", "C").await.unwrap();

        assert!(store.update_status("o", PathStatus::Found).await.unwrap());
        assert!(!store.update_status("o", PathStatus::Cancelled).await.unwrap());

        let status = store.get_status_by_origin("o").await.unwrap();
        assert_eq!(status.status, PathStatus::Found);
    }

    #[tokio::test]
    async fn test_status_and_edge_can_share_hash() {
        let store = MemoryStore::new();
        let origin = generate_id("A", "C");
        store.create_status_record(&origin, "A", "C").await.unwrap();
        store
            .record_edge(NewEdge::discovered(origin.clone(), "A", "C"))
            .await
            .unwrap();

        assert_eq!(store.path_count().await, 2);
        let status = store.get_status_by_origin(&origin).await.unwrap();
        assert_eq!(status.kind, PathKind::Status);
    }

    #[tokio::test]
    async fn test_reconstruct_trace_caches() {
        let store = MemoryStore::new();
        store.create_status_record("o", "A", "C").await.unwrap();
        store
            .bulk_record_edges(&[
                NewEdge::discovered("o", "A", "B"),
                NewEdge::discovered("o", "B", "C"),
            ])
            .await
            .unwrap();

        let chain = store.reconstruct_trace("o").await.unwrap();
        assert_eq!(chain, vec!["A", "B", "C"]);

        let status = store.get_status_by_origin("o").await.unwrap();
        assert_eq!(status.trace, "A,B,C");
        assert_eq!(store.reconstruct_trace("o").await.unwrap(), chain);
    }

    #[tokio::test]
    async fn test_reconstruct_without_chain() {
        let store = MemoryStore::new();
        store.create_status_record("o", "A", "C").await.unwrap();
        store
            .record_edge(NewEdge::discovered("o", "A", "B"))
            .await
            .unwrap();

        let err = store.reconstruct_trace("o").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_should_skip_follows_status() {
        let store = MemoryStore::new();
        let root = store.subscribe_root("A", "C").await.unwrap().root.unwrap();
        store.create_status_record(&root.id, "A", "C").await.unwrap();
        assert!(!store.should_skip(&root).await.unwrap());

        store.update_status(&root.id, PathStatus::Found).await.unwrap();
        assert!(store.should_skip(&root).await.unwrap());
    }
}

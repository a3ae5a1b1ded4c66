//! Origins an orchestrator has seen conclude or lose all subscribers.

use dashmap::DashSet;

/// Per-orchestrator record of origins whose queued work should be dropped.
///
/// Consulted alongside the durable status record, never instead of it.
pub trait SkipCache: Send + Sync {
    fn mark(&self, origin_id: &str);

    fn clear(&self, origin_id: &str);

    fn contains(&self, origin_id: &str) -> bool;
}

/// `DashSet`-backed skip cache.
#[derive(Debug, Default)]
pub struct MemorySkipCache {
    origins: DashSet<String>,
}

impl MemorySkipCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

impl SkipCache for MemorySkipCache {
    fn mark(&self, origin_id: &str) {
        self.origins.insert(origin_id.to_string());
    }

    fn clear(&self, origin_id: &str) {
        self.origins.remove(origin_id);
    }

    fn contains(&self, origin_id: &str) -> bool {
        self.origins.contains(origin_id)
    }
}

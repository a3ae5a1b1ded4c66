//! Domain types shared by the stores, the queue, and the orchestrator.

pub mod path;
pub mod task;

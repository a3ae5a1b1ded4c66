//! Trait seams: storage backends and crawler plugins.

pub mod frontier;
pub mod ledger;
pub mod plugin;

pub use frontier::FrontierStore;
pub use ledger::EdgeLedger;
pub use plugin::{Connection, CrawlerPlugin, ExpandRequest, ExpandResponse};

/// A backend that provides both the frontier and the edge ledger.
pub trait SeekerStore: FrontierStore + EdgeLedger {}

impl<T: FrontierStore + EdgeLedger> SeekerStore for T {}

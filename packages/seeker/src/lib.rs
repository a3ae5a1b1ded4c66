//! Degrees-of-Separation Search Engine
//!
//! Finds a chain of links between two nodes of an externally crawled graph
//! (two Wikipedia articles, for instance) with a queue-driven breadth-first
//! expansion. Each expansion asks a crawler plugin for a node's outgoing
//! links, records them in the edge ledger, and queues the new nodes in the
//! frontier until a link lands on the destination.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use seeker::{MemoryStore, SearchOrchestrator, WikipediaPlugin};
//! use tokio_util::sync::CancellationToken;
//!
//! let store = Arc::new(MemoryStore::new());
//! let orchestrator = Arc::new(SearchOrchestrator::from_store(
//!     store,
//!     vec![Arc::new(WikipediaPlugin::from_env()?)],
//! )?);
//!
//! let shutdown = CancellationToken::new();
//! orchestrator.start(shutdown.clone());
//!
//! let origin_id = orchestrator.submit_search("Kevin Bacon", "Albert Einstein").await?;
//! let result = orchestrator.get_result(&origin_id).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Storage and crawler plugin seams
//! - [`types`] - Frontier tasks and ledger records
//! - [`orchestrator`] - Produce/consume loops and client operations
//! - [`queue`] - Bounded, paced per-plugin work queue
//! - [`stores`] - Storage implementations (MemoryStore, PostgresStore)
//! - [`plugins`] - Crawler plugins (WikipediaPlugin)
//! - [`testing`] - Mock plugin for tests

pub mod config;
pub mod error;
pub mod hash;
pub mod orchestrator;
pub mod plugins;
pub mod queue;
pub mod skip;
pub mod stores;
pub mod testing;
pub mod trace;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::{OrchestratorConfig, QueueConfig};
pub use error::{FetchError, FetchResult, Result, SeekerError};
pub use hash::generate_id;
pub use orchestrator::{SearchOrchestrator, TaskOutcome};
pub use plugins::{title_from_url, WikipediaPlugin};
pub use queue::{QueueTask, WorkQueue};
pub use skip::{MemorySkipCache, SkipCache};
pub use stores::MemoryStore;
pub use traits::{
    Connection, CrawlerPlugin, EdgeLedger, ExpandRequest, ExpandResponse, FrontierStore,
    SeekerStore,
};
pub use types::{
    path::{NewEdge, PathKind, PathRecord, PathStatus},
    task::{FrontierTask, NewTask, Subscription},
};

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;

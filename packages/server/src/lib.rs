// Handshakes Seeker - API Core
//
// HTTP surface over the seeker search engine: submit a search between two
// Wikipedia articles, poll its result, or drop a subscription.

pub mod config;
pub mod server;

pub use config::*;

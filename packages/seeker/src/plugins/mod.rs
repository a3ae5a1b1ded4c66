//! Crawler plugin implementations.

pub mod wikipedia;

pub use wikipedia::{title_from_url, WikipediaPlugin};

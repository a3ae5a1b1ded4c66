// HTTP routes
pub mod health;
pub mod task;

pub use health::*;
pub use task::*;

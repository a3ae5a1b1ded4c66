//! Runtime configuration for queues and the orchestrator.

use std::str::FromStr;
use std::time::Duration;

/// Default sleep when the frontier has nothing to publish.
pub const DEFAULT_POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Read and parse an environment variable, falling back to `default` when it
/// is missing or does not parse.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Invalid environment value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Pacing and capacity of one plugin's work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Wait before each delivery
    pub delay: Duration,

    /// Channel capacity, at least 1
    pub queue_size: usize,
}

impl QueueConfig {
    pub fn new(delay: Duration, queue_size: usize) -> Self {
        Self {
            delay,
            queue_size: queue_size.max(1),
        }
    }

    /// Build from a delay in milliseconds and a size, both read from the
    /// environment with defaults.
    pub fn from_env(
        delay_key: &str,
        default_delay_ms: u64,
        size_key: &str,
        default_size: usize,
    ) -> Self {
        Self::new(
            Duration::from_millis(env_or(delay_key, default_delay_ms)),
            env_or(size_key, default_size),
        )
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), 25)
    }
}

/// Orchestrator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Sleep between frontier polls that found nothing (or failed)
    pub poll_backoff: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_backoff: DEFAULT_POLL_BACKOFF,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_poll_backoff(mut self, poll_backoff: Duration) -> Self {
        self.poll_backoff = poll_backoff;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_size_has_floor() {
        assert_eq!(QueueConfig::new(Duration::ZERO, 0).queue_size, 1);
    }

    #[test]
    fn test_env_or_falls_back() {
        std::env::set_var("SEEKER_TEST_ENV_OR_BAD", "not-a-number");
        assert_eq!(env_or("SEEKER_TEST_ENV_OR_BAD", 7u64), 7);
        assert_eq!(env_or("SEEKER_TEST_ENV_OR_MISSING", 3usize), 3);

        std::env::set_var("SEEKER_TEST_ENV_OR_GOOD", " 42 ");
        assert_eq!(env_or("SEEKER_TEST_ENV_OR_GOOD", 7u64), 42);
    }

    #[test]
    fn test_from_env_defaults() {
        let config = QueueConfig::from_env("SEEKER_TEST_DELAY_UNSET", 250, "SEEKER_TEST_SIZE_UNSET", 4);
        assert_eq!(config.delay, Duration::from_millis(250));
        assert_eq!(config.queue_size, 4);
    }
}

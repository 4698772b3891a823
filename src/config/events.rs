//! Best-effort event delivery configuration.

use serde::Deserialize;

/// Retry budget for impression/click logging.
///
/// Exhausting it drops the event with a warning; the serving call still
/// succeeds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventDeliveryConfig {
    /// Total append attempts, first one included.
    pub max_attempts: usize,
    /// Initial backoff delay in milliseconds.
    pub min_delay_ms: u64,
    /// Backoff ceiling in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for EventDeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay_ms: 5,
            max_delay_ms: 100,
        }
    }
}

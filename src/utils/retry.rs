//! Retry utilities: backoff builders and retryable error classification.
//!
//! Uses `backon` for exponential backoff with jitter.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::config::EventDeliveryConfig;
use crate::error::{ErrorKind, StoreError};

/// Backoff for best-effort event appends.
///
/// `max_attempts` counts the first try, so it allows one fewer retry.
pub fn event_backoff(config: &EventDeliveryConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(config.min_delay_ms))
        .with_max_delay(Duration::from_millis(config.max_delay_ms))
        .with_max_times(config.max_attempts.saturating_sub(1))
        .with_jitter()
}

/// Only backing-store failures are worth another attempt; a rejected value
/// will be rejected again.
pub fn is_retryable(err: &StoreError) -> bool {
    err.kind() == ErrorKind::Internal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&StoreError::Integrity("disk".into())));
        assert!(is_retryable(&sqlx::Error::PoolTimedOut.into()));
        assert!(!is_retryable(&StoreError::invalid("bad campaign")));
        assert!(!is_retryable(&StoreError::NotFound {
            entity: "campaign",
            id: 1
        }));
    }
}

//! Best-effort analytics event delivery.
//!
//! Impressions and clicks are secondary to the call that produced them.
//! Appends are retried with backoff, and an event that still cannot be
//! stored is dropped with a warning instead of failing the caller.

use std::sync::Arc;

use backon::Retryable;
use tracing::warn;

use crate::config::EventDeliveryConfig;
use crate::interfaces::EventLog;
use crate::models::NewAdEvent;
use crate::utils::retry::{event_backoff, is_retryable};

/// Outcome of a best-effort append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDelivery {
    Recorded(i64),
    Dropped,
}

/// Appends events with retry, never surfacing failure.
#[derive(Clone)]
pub struct EventRecorder {
    log: Arc<dyn EventLog>,
    config: EventDeliveryConfig,
}

impl EventRecorder {
    pub fn new(log: Arc<dyn EventLog>, config: EventDeliveryConfig) -> Self {
        Self { log, config }
    }

    pub async fn record(&self, event: &NewAdEvent) -> EventDelivery {
        let result = (|| async { self.log.append(event).await })
            .retry(event_backoff(&self.config))
            .when(is_retryable)
            .notify(|err, delay| {
                warn!(error = %err, ?delay, "retrying event append");
            })
            .await;

        match result {
            Ok(id) => EventDelivery::Recorded(id),
            Err(e) => {
                warn!(
                    error = %e,
                    event_type = %event.event_type,
                    campaign_id = event.campaign_id,
                    advertisement_id = event.advertisement_id,
                    "dropping analytics event"
                );
                EventDelivery::Dropped
            }
        }
    }
}

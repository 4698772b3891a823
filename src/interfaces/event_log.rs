//! Append-only analytics event log.

use async_trait::async_trait;

use crate::error::Result;
use crate::filter::PerformanceFilter;
use crate::models::{AdEvent, EventTally, NewAdEvent};

/// Interface for impression/click persistence.
///
/// There is no update or delete path.
///
/// Implementations:
/// - `SqliteEventLog`: SQLite storage
/// - `MockEventLog`: In-memory log with failure injection for testing
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append one event, returning its id.
    async fn append(&self, event: &NewAdEvent) -> Result<i64>;

    /// Per-(campaign, creative) counts of the user's events matching `filter`,
    /// ordered by campaign id then creative id.
    async fn tally(&self, user_id: i64, filter: &PerformanceFilter) -> Result<Vec<EventTally>>;

    /// The user's raw events, oldest first.
    async fn list_events(&self, user_id: i64) -> Result<Vec<AdEvent>>;
}

//! Mock storage implementations for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::filter::{Field, Op, Operand, PerformanceFilter, Predicate, ToPredicates};
use crate::interfaces::EventLog;
use crate::models::{AdEvent, AdEventType, EventTally, NewAdEvent};

/// In-memory event log with failure injection.
#[derive(Default)]
pub struct MockEventLog {
    events: RwLock<Vec<AdEvent>>,
    titles: RwLock<HashMap<i64, String>>,
    fail_on_append: RwLock<bool>,
    fail_next: RwLock<u32>,
    append_attempts: AtomicUsize,
}

impl MockEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every append until reset.
    pub async fn set_fail_on_append(&self, fail: bool) {
        *self.fail_on_append.write().await = fail;
    }

    /// Fail only the next `count` appends.
    pub async fn set_fail_next(&self, count: u32) {
        *self.fail_next.write().await = count;
    }

    /// Creative title reported by `tally`.
    pub async fn set_title(&self, advertisement_id: i64, title: &str) {
        self.titles
            .write()
            .await
            .insert(advertisement_id, title.to_string());
    }

    /// Number of append calls, failed ones included.
    pub fn append_attempts(&self) -> usize {
        self.append_attempts.load(Ordering::SeqCst)
    }

    pub async fn events(&self) -> Vec<AdEvent> {
        self.events.read().await.clone()
    }
}

fn matches(event: &AdEvent, term: &Predicate) -> bool {
    match (term.field, &term.operand) {
        (Field::Timestamp, Operand::Timestamp(ts)) => match term.op {
            Op::Eq => event.timestamp == *ts,
            Op::Gte => event.timestamp >= *ts,
            Op::Lte => event.timestamp <= *ts,
        },
        (Field::CampaignId, Operand::Int(id)) => match term.op {
            Op::Eq => event.campaign_id == *id,
            Op::Gte => event.campaign_id >= *id,
            Op::Lte => event.campaign_id <= *id,
        },
        _ => false,
    }
}

#[async_trait]
impl EventLog for MockEventLog {
    async fn append(&self, event: &NewAdEvent) -> Result<i64> {
        self.append_attempts.fetch_add(1, Ordering::SeqCst);
        if *self.fail_on_append.read().await {
            return Err(StoreError::Integrity("mock event log unavailable".to_string()));
        }
        {
            let mut fail_next = self.fail_next.write().await;
            if *fail_next > 0 {
                *fail_next -= 1;
                return Err(StoreError::Integrity("mock event log hiccup".to_string()));
            }
        }

        let mut events = self.events.write().await;
        let id = events.len() as i64 + 1;
        events.push(AdEvent {
            id,
            event_type: event.event_type,
            advertisement_id: event.advertisement_id,
            campaign_id: event.campaign_id,
            user_id: event.user_id,
            timestamp: event.timestamp,
        });
        Ok(id)
    }

    async fn tally(&self, user_id: i64, filter: &PerformanceFilter) -> Result<Vec<EventTally>> {
        let terms = filter.predicates();
        let titles = self.titles.read().await;
        let mut counts: BTreeMap<(i64, i64), (i64, i64)> = BTreeMap::new();

        for event in self.events.read().await.iter() {
            if event.user_id != user_id || !terms.iter().all(|t| matches(event, t)) {
                continue;
            }
            let entry = counts
                .entry((event.campaign_id, event.advertisement_id))
                .or_default();
            match event.event_type {
                AdEventType::Impression => entry.0 += 1,
                AdEventType::Click => entry.1 += 1,
            }
        }

        Ok(counts
            .into_iter()
            .map(
                |((campaign_id, advertisement_id), (impressions, clicks))| EventTally {
                    campaign_id,
                    advertisement_id,
                    ad_title: titles.get(&advertisement_id).cloned().unwrap_or_default(),
                    impressions,
                    clicks,
                },
            )
            .collect())
    }

    async fn list_events(&self, user_id: i64) -> Result<Vec<AdEvent>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}

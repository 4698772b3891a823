//! Ad serving: uniform campaign selection and click resolution.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::Rng;
use tracing::{debug, error, info};

use crate::error::{Result, StoreError};
use crate::interfaces::LifecycleStore;
use crate::models::{AdEventType, NewAdEvent, ServedAd};
use crate::services::recorder::EventRecorder;

/// Draw one item uniformly at random.
pub fn sample_uniform<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    Some(items[rng.random_range(0..items.len())])
}

/// Picks a servable campaign and logs impressions and clicks.
#[derive(Clone)]
pub struct AdSelector {
    lifecycle: Arc<dyn LifecycleStore>,
    recorder: EventRecorder,
}

impl AdSelector {
    pub fn new(lifecycle: Arc<dyn LifecycleStore>, recorder: EventRecorder) -> Self {
        Self {
            lifecycle,
            recorder,
        }
    }

    /// Serve a campaign eligible today (UTC).
    pub async fn select_active_campaign(&self) -> Result<ServedAd> {
        self.select_for_day(Utc::now().date_naive()).await
    }

    /// Serve a campaign eligible on `day` and record an impression for it.
    ///
    /// A drawn campaign is re-checked after it is fetched; one that left
    /// the eligible set in between is discarded and another is drawn.
    pub async fn select_for_day(&self, day: NaiveDate) -> Result<ServedAd> {
        let mut candidates = self.lifecycle.servable_campaign_ids(day).await?;
        debug!(%day, candidates = candidates.len(), "selecting campaign");

        loop {
            let Some(campaign_id) = sample_uniform(&candidates, &mut rand::rng()) else {
                return Err(StoreError::NotFoundBy {
                    entity: "active campaign",
                    key: day.to_string(),
                });
            };

            let campaign = match self.lifecycle.get_campaign(campaign_id).await {
                Ok(c) if c.status.is_servable() && c.covers(day) => c,
                Ok(_) | Err(StoreError::NotFound { .. }) => {
                    candidates.retain(|id| *id != campaign_id);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let advertisement = match self
                .lifecycle
                .get_advertisement(campaign.advertisement_id)
                .await
            {
                Ok(ad) => ad,
                Err(StoreError::NotFound { .. }) => {
                    error!(
                        campaign_id,
                        advertisement_id = campaign.advertisement_id,
                        "campaign references a missing advertisement"
                    );
                    return Err(StoreError::Integrity(format!(
                        "campaign {campaign_id} references missing advertisement {}",
                        campaign.advertisement_id
                    )));
                }
                Err(e) => return Err(e),
            };

            self.recorder
                .record(&NewAdEvent::for_campaign(AdEventType::Impression, &campaign))
                .await;

            info!(campaign_id, advertisement_id = advertisement.id, "served campaign");
            return Ok(ServedAd {
                campaign,
                advertisement,
            });
        }
    }

    /// Record a click and return the creative's target URL.
    pub async fn record_click(&self, campaign_id: i64, advertisement_id: i64) -> Result<String> {
        let campaign = self.lifecycle.get_campaign(campaign_id).await?;
        let advertisement = self.lifecycle.get_advertisement(advertisement_id).await?;

        if campaign.advertisement_id != advertisement.id {
            return Err(StoreError::invalid(format!(
                "advertisement {advertisement_id} does not belong to campaign {campaign_id}"
            )));
        }

        self.recorder
            .record(&NewAdEvent::for_campaign(AdEventType::Click, &campaign))
            .await;

        if advertisement.target_url.trim().is_empty() {
            error!(advertisement_id, "advertisement has no target url");
            return Err(StoreError::Integrity(format!(
                "advertisement {advertisement_id} has no target url"
            )));
        }

        debug!(campaign_id, advertisement_id, "click recorded");
        Ok(advertisement.target_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn test_sample_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sample_uniform::<i64, _>(&[], &mut rng), None);
    }

    #[test]
    fn test_sample_single() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(sample_uniform(&[42], &mut rng), Some(42));
        }
    }

    #[test]
    fn test_sample_covers_all_items_roughly_evenly() {
        let mut rng = StdRng::seed_from_u64(20260501);
        let items = [1, 2, 3, 4];
        let mut counts: HashMap<i32, usize> = HashMap::new();
        for _ in 0..4000 {
            let pick = sample_uniform(&items, &mut rng).unwrap();
            *counts.entry(pick).or_default() += 1;
        }
        assert_eq!(counts.len(), 4);
        for count in counts.values() {
            assert!((800..1200).contains(count), "skewed draw: {counts:?}");
        }
    }
}

//! Per-campaign performance summaries.

use std::sync::Arc;

use crate::error::Result;
use crate::filter::PerformanceFilter;
use crate::interfaces::EventLog;
use crate::models::PerformanceSummary;

/// Click-through rate as a percentage rounded to two decimals.
///
/// Zero when there were no impressions.
pub fn click_through_rate(impressions: i64, clicks: i64) -> f64 {
    if impressions <= 0 {
        return 0.0;
    }
    (clicks as f64 * 10_000.0 / impressions as f64).round() / 100.0
}

/// Aggregates logged events into per-(campaign, creative) summaries.
#[derive(Clone)]
pub struct PerformanceAggregator {
    events: Arc<dyn EventLog>,
}

impl PerformanceAggregator {
    pub fn new(events: Arc<dyn EventLog>) -> Self {
        Self { events }
    }

    /// Summaries for the user's campaigns, ordered by campaign then creative.
    pub async fn summary(
        &self,
        user_id: i64,
        filter: &PerformanceFilter,
    ) -> Result<Vec<PerformanceSummary>> {
        let tallies = self.events.tally(user_id, filter).await?;
        Ok(tallies
            .into_iter()
            .map(|t| PerformanceSummary {
                ctr: click_through_rate(t.impressions, t.clicks),
                campaign_id: t.campaign_id,
                advertisement_id: t.advertisement_id,
                ad_title: t.ad_title,
                impressions: t.impressions,
                clicks: t.clicks,
            })
            .collect())
    }
}

//! Lifecycle interface: advertisement creatives and campaigns.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::filter::CampaignFilter;
use crate::models::{
    Advertisement, Campaign, CampaignWithCreative, NewAdvertisement, NewCampaign, ReviewDecision,
};

/// Interface for creative and campaign state.
#[async_trait]
pub trait LifecycleStore: Send + Sync {
    /// Submit a creative. It starts `Pending`.
    async fn create_advertisement(&self, owner_user_id: i64, ad: &NewAdvertisement)
        -> Result<i64>;

    async fn get_advertisement(&self, advertisement_id: i64) -> Result<Advertisement>;

    /// The owner's creatives, newest first.
    async fn list_advertisements(&self, owner_user_id: i64) -> Result<Vec<Advertisement>>;

    /// Creatives awaiting review, oldest first.
    async fn list_pending_advertisements(&self) -> Result<Vec<Advertisement>>;

    /// Administrative review of a creative.
    async fn review_advertisement(
        &self,
        advertisement_id: i64,
        decision: ReviewDecision,
    ) -> Result<()>;

    /// Request a campaign for an approved creative owned by the requester.
    async fn create_campaign(&self, owner_user_id: i64, campaign: &NewCampaign) -> Result<i64>;

    async fn get_campaign(&self, campaign_id: i64) -> Result<Campaign>;

    /// A campaign with its creative summary, visible only to its owner.
    async fn get_campaign_for_owner(
        &self,
        campaign_id: i64,
        owner_user_id: i64,
    ) -> Result<CampaignWithCreative>;

    /// The owner's campaigns matching `filter`, newest first.
    async fn list_campaigns(
        &self,
        owner_user_id: i64,
        filter: &CampaignFilter,
    ) -> Result<Vec<CampaignWithCreative>>;

    /// Campaigns awaiting review, oldest first.
    async fn list_pending_campaigns(&self) -> Result<Vec<Campaign>>;

    /// Administrative review of a campaign.
    async fn review_campaign(&self, campaign_id: i64, decision: ReviewDecision) -> Result<()>;

    /// Owner cancellation. Missing id, foreign owner and non-cancellable
    /// state are all reported as not found.
    async fn cancel_campaign(&self, campaign_id: i64, owner_user_id: i64) -> Result<()>;

    /// Ids of campaigns eligible for delivery on `day`.
    async fn servable_campaign_ids(&self, day: NaiveDate) -> Result<Vec<i64>>;
}

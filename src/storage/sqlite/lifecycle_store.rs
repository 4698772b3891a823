//! SQLite LifecycleStore implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_query::{Alias, Condition, Expr, Order, Query, SelectStatement, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::config::TransitionPolicy;
use crate::error::{Result, StoreError};
use crate::filter::{CampaignFilter, Field, ToPredicates};
use crate::interfaces::LifecycleStore;
use crate::models::{
    AdStatus, Advertisement, Campaign, CampaignStatus, CampaignWithCreative, NewAdvertisement,
    NewCampaign, ReviewDecision,
};
use crate::storage::helpers::{
    format_date, now_timestamp, parse_date, parse_status, parse_timestamp, require_text,
    to_condition,
};
use crate::storage::schema::{AdCampaigns, Advertisements};

/// SQLite implementation of LifecycleStore.
pub struct SqliteLifecycleStore {
    pool: SqlitePool,
    policy: TransitionPolicy,
}

impl SqliteLifecycleStore {
    /// Create a new SQLite lifecycle store.
    pub fn new(pool: SqlitePool, policy: TransitionPolicy) -> Self {
        Self { pool, policy }
    }

    fn select_advertisements() -> SelectStatement {
        Query::select()
            .columns([
                Advertisements::Id,
                Advertisements::Title,
                Advertisements::ImageUrl,
                Advertisements::TargetUrl,
                Advertisements::UserId,
                Advertisements::Status,
            ])
            .from(Advertisements::Table)
            .to_owned()
    }

    fn advertisement_from_row(row: &SqliteRow) -> Result<Advertisement> {
        let status: String = row.try_get("status")?;
        Ok(Advertisement {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            image_url: row.try_get("image_url")?,
            target_url: row.try_get("target_url")?,
            owner_user_id: row.try_get("user_id")?,
            status: parse_status(&status)?,
        })
    }

    const CAMPAIGN_COLUMNS: [AdCampaigns; 8] = [
        AdCampaigns::Id,
        AdCampaigns::AdvertisementId,
        AdCampaigns::UserId,
        AdCampaigns::StartDate,
        AdCampaigns::EndDate,
        AdCampaigns::Status,
        AdCampaigns::CreatedAt,
        AdCampaigns::UpdatedAt,
    ];

    fn select_campaigns() -> SelectStatement {
        Query::select()
            .columns(Self::CAMPAIGN_COLUMNS)
            .from(AdCampaigns::Table)
            .to_owned()
    }

    /// Campaign columns joined with the creative's title and image.
    fn select_campaigns_with_creative() -> SelectStatement {
        Query::select()
            .columns(
                Self::CAMPAIGN_COLUMNS
                    .into_iter()
                    .map(|col| (AdCampaigns::Table, col)),
            )
            .expr_as(
                Expr::col((Advertisements::Table, Advertisements::Title)),
                Alias::new("ad_title"),
            )
            .expr_as(
                Expr::col((Advertisements::Table, Advertisements::ImageUrl)),
                Alias::new("ad_image_url"),
            )
            .from(AdCampaigns::Table)
            .inner_join(
                Advertisements::Table,
                Expr::col((Advertisements::Table, Advertisements::Id))
                    .equals((AdCampaigns::Table, AdCampaigns::AdvertisementId)),
            )
            .to_owned()
    }

    fn campaign_from_row(row: &SqliteRow) -> Result<Campaign> {
        let start_date: String = row.try_get("start_date")?;
        let end_date: String = row.try_get("end_date")?;
        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;
        Ok(Campaign {
            id: row.try_get("id")?,
            advertisement_id: row.try_get("advertisement_id")?,
            owner_user_id: row.try_get("user_id")?,
            start_date: parse_date(&start_date)?,
            end_date: parse_date(&end_date)?,
            status: parse_status(&status)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    fn campaign_with_creative_from_row(row: &SqliteRow) -> Result<CampaignWithCreative> {
        Ok(CampaignWithCreative {
            campaign: Self::campaign_from_row(row)?,
            ad_title: row.try_get("ad_title")?,
            ad_image_url: row.try_get("ad_image_url")?,
        })
    }

    fn campaign_column(field: Field) -> Option<Expr> {
        match field {
            Field::Status => Some(Expr::col((AdCampaigns::Table, AdCampaigns::Status))),
            Field::StartDate => Some(Expr::col((AdCampaigns::Table, AdCampaigns::StartDate))),
            Field::EndDate => Some(Expr::col((AdCampaigns::Table, AdCampaigns::EndDate))),
            _ => None,
        }
    }

    /// Work out why a campaign insert matched no creative.
    async fn rejected_campaign_reason(
        &self,
        owner_user_id: i64,
        advertisement_id: i64,
    ) -> StoreError {
        match self.get_advertisement(advertisement_id).await {
            Ok(ad) if ad.owner_user_id != owner_user_id => StoreError::Forbidden(format!(
                "advertisement {advertisement_id} is not owned by user {owner_user_id}"
            )),
            Ok(ad) => StoreError::invalid(format!(
                "advertisement {advertisement_id} is {}, not Approved",
                ad.status
            )),
            Err(StoreError::NotFound { .. }) => StoreError::invalid(format!(
                "advertisement {advertisement_id} does not exist"
            )),
            Err(e) => e,
        }
    }

    /// Status update of one campaign, guarded by `condition`.
    fn campaign_status_update(
        campaign_id: i64,
        status: CampaignStatus,
        condition: Condition,
    ) -> String {
        Query::update()
            .table(AdCampaigns::Table)
            .value(AdCampaigns::Status, status.as_str())
            .value(AdCampaigns::UpdatedAt, now_timestamp())
            .cond_where(condition.add(Expr::col(AdCampaigns::Id).eq(campaign_id)))
            .to_string(SqliteQueryBuilder)
    }
}

#[async_trait]
impl LifecycleStore for SqliteLifecycleStore {
    async fn create_advertisement(
        &self,
        owner_user_id: i64,
        ad: &NewAdvertisement,
    ) -> Result<i64> {
        require_text("title", &ad.title)?;
        require_text("image url", &ad.image_url)?;
        require_text("target url", &ad.target_url)?;

        let query = Query::insert()
            .into_table(Advertisements::Table)
            .columns([
                Advertisements::Title,
                Advertisements::ImageUrl,
                Advertisements::TargetUrl,
                Advertisements::UserId,
                Advertisements::Status,
            ])
            .values_panic([
                ad.title.trim().into(),
                ad.image_url.trim().into(),
                ad.target_url.trim().into(),
                owner_user_id.into(),
                AdStatus::Pending.as_str().into(),
            ])
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        let advertisement_id = result.last_insert_rowid();

        info!(owner_user_id, advertisement_id, "advertisement submitted");
        Ok(advertisement_id)
    }

    async fn get_advertisement(&self, advertisement_id: i64) -> Result<Advertisement> {
        let query = Self::select_advertisements()
            .and_where(Expr::col(Advertisements::Id).eq(advertisement_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => Self::advertisement_from_row(&row),
            None => Err(StoreError::NotFound {
                entity: "advertisement",
                id: advertisement_id,
            }),
        }
    }

    async fn list_advertisements(&self, owner_user_id: i64) -> Result<Vec<Advertisement>> {
        let query = Self::select_advertisements()
            .and_where(Expr::col(Advertisements::UserId).eq(owner_user_id))
            .order_by(Advertisements::Id, Order::Desc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(Self::advertisement_from_row).collect()
    }

    async fn list_pending_advertisements(&self) -> Result<Vec<Advertisement>> {
        let query = Self::select_advertisements()
            .and_where(Expr::col(Advertisements::Status).eq(AdStatus::Pending.as_str()))
            .order_by(Advertisements::Id, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(Self::advertisement_from_row).collect()
    }

    async fn review_advertisement(
        &self,
        advertisement_id: i64,
        decision: ReviewDecision,
    ) -> Result<()> {
        let status = AdStatus::from(decision);
        let query = {
            let mut update = Query::update()
                .table(Advertisements::Table)
                .value(Advertisements::Status, status.as_str())
                .and_where(Expr::col(Advertisements::Id).eq(advertisement_id))
                .to_owned();
            if self.policy.review_requires_pending {
                update
                    .and_where(Expr::col(Advertisements::Status).eq(AdStatus::Pending.as_str()));
            }
            update.to_string(SqliteQueryBuilder)
        };

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "advertisement",
                id: advertisement_id,
            });
        }

        info!(advertisement_id, status = %status, "advertisement reviewed");
        Ok(())
    }

    async fn create_campaign(&self, owner_user_id: i64, campaign: &NewCampaign) -> Result<i64> {
        if campaign.end_date < campaign.start_date {
            return Err(StoreError::invalid(format!(
                "end date {} is before start date {}",
                campaign.end_date, campaign.start_date
            )));
        }

        // The creative checks live in the WHERE clause so a concurrent
        // review cannot slip in between check and insert.
        let query = {
            let now = now_timestamp();
            let source = Query::select()
                .column(Advertisements::Id)
                .column(Advertisements::UserId)
                .expr(Expr::val(format_date(campaign.start_date)))
                .expr(Expr::val(format_date(campaign.end_date)))
                .expr(Expr::val(CampaignStatus::Pending.as_str()))
                .expr(Expr::val(now.clone()))
                .expr(Expr::val(now))
                .from(Advertisements::Table)
                .and_where(Expr::col(Advertisements::Id).eq(campaign.advertisement_id))
                .and_where(Expr::col(Advertisements::UserId).eq(owner_user_id))
                .and_where(Expr::col(Advertisements::Status).eq(AdStatus::Approved.as_str()))
                .to_owned();

            let mut insert = Query::insert();
            insert.into_table(AdCampaigns::Table).columns([
                AdCampaigns::AdvertisementId,
                AdCampaigns::UserId,
                AdCampaigns::StartDate,
                AdCampaigns::EndDate,
                AdCampaigns::Status,
                AdCampaigns::CreatedAt,
                AdCampaigns::UpdatedAt,
            ]);
            insert
                .select_from(source)
                .map_err(|e| StoreError::Integrity(format!("campaign insert: {e}")))?;
            insert.to_string(SqliteQueryBuilder)
        };

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(self
                .rejected_campaign_reason(owner_user_id, campaign.advertisement_id)
                .await);
        }
        let campaign_id = result.last_insert_rowid();

        info!(
            owner_user_id,
            campaign_id,
            advertisement_id = campaign.advertisement_id,
            "campaign requested"
        );
        Ok(campaign_id)
    }

    async fn get_campaign(&self, campaign_id: i64) -> Result<Campaign> {
        let query = Self::select_campaigns()
            .and_where(Expr::col(AdCampaigns::Id).eq(campaign_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => Self::campaign_from_row(&row),
            None => Err(StoreError::NotFound {
                entity: "campaign",
                id: campaign_id,
            }),
        }
    }

    async fn get_campaign_for_owner(
        &self,
        campaign_id: i64,
        owner_user_id: i64,
    ) -> Result<CampaignWithCreative> {
        let query = Self::select_campaigns_with_creative()
            .and_where(Expr::col((AdCampaigns::Table, AdCampaigns::Id)).eq(campaign_id))
            .and_where(Expr::col((AdCampaigns::Table, AdCampaigns::UserId)).eq(owner_user_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => Self::campaign_with_creative_from_row(&row),
            None => Err(StoreError::NotFound {
                entity: "campaign",
                id: campaign_id,
            }),
        }
    }

    async fn list_campaigns(
        &self,
        owner_user_id: i64,
        filter: &CampaignFilter,
    ) -> Result<Vec<CampaignWithCreative>> {
        let condition = to_condition(&filter.predicates(), Self::campaign_column)?
            .add(Expr::col((AdCampaigns::Table, AdCampaigns::UserId)).eq(owner_user_id));
        let query = Self::select_campaigns_with_creative()
            .cond_where(condition)
            .order_by((AdCampaigns::Table, AdCampaigns::CreatedAt), Order::Desc)
            .order_by((AdCampaigns::Table, AdCampaigns::Id), Order::Desc)
            .to_string(SqliteQueryBuilder);
        debug!(%query, "list campaigns");

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter()
            .map(Self::campaign_with_creative_from_row)
            .collect()
    }

    async fn list_pending_campaigns(&self) -> Result<Vec<Campaign>> {
        let query = Self::select_campaigns()
            .and_where(Expr::col(AdCampaigns::Status).eq(CampaignStatus::Pending.as_str()))
            .order_by(AdCampaigns::CreatedAt, Order::Asc)
            .order_by(AdCampaigns::Id, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(Self::campaign_from_row).collect()
    }

    async fn review_campaign(&self, campaign_id: i64, decision: ReviewDecision) -> Result<()> {
        let status = CampaignStatus::from(decision);
        let query = {
            let mut condition = Condition::all();
            if self.policy.review_requires_pending {
                condition = condition
                    .add(Expr::col(AdCampaigns::Status).eq(CampaignStatus::Pending.as_str()));
            }
            Self::campaign_status_update(campaign_id, status, condition)
        };

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "campaign",
                id: campaign_id,
            });
        }

        info!(campaign_id, status = %status, "campaign reviewed");
        Ok(())
    }

    async fn cancel_campaign(&self, campaign_id: i64, owner_user_id: i64) -> Result<()> {
        let query = Self::campaign_status_update(
            campaign_id,
            CampaignStatus::Cancelled,
            Condition::all()
                .add(Expr::col(AdCampaigns::UserId).eq(owner_user_id))
                .add(
                    Expr::col(AdCampaigns::Status)
                        .is_in(CampaignStatus::CANCELLABLE.iter().map(|s| s.as_str())),
                ),
        );

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "campaign",
                id: campaign_id,
            });
        }

        info!(campaign_id, owner_user_id, "campaign cancelled");
        Ok(())
    }

    async fn servable_campaign_ids(&self, day: NaiveDate) -> Result<Vec<i64>> {
        let day = format_date(day);
        let query = Query::select()
            .column(AdCampaigns::Id)
            .from(AdCampaigns::Table)
            .and_where(
                Expr::col(AdCampaigns::Status)
                    .is_in(CampaignStatus::SERVABLE.iter().map(|s| s.as_str())),
            )
            .and_where(Expr::col(AdCampaigns::StartDate).lte(day.clone()))
            .and_where(Expr::col(AdCampaigns::EndDate).gte(day))
            .order_by(AdCampaigns::Id, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<i64, _>("id").map_err(StoreError::from))
            .collect()
    }
}

//! SQLite EventLog implementation.

use async_trait::async_trait;
use sea_query::{Alias, Expr, Func, Order, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::Result;
use crate::filter::{Field, PerformanceFilter, ToPredicates};
use crate::interfaces::EventLog;
use crate::models::{AdEvent, AdEventType, EventTally, NewAdEvent};
use crate::storage::helpers::{format_timestamp, parse_status, parse_timestamp, to_condition};
use crate::storage::schema::{AdEvents, Advertisements};

/// SQLite implementation of EventLog.
pub struct SqliteEventLog {
    pool: SqlitePool,
}

impl SqliteEventLog {
    /// Create a new SQLite event log.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn from_row(row: &SqliteRow) -> Result<AdEvent> {
        let event_type: String = row.try_get("event_type")?;
        let timestamp: String = row.try_get("event_timestamp")?;
        Ok(AdEvent {
            id: row.try_get("id")?,
            event_type: parse_status(&event_type)?,
            advertisement_id: row.try_get("advertisement_id")?,
            campaign_id: row.try_get("campaign_id")?,
            user_id: row.try_get("user_id")?,
            timestamp: parse_timestamp(&timestamp)?,
        })
    }

    fn column(field: Field) -> Option<Expr> {
        match field {
            Field::Timestamp => Some(Expr::col((AdEvents::Table, AdEvents::EventTimestamp))),
            Field::CampaignId => Some(Expr::col((AdEvents::Table, AdEvents::CampaignId))),
            _ => None,
        }
    }

    /// `SUM(CASE WHEN event_type = <kind> THEN 1 ELSE 0 END)`
    fn count_of(kind: AdEventType) -> sea_query::SimpleExpr {
        Func::sum(
            Expr::case(
                Expr::col((AdEvents::Table, AdEvents::EventType)).eq(kind.as_str()),
                1,
            )
            .finally(0),
        )
        .into()
    }
}

#[async_trait]
impl EventLog for SqliteEventLog {
    async fn append(&self, event: &NewAdEvent) -> Result<i64> {
        let query = Query::insert()
            .into_table(AdEvents::Table)
            .columns([
                AdEvents::EventType,
                AdEvents::AdvertisementId,
                AdEvents::CampaignId,
                AdEvents::UserId,
                AdEvents::EventTimestamp,
            ])
            .values_panic([
                event.event_type.as_str().into(),
                event.advertisement_id.into(),
                event.campaign_id.into(),
                event.user_id.into(),
                format_timestamp(event.timestamp).into(),
            ])
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        let event_id = result.last_insert_rowid();

        debug!(
            event_id,
            event_type = %event.event_type,
            campaign_id = event.campaign_id,
            "event appended"
        );
        Ok(event_id)
    }

    async fn tally(&self, user_id: i64, filter: &PerformanceFilter) -> Result<Vec<EventTally>> {
        let condition = to_condition(&filter.predicates(), Self::column)?
            .add(Expr::col((AdEvents::Table, AdEvents::UserId)).eq(user_id));
        let query = Query::select()
            .column((AdEvents::Table, AdEvents::CampaignId))
            .column((AdEvents::Table, AdEvents::AdvertisementId))
            .expr_as(
                Expr::col((Advertisements::Table, Advertisements::Title)),
                Alias::new("ad_title"),
            )
            .expr_as(Self::count_of(AdEventType::Impression), Alias::new("impressions"))
            .expr_as(Self::count_of(AdEventType::Click), Alias::new("clicks"))
            .from(AdEvents::Table)
            .inner_join(
                Advertisements::Table,
                Expr::col((Advertisements::Table, Advertisements::Id))
                    .equals((AdEvents::Table, AdEvents::AdvertisementId)),
            )
            .cond_where(condition)
            .group_by_col((AdEvents::Table, AdEvents::CampaignId))
            .group_by_col((AdEvents::Table, AdEvents::AdvertisementId))
            .group_by_col((Advertisements::Table, Advertisements::Title))
            .order_by((AdEvents::Table, AdEvents::CampaignId), Order::Asc)
            .order_by((AdEvents::Table, AdEvents::AdvertisementId), Order::Asc)
            .to_string(SqliteQueryBuilder);
        debug!(%query, "event tally");

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        let mut tallies = Vec::with_capacity(rows.len());
        for row in &rows {
            tallies.push(EventTally {
                campaign_id: row.try_get("campaign_id")?,
                advertisement_id: row.try_get("advertisement_id")?,
                ad_title: row.try_get("ad_title")?,
                impressions: row.try_get("impressions")?,
                clicks: row.try_get("clicks")?,
            });
        }
        Ok(tallies)
    }

    async fn list_events(&self, user_id: i64) -> Result<Vec<AdEvent>> {
        let query = Query::select()
            .columns([
                AdEvents::Id,
                AdEvents::EventType,
                AdEvents::AdvertisementId,
                AdEvents::CampaignId,
                AdEvents::UserId,
                AdEvents::EventTimestamp,
            ])
            .from(AdEvents::Table)
            .and_where(Expr::col(AdEvents::UserId).eq(user_id))
            .order_by(AdEvents::EventTimestamp, Order::Asc)
            .order_by(AdEvents::Id, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(Self::from_row).collect()
    }
}

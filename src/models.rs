//! Domain entities and their lifecycle states.
//!
//! Status columns are closed enumerations; the string forms are only used at
//! the storage boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when a stored status string is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status: {value}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal, { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Canonical stored form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    other => Err(UnknownStatus {
                        kind: $label,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

status_enum!(
    /// Account role. Admins act as reviewers.
    Role, "role", { User, Admin }
);

status_enum!(
    /// Review state of an advertisement creative.
    AdStatus, "advertisement", { Pending, Approved, Rejected }
);

status_enum!(
    /// Campaign lifecycle state.
    CampaignStatus, "campaign", { Pending, Approved, Rejected, Cancelled, Active, Completed }
);

status_enum!(
    /// Recharge transaction state. Leaves `Pending` at most once.
    RechargeStatus, "recharge", { Pending, Success, Failed }
);

status_enum!(
    /// Analytics event type.
    AdEventType, "event", { Impression, Click }
);

status_enum!(
    /// Invoice request processing state.
    InvoiceStatus, "invoice", { Pending, Issued, Rejected }
);

status_enum!(
    /// Outcome an administrative reviewer may assign to a creative or campaign.
    ReviewDecision, "review", { Approved, Rejected }
);

impl CampaignStatus {
    /// States from which a campaign may be selected for delivery.
    pub const SERVABLE: [CampaignStatus; 2] = [CampaignStatus::Approved, CampaignStatus::Active];

    /// States from which the owner may cancel.
    pub const CANCELLABLE: [CampaignStatus; 2] =
        [CampaignStatus::Pending, CampaignStatus::Approved];

    pub fn is_servable(&self) -> bool {
        Self::SERVABLE.contains(self)
    }

    pub fn is_cancellable(&self) -> bool {
        Self::CANCELLABLE.contains(self)
    }
}

impl From<ReviewDecision> for AdStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => AdStatus::Approved,
            ReviewDecision::Rejected => AdStatus::Rejected,
        }
    }
}

impl From<ReviewDecision> for CampaignStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => CampaignStatus::Approved,
            ReviewDecision::Rejected => CampaignStatus::Rejected,
        }
    }
}

/// Marketplace account. Balance is in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub balance: i64,
}

/// Advertisement creative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub target_url: String,
    pub owner_user_id: i64,
    pub status: AdStatus,
}

/// Creative submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdvertisement {
    pub title: String,
    pub image_url: String,
    pub target_url: String,
}

/// Scheduled deployment of a creative over an inclusive date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub advertisement_id: i64,
    pub owner_user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Whether `day` lies inside the campaign's [start, end] window.
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

/// Campaign request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub advertisement_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Campaign listing row with a summary of its creative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignWithCreative {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub ad_title: String,
    pub ad_image_url: String,
}

/// Money movement intent and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RechargeTransaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub status: RechargeStatus,
    pub external_reference: Option<String>,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable analytics event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdEvent {
    pub id: i64,
    pub event_type: AdEventType,
    pub advertisement_id: i64,
    pub campaign_id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
}

/// Event to append. `user_id` is the campaign owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdEvent {
    pub event_type: AdEventType,
    pub advertisement_id: i64,
    pub campaign_id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
}

impl NewAdEvent {
    /// Build an event for `campaign` stamped with the current time.
    pub fn for_campaign(event_type: AdEventType, campaign: &Campaign) -> Self {
        Self {
            event_type,
            advertisement_id: campaign.advertisement_id,
            campaign_id: campaign.id,
            user_id: campaign.owner_user_id,
            timestamp: Utc::now(),
        }
    }
}

/// Raw per-(campaign, creative) event counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTally {
    pub campaign_id: i64,
    pub advertisement_id: i64,
    pub ad_title: String,
    pub impressions: i64,
    pub clicks: i64,
}

/// Performance row returned to campaign owners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub campaign_id: i64,
    pub advertisement_id: i64,
    pub ad_title: String,
    pub impressions: i64,
    pub clicks: i64,
    /// Click-through rate in percent, two decimal places.
    pub ctr: f64,
}

/// Creative chosen for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedAd {
    pub campaign: Campaign,
    pub advertisement: Advertisement,
}

/// Billing request with a total fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub id: i64,
    pub user_id: i64,
    pub status: InvoiceStatus,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_amount: i64,
    pub billing_title: String,
    pub tax_id: Option<String>,
    pub billing_address: String,
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Invoice submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoiceRequest {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub billing_title: String,
    pub billing_address: String,
    pub tax_id: Option<String>,
}

/// Administrative processing outcome for an invoice request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDecision {
    pub status: InvoiceStatus,
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [
            CampaignStatus::Pending,
            CampaignStatus::Approved,
            CampaignStatus::Rejected,
            CampaignStatus::Cancelled,
            CampaignStatus::Active,
            CampaignStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<CampaignStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = "success".parse::<RechargeStatus>().unwrap_err();
        assert_eq!(err.kind, "recharge");
        assert_eq!(err.value, "success");
    }

    #[test]
    fn test_servable_and_cancellable_sets() {
        assert!(CampaignStatus::Approved.is_servable());
        assert!(CampaignStatus::Active.is_servable());
        assert!(!CampaignStatus::Pending.is_servable());
        assert!(!CampaignStatus::Cancelled.is_servable());

        assert!(CampaignStatus::Pending.is_cancellable());
        assert!(CampaignStatus::Approved.is_cancellable());
        assert!(!CampaignStatus::Active.is_cancellable());
        assert!(!CampaignStatus::Rejected.is_cancellable());
    }

    #[test]
    fn test_review_decision_maps_to_entity_status() {
        assert_eq!(AdStatus::from(ReviewDecision::Rejected), AdStatus::Rejected);
        assert_eq!(
            CampaignStatus::from(ReviewDecision::Approved),
            CampaignStatus::Approved
        );
    }

    #[test]
    fn test_campaign_window_is_inclusive() {
        let day = |d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap();
        let now = Utc::now();
        let campaign = Campaign {
            id: 1,
            advertisement_id: 1,
            owner_user_id: 1,
            start_date: day(10),
            end_date: day(12),
            status: CampaignStatus::Approved,
            created_at: now,
            updated_at: now,
        };
        assert!(!campaign.covers(day(9)));
        assert!(campaign.covers(day(10)));
        assert!(campaign.covers(day(12)));
        assert!(!campaign.covers(day(13)));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 3,
            username: "alice".into(),
            password_hash: "secret-hash".into(),
            role: Role::User,
            balance: 0,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"role\":\"User\""));
    }
}

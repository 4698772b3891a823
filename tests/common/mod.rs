//! Shared fixtures for integration tests.
//!
//! Each fixture owns a fresh file-backed SQLite database in a temp dir.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use tempfile::TempDir;

use adledger::config::{Config, EventDeliveryConfig, StorageConfig, TransitionPolicy};
use adledger::interfaces::EventLog;
use adledger::models::{NewAdvertisement, NewCampaign, ReviewDecision, Role};
use adledger::storage::{connect, init_schema, Stores};
use adledger::AdMarket;

pub const TARGET_URL: &str = "https://shop.example.com/spring";

/// Market plus the directory holding its database.
pub struct Fixture {
    pub market: AdMarket,
    pub config: Config,
    _dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> Config {
    let path = dir.path().join("adledger.db");
    Config {
        storage: StorageConfig::at(path.to_string_lossy()),
        events: EventDeliveryConfig {
            max_attempts: 3,
            min_delay_ms: 1,
            max_delay_ms: 5,
        },
        ..Config::default()
    }
}

pub async fn market() -> Fixture {
    market_with_policy(TransitionPolicy::default()).await
}

pub async fn market_with_policy(policy: TransitionPolicy) -> Fixture {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.policy = policy;
    let market = AdMarket::open(&config).await.unwrap();
    Fixture {
        market,
        config,
        _dir: dir,
    }
}

/// Market whose calls are cut off after `timeout_ms`.
pub async fn market_with_timeout(timeout_ms: u64) -> Fixture {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.operation_timeout_ms = Some(timeout_ms);
    let market = AdMarket::open(&config).await.unwrap();
    Fixture {
        market,
        config,
        _dir: dir,
    }
}

/// Market whose analytics events go to `events` instead of SQLite.
pub async fn market_with_event_log(events: Arc<dyn EventLog>) -> Fixture {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let pool = connect(&config.storage).await.unwrap();
    init_schema(&pool).await.unwrap();
    let stores = Stores::sqlite(pool, &config.policy).with_event_log(events);
    Fixture {
        market: AdMarket::from_stores(stores, &config),
        config,
        _dir: dir,
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn days_from_today(days: i64) -> NaiveDate {
    let today = today();
    if days >= 0 {
        today.checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs())).unwrap()
    }
}

pub async fn user(market: &AdMarket, name: &str) -> i64 {
    market.create_user(name, "argon2-hash").await.unwrap()
}

pub async fn admin(market: &AdMarket) -> i64 {
    let id = market.create_user("admin", "argon2-hash").await.unwrap();
    market.set_user_role(id, Role::Admin).await.unwrap();
    id
}

pub fn creative(title: &str) -> NewAdvertisement {
    NewAdvertisement {
        title: title.to_string(),
        image_url: format!("https://cdn.example.com/{title}.png"),
        target_url: TARGET_URL.to_string(),
    }
}

pub async fn approved_ad(market: &AdMarket, owner: i64, title: &str) -> i64 {
    let ad = market
        .create_advertisement(owner, &creative(title))
        .await
        .unwrap();
    market
        .review_advertisement(ad, ReviewDecision::Approved)
        .await
        .unwrap();
    ad
}

pub fn window(start: NaiveDate, end: NaiveDate, advertisement_id: i64) -> NewCampaign {
    NewCampaign {
        advertisement_id,
        start_date: start,
        end_date: end,
    }
}

/// Approved creative and campaign running over `[start, end]`.
pub async fn approved_campaign(
    market: &AdMarket,
    owner: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> (i64, i64) {
    let ad = approved_ad(market, owner, "spring").await;
    let campaign = market
        .create_campaign(owner, &window(start, end, ad))
        .await
        .unwrap();
    market
        .review_campaign(campaign, ReviewDecision::Approved)
        .await
        .unwrap();
    (ad, campaign)
}

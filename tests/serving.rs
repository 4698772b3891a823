//! Ad serving integration tests: eligibility, impressions and clicks.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use adledger::interfaces::EventLog;
use adledger::models::{AdEventType, ReviewDecision};
use adledger::storage::MockEventLog;
use adledger::ErrorKind;
use common::{
    approved_ad, approved_campaign, days_from_today, market, market_with_event_log, today, user,
    window, TARGET_URL,
};

#[tokio::test]
async fn test_nothing_to_serve_is_not_found() {
    let fx = market().await;
    let err = fx.market.select_active_campaign().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_serves_current_approved_campaign_and_logs_impression() {
    let fx = market().await;
    let alice = user(&fx.market, "alice").await;
    let (ad, campaign) =
        approved_campaign(&fx.market, alice, days_from_today(-1), days_from_today(1)).await;

    let served = fx.market.select_active_campaign().await.unwrap();
    assert_eq!(served.campaign.id, campaign);
    assert_eq!(served.advertisement.id, ad);

    let events = fx.market.stores().events.list_events(alice).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, AdEventType::Impression);
    assert_eq!(events[0].campaign_id, campaign);
    assert_eq!(events[0].advertisement_id, ad);
}

#[tokio::test]
async fn test_ineligible_campaigns_are_never_served() {
    let fx = market().await;
    let alice = user(&fx.market, "alice").await;
    let ad = approved_ad(&fx.market, alice, "spring").await;

    // Pending, window current.
    fx.market
        .create_campaign(alice, &window(today(), today(), ad))
        .await
        .unwrap();
    // Approved, window in the future.
    let future = fx
        .market
        .create_campaign(alice, &window(days_from_today(2), days_from_today(5), ad))
        .await
        .unwrap();
    fx.market
        .review_campaign(future, ReviewDecision::Approved)
        .await
        .unwrap();
    // Approved, window over.
    let past = fx
        .market
        .create_campaign(alice, &window(days_from_today(-5), days_from_today(-1), ad))
        .await
        .unwrap();
    fx.market
        .review_campaign(past, ReviewDecision::Approved)
        .await
        .unwrap();
    // Approved then cancelled.
    let cancelled = fx
        .market
        .create_campaign(alice, &window(today(), today(), ad))
        .await
        .unwrap();
    fx.market
        .review_campaign(cancelled, ReviewDecision::Approved)
        .await
        .unwrap();
    fx.market.cancel_campaign(cancelled, alice).await.unwrap();

    let err = fx.market.select_active_campaign().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let served = fx.market.select_for_day(days_from_today(3)).await.unwrap();
    assert_eq!(served.campaign.id, future);
}

#[tokio::test]
async fn test_window_bounds_are_inclusive() {
    let fx = market().await;
    let alice = user(&fx.market, "alice").await;
    let (_, campaign) =
        approved_campaign(&fx.market, alice, days_from_today(1), days_from_today(2)).await;

    assert!(fx.market.select_for_day(today()).await.is_err());
    for day in [days_from_today(1), days_from_today(2)] {
        let served = fx.market.select_for_day(day).await.unwrap();
        assert_eq!(served.campaign.id, campaign);
    }
    assert!(fx.market.select_for_day(days_from_today(3)).await.is_err());
}

#[tokio::test]
async fn test_selection_reaches_every_eligible_campaign() {
    let fx = market().await;
    let alice = user(&fx.market, "alice").await;
    let ad = approved_ad(&fx.market, alice, "spring").await;

    let mut expected = HashSet::new();
    for _ in 0..3 {
        let campaign = fx
            .market
            .create_campaign(alice, &window(today(), today(), ad))
            .await
            .unwrap();
        fx.market
            .review_campaign(campaign, ReviewDecision::Approved)
            .await
            .unwrap();
        expected.insert(campaign);
    }

    let mut seen = HashSet::new();
    for _ in 0..200 {
        let served = fx.market.select_active_campaign().await.unwrap();
        assert!(expected.contains(&served.campaign.id));
        seen.insert(served.campaign.id);
    }
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_click_returns_target_and_logs() {
    let fx = market().await;
    let alice = user(&fx.market, "alice").await;
    let (ad, campaign) = approved_campaign(&fx.market, alice, today(), today()).await;

    let target = fx.market.record_click(campaign, ad).await.unwrap();
    assert_eq!(target, TARGET_URL);

    let events = fx.market.stores().events.list_events(alice).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, AdEventType::Click);
}

#[tokio::test]
async fn test_click_validation() {
    let fx = market().await;
    let alice = user(&fx.market, "alice").await;
    let (ad, campaign) = approved_campaign(&fx.market, alice, today(), today()).await;
    let other_ad = approved_ad(&fx.market, alice, "autumn").await;

    assert_eq!(
        fx.market
            .record_click(campaign + 100, ad)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        fx.market
            .record_click(campaign, ad + 100)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        fx.market
            .record_click(campaign, other_ad)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidInput
    );
    assert!(fx
        .market
        .stores()
        .events
        .list_events(alice)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_event_log_failure_does_not_fail_serving() {
    let log = Arc::new(MockEventLog::new());
    log.set_fail_on_append(true).await;
    let fx = market_with_event_log(log.clone()).await;
    let alice = user(&fx.market, "alice").await;
    let (ad, campaign) = approved_campaign(&fx.market, alice, today(), today()).await;

    let served = fx.market.select_active_campaign().await.unwrap();
    assert_eq!(served.campaign.id, campaign);
    let target = fx.market.record_click(campaign, ad).await.unwrap();
    assert_eq!(target, TARGET_URL);

    assert_eq!(log.append_attempts(), 2 * fx.config.events.max_attempts);
    assert!(log.events().await.is_empty());
}

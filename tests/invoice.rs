//! Invoice calculator integration tests.

mod common;

use adledger::filter::InvoiceFilter;
use adledger::models::{InvoiceDecision, InvoiceStatus, NewInvoiceRequest};
use adledger::{ErrorKind, PaymentOutcome};
use common::{days_from_today, market, today, user};

fn request_for(start: chrono::NaiveDate, end: chrono::NaiveDate) -> NewInvoiceRequest {
    NewInvoiceRequest {
        period_start: start,
        period_end: end,
        billing_title: "Acme Ltd".to_string(),
        billing_address: "1 Market Street".to_string(),
        tax_id: Some("TAX-42".to_string()),
    }
}

async fn funded_user(market: &adledger::AdMarket, name: &str) -> i64 {
    let id = user(market, name).await;
    for major in [10.0, 20.0] {
        market
            .recharge(id, major, "card", PaymentOutcome::succeeded("PSP"))
            .await
            .unwrap();
    }
    market
        .recharge(id, 50.0, "card", PaymentOutcome::declined("declined"))
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn test_total_counts_only_successful_recharges() {
    let fx = market().await;
    let alice = funded_user(&fx.market, "alice").await;

    let total = fx
        .market
        .successful_recharge_total(alice, today(), today())
        .await
        .unwrap();
    assert_eq!(total, 3000);

    let yesterday = fx
        .market
        .successful_recharge_total(alice, days_from_today(-1), days_from_today(-1))
        .await
        .unwrap();
    assert_eq!(yesterday, 0);
}

#[tokio::test]
async fn test_invoice_request_snapshots_total() {
    let fx = market().await;
    let alice = funded_user(&fx.market, "alice").await;

    let invoice = fx
        .market
        .create_invoice_request(alice, &request_for(days_from_today(-30), today()))
        .await
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.total_amount, 3000);
    assert_eq!(invoice.tax_id.as_deref(), Some("TAX-42"));
    assert!(invoice.processed_at.is_none());

    // Later recharges do not change an existing request.
    fx.market
        .recharge(alice, 5.0, "card", PaymentOutcome::succeeded("PSP"))
        .await
        .unwrap();
    let stored = fx
        .market
        .get_invoice_request(invoice.id, alice)
        .await
        .unwrap();
    assert_eq!(stored.total_amount, 3000);
}

#[tokio::test]
async fn test_zero_total_is_rejected_and_not_persisted() {
    let fx = market().await;
    let bob = user(&fx.market, "bob").await;
    fx.market
        .recharge(bob, 50.0, "card", PaymentOutcome::declined("declined"))
        .await
        .unwrap();

    let err = fx
        .market
        .create_invoice_request(bob, &request_for(today(), today()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(fx
        .market
        .list_invoice_requests(bob, &InvoiceFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_invoice_request_validation() {
    let fx = market().await;
    let alice = funded_user(&fx.market, "alice").await;

    let reversed = request_for(today(), days_from_today(-1));
    assert_eq!(
        fx.market
            .create_invoice_request(alice, &reversed)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidInput
    );

    let untitled = NewInvoiceRequest {
        billing_title: " ".to_string(),
        ..request_for(today(), today())
    };
    assert_eq!(
        fx.market
            .create_invoice_request(alice, &untitled)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidInput
    );
}

#[tokio::test]
async fn test_invoice_visible_only_to_owner() {
    let fx = market().await;
    let alice = funded_user(&fx.market, "alice").await;
    let bob = user(&fx.market, "bob").await;
    let invoice = fx
        .market
        .create_invoice_request(alice, &request_for(today(), today()))
        .await
        .unwrap();

    let err = fx
        .market
        .get_invoice_request(invoice.id, bob)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(fx
        .market
        .list_invoice_requests(bob, &InvoiceFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_processing_invoice_request() {
    let fx = market().await;
    let alice = funded_user(&fx.market, "alice").await;
    let invoice = fx
        .market
        .create_invoice_request(alice, &request_for(today(), today()))
        .await
        .unwrap();

    let pending = InvoiceDecision {
        status: InvoiceStatus::Pending,
        invoice_number: None,
        notes: None,
    };
    assert_eq!(
        fx.market
            .process_invoice_request(invoice.id, &pending)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidInput
    );

    let issue = InvoiceDecision {
        status: InvoiceStatus::Issued,
        invoice_number: Some("INV-2026-0001".to_string()),
        notes: Some(String::new()),
    };
    assert_eq!(
        fx.market
            .process_invoice_request(invoice.id + 10, &issue)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );

    let issued = fx
        .market
        .process_invoice_request(invoice.id, &issue)
        .await
        .unwrap();
    assert_eq!(issued.status, InvoiceStatus::Issued);
    assert_eq!(issued.invoice_number.as_deref(), Some("INV-2026-0001"));
    assert_eq!(issued.notes, None);
    assert_eq!(issued.total_amount, 3000);
    assert!(issued.processed_at.is_some());

    let issued_only = InvoiceFilter {
        status: Some(InvoiceStatus::Issued),
        ..Default::default()
    };
    let listed = fx
        .market
        .list_invoice_requests(alice, &issued_only)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, invoice.id);
}

//! In-process facade over the marketplace stores.
//!
//! Every operation of the ledger, lifecycle, serving, performance and
//! invoicing components is reachable from one [`AdMarket`] handle. When an
//! operation timeout is configured, each call runs under that deadline; an
//! abandoned call rolls back whatever atomic unit it had open.
//!
//! # Example
//!
//! ```ignore
//! use adledger::config::Config;
//! use adledger::facade::{AdMarket, PaymentOutcome};
//!
//! let market = AdMarket::open(&Config::for_test()).await?;
//! let user_id = market.create_user("alice", "$argon2id$...").await?;
//! market
//!     .recharge(user_id, 10.50, "card", PaymentOutcome::succeeded("PSP-1"))
//!     .await?;
//! assert_eq!(market.get_balance(user_id).await?, 1050);
//! ```

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::warn;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::filter::{CampaignFilter, InvoiceFilter, PerformanceFilter, RechargeFilter};
use crate::models::{
    Advertisement, Campaign, CampaignWithCreative, InvoiceDecision, InvoiceRequest,
    NewAdvertisement, NewCampaign, NewInvoiceRequest, PerformanceSummary, RechargeTransaction,
    ReviewDecision, Role, ServedAd, User,
};
use crate::money::to_minor_units;
use crate::services::{AdSelector, EventRecorder, PerformanceAggregator};
use crate::storage::{init_storage, Stores};

/// Reference stored on a recharge whose completion failed.
pub const PROCESSING_ERROR: &str = "PROCESSING_ERROR";

/// What the payment collaborator reported for a recharge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded { external_reference: String },
    Declined { reason: String },
}

impl PaymentOutcome {
    pub fn succeeded(external_reference: impl Into<String>) -> Self {
        Self::Succeeded {
            external_reference: external_reference.into(),
        }
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        Self::Declined {
            reason: reason.into(),
        }
    }
}

/// Marketplace handle.
#[derive(Clone)]
pub struct AdMarket {
    stores: Stores,
    selector: AdSelector,
    performance: PerformanceAggregator,
    timeout: Option<Duration>,
}

impl AdMarket {
    /// Open storage from configuration and apply the schema.
    pub async fn open(config: &Config) -> Result<Self> {
        let stores = init_storage(&config.storage, &config.policy).await?;
        Ok(Self::from_stores(stores, config))
    }

    /// Build over already initialized stores.
    pub fn from_stores(stores: Stores, config: &Config) -> Self {
        let recorder = EventRecorder::new(stores.events.clone(), config.events.clone());
        Self {
            selector: AdSelector::new(stores.lifecycle.clone(), recorder),
            performance: PerformanceAggregator::new(stores.events.clone()),
            timeout: config.operation_timeout(),
            stores,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    async fn run<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| StoreError::DeadlineExceeded(limit))?,
            None => call.await,
        }
    }

    // Users

    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.run(self.stores.users.create_user(username, password_hash))
            .await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        self.run(self.stores.users.get_user(user_id)).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.run(self.stores.users.get_user_by_username(username))
            .await
    }

    pub async fn set_user_role(&self, user_id: i64, role: Role) -> Result<()> {
        self.run(self.stores.users.set_user_role(user_id, role)).await
    }

    // Ledger

    pub async fn open_recharge_intent(
        &self,
        user_id: i64,
        amount: i64,
        payment_method: &str,
    ) -> Result<i64> {
        self.run(
            self.stores
                .ledger
                .open_recharge_intent(user_id, amount, payment_method),
        )
        .await
    }

    pub async fn complete_recharge(
        &self,
        user_id: i64,
        amount: i64,
        transaction_id: i64,
        external_reference: &str,
    ) -> Result<()> {
        self.run(self.stores.ledger.complete_recharge(
            user_id,
            amount,
            transaction_id,
            external_reference,
        ))
        .await
    }

    pub async fn fail_recharge(&self, transaction_id: i64, reason: &str) -> Result<()> {
        self.run(self.stores.ledger.fail_recharge(transaction_id, reason))
            .await
    }

    pub async fn get_balance(&self, user_id: i64) -> Result<i64> {
        self.run(self.stores.ledger.get_balance(user_id)).await
    }

    pub async fn get_recharge(&self, transaction_id: i64) -> Result<RechargeTransaction> {
        self.run(self.stores.ledger.get_recharge(transaction_id))
            .await
    }

    pub async fn recharge_history(
        &self,
        user_id: i64,
        filter: &RechargeFilter,
    ) -> Result<Vec<RechargeTransaction>> {
        self.run(self.stores.ledger.recharge_history(user_id, filter))
            .await
    }

    /// Run a whole recharge: convert the major-unit amount, open the intent,
    /// then complete or fail it according to the payment outcome.
    ///
    /// If completion errors the transaction is marked failed with
    /// [`PROCESSING_ERROR`] and the completion error is returned.
    pub async fn recharge(
        &self,
        user_id: i64,
        major_amount: f64,
        payment_method: &str,
        outcome: PaymentOutcome,
    ) -> Result<RechargeTransaction> {
        let amount = to_minor_units(major_amount)?;
        let ledger = &self.stores.ledger;

        self.run(async {
            let transaction_id = ledger
                .open_recharge_intent(user_id, amount, payment_method)
                .await?;

            match outcome {
                PaymentOutcome::Succeeded { external_reference } => {
                    if let Err(e) = ledger
                        .complete_recharge(user_id, amount, transaction_id, &external_reference)
                        .await
                    {
                        if let Err(mark) =
                            ledger.fail_recharge(transaction_id, PROCESSING_ERROR).await
                        {
                            warn!(transaction_id, error = %mark, "could not mark recharge failed");
                        }
                        return Err(e);
                    }
                }
                PaymentOutcome::Declined { reason } => {
                    ledger.fail_recharge(transaction_id, &reason).await?;
                }
            }

            ledger.get_recharge(transaction_id).await
        })
        .await
    }

    // Lifecycle

    pub async fn create_advertisement(
        &self,
        owner_user_id: i64,
        ad: &NewAdvertisement,
    ) -> Result<i64> {
        self.run(self.stores.lifecycle.create_advertisement(owner_user_id, ad))
            .await
    }

    pub async fn get_advertisement(&self, advertisement_id: i64) -> Result<Advertisement> {
        self.run(self.stores.lifecycle.get_advertisement(advertisement_id))
            .await
    }

    pub async fn list_advertisements(&self, owner_user_id: i64) -> Result<Vec<Advertisement>> {
        self.run(self.stores.lifecycle.list_advertisements(owner_user_id))
            .await
    }

    pub async fn list_pending_advertisements(&self) -> Result<Vec<Advertisement>> {
        self.run(self.stores.lifecycle.list_pending_advertisements())
            .await
    }

    pub async fn review_advertisement(
        &self,
        advertisement_id: i64,
        decision: ReviewDecision,
    ) -> Result<()> {
        self.run(
            self.stores
                .lifecycle
                .review_advertisement(advertisement_id, decision),
        )
        .await
    }

    pub async fn create_campaign(&self, owner_user_id: i64, campaign: &NewCampaign) -> Result<i64> {
        self.run(self.stores.lifecycle.create_campaign(owner_user_id, campaign))
            .await
    }

    pub async fn get_campaign(&self, campaign_id: i64) -> Result<Campaign> {
        self.run(self.stores.lifecycle.get_campaign(campaign_id))
            .await
    }

    pub async fn get_campaign_for_owner(
        &self,
        campaign_id: i64,
        owner_user_id: i64,
    ) -> Result<CampaignWithCreative> {
        self.run(
            self.stores
                .lifecycle
                .get_campaign_for_owner(campaign_id, owner_user_id),
        )
        .await
    }

    pub async fn list_campaigns(
        &self,
        owner_user_id: i64,
        filter: &CampaignFilter,
    ) -> Result<Vec<CampaignWithCreative>> {
        self.run(self.stores.lifecycle.list_campaigns(owner_user_id, filter))
            .await
    }

    pub async fn list_pending_campaigns(&self) -> Result<Vec<Campaign>> {
        self.run(self.stores.lifecycle.list_pending_campaigns())
            .await
    }

    pub async fn review_campaign(&self, campaign_id: i64, decision: ReviewDecision) -> Result<()> {
        self.run(self.stores.lifecycle.review_campaign(campaign_id, decision))
            .await
    }

    pub async fn cancel_campaign(&self, campaign_id: i64, owner_user_id: i64) -> Result<()> {
        self.run(
            self.stores
                .lifecycle
                .cancel_campaign(campaign_id, owner_user_id),
        )
        .await
    }

    // Serving

    pub async fn select_active_campaign(&self) -> Result<ServedAd> {
        self.run(self.selector.select_active_campaign()).await
    }

    pub async fn select_for_day(&self, day: NaiveDate) -> Result<ServedAd> {
        self.run(self.selector.select_for_day(day)).await
    }

    pub async fn record_click(&self, campaign_id: i64, advertisement_id: i64) -> Result<String> {
        self.run(self.selector.record_click(campaign_id, advertisement_id))
            .await
    }

    // Performance

    pub async fn performance_summary(
        &self,
        user_id: i64,
        filter: &PerformanceFilter,
    ) -> Result<Vec<PerformanceSummary>> {
        self.run(self.performance.summary(user_id, filter)).await
    }

    // Invoicing

    pub async fn successful_recharge_total(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64> {
        self.run(
            self.stores
                .invoices
                .successful_recharge_total(user_id, start, end),
        )
        .await
    }

    pub async fn create_invoice_request(
        &self,
        user_id: i64,
        request: &NewInvoiceRequest,
    ) -> Result<InvoiceRequest> {
        self.run(self.stores.invoices.create_invoice_request(user_id, request))
            .await
    }

    pub async fn list_invoice_requests(
        &self,
        user_id: i64,
        filter: &InvoiceFilter,
    ) -> Result<Vec<InvoiceRequest>> {
        self.run(self.stores.invoices.list_invoice_requests(user_id, filter))
            .await
    }

    pub async fn get_invoice_request(&self, invoice_id: i64, user_id: i64) -> Result<InvoiceRequest> {
        self.run(self.stores.invoices.get_invoice_request(invoice_id, user_id))
            .await
    }

    pub async fn process_invoice_request(
        &self,
        invoice_id: i64,
        decision: &InvoiceDecision,
    ) -> Result<InvoiceRequest> {
        self.run(
            self.stores
                .invoices
                .process_invoice_request(invoice_id, decision),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_in_memory_market_round_trip() {
        let market = AdMarket::open(&Config::for_test()).await.unwrap();
        let user_id = market.create_user("alice", "hash").await.unwrap();

        let tx = market
            .recharge(user_id, 10.5, "card", PaymentOutcome::succeeded("PSP-1"))
            .await
            .unwrap();
        assert_eq!(tx.amount, 1050);
        assert_eq!(market.get_balance(user_id).await.unwrap(), 1050);
    }

    #[tokio::test]
    async fn test_recharge_rejects_sub_cent_amount() {
        let market = AdMarket::open(&Config::for_test()).await.unwrap();
        let user_id = market.create_user("bob", "hash").await.unwrap();

        let err = market
            .recharge(user_id, 0.001, "card", PaymentOutcome::succeeded("PSP-2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(market
            .recharge_history(user_id, &RechargeFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_elapsed_deadline_is_reported() {
        let config = Config {
            operation_timeout_ms: Some(10),
            ..Config::for_test()
        };
        let market = AdMarket::open(&config).await.unwrap();

        let err = market
            .run(async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DeadlineExceeded(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}

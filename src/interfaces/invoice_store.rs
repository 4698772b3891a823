//! Invoicing interface.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::filter::InvoiceFilter;
use crate::models::{InvoiceDecision, InvoiceRequest, NewInvoiceRequest};

/// Interface for billable totals and invoice requests.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Sum of the user's `Success` recharges created within
    /// `[start, end-of-day(end)]`. Zero when nothing matches.
    async fn successful_recharge_total(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64>;

    /// Snapshot the period total into a new `Pending` invoice request.
    ///
    /// Rejected as invalid input when the total is not positive; nothing
    /// is persisted in that case.
    async fn create_invoice_request(
        &self,
        user_id: i64,
        request: &NewInvoiceRequest,
    ) -> Result<InvoiceRequest>;

    /// The user's invoice requests matching `filter`, newest first.
    async fn list_invoice_requests(
        &self,
        user_id: i64,
        filter: &InvoiceFilter,
    ) -> Result<Vec<InvoiceRequest>>;

    /// One invoice request, visible only to its owner.
    async fn get_invoice_request(&self, invoice_id: i64, user_id: i64) -> Result<InvoiceRequest>;

    /// Administrative processing. Never touches the total.
    async fn process_invoice_request(
        &self,
        invoice_id: i64,
        decision: &InvoiceDecision,
    ) -> Result<InvoiceRequest>;
}

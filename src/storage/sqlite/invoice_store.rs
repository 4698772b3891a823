//! SQLite InvoiceStore implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_query::{Condition, Expr, Order, Query, SelectStatement, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::filter::{end_of_day, start_of_day, Field, InvoiceFilter, ToPredicates};
use crate::interfaces::InvoiceStore;
use crate::models::{
    InvoiceDecision, InvoiceRequest, InvoiceStatus, NewInvoiceRequest, RechargeStatus,
};
use crate::storage::helpers::{
    format_date, format_timestamp, non_empty, now_timestamp, parse_date, parse_status,
    parse_timestamp, require_text, to_condition,
};
use crate::storage::schema::{InvoiceRequests, RechargeTransactions};

/// SQLite implementation of InvoiceStore.
pub struct SqliteInvoiceStore {
    pool: SqlitePool,
}

impl SqliteInvoiceStore {
    /// Create a new SQLite invoice store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn select_invoices() -> SelectStatement {
        Query::select()
            .columns([
                InvoiceRequests::Id,
                InvoiceRequests::UserId,
                InvoiceRequests::Status,
                InvoiceRequests::PeriodStart,
                InvoiceRequests::PeriodEnd,
                InvoiceRequests::TotalAmount,
                InvoiceRequests::BillingTitle,
                InvoiceRequests::TaxId,
                InvoiceRequests::BillingAddress,
                InvoiceRequests::InvoiceNumber,
                InvoiceRequests::Notes,
                InvoiceRequests::RequestedAt,
                InvoiceRequests::ProcessedAt,
            ])
            .from(InvoiceRequests::Table)
            .to_owned()
    }

    fn from_row(row: &SqliteRow) -> Result<InvoiceRequest> {
        let status: String = row.try_get("status")?;
        let period_start: String = row.try_get("period_start")?;
        let period_end: String = row.try_get("period_end")?;
        let requested_at: String = row.try_get("requested_at")?;
        let processed_at: Option<String> = row.try_get("processed_at")?;
        Ok(InvoiceRequest {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            status: parse_status(&status)?,
            period_start: parse_date(&period_start)?,
            period_end: parse_date(&period_end)?,
            total_amount: row.try_get("total_amount")?,
            billing_title: row.try_get("billing_title")?,
            tax_id: row.try_get("tax_id")?,
            billing_address: row.try_get("billing_address")?,
            invoice_number: row.try_get("invoice_number")?,
            notes: row.try_get("notes")?,
            requested_at: parse_timestamp(&requested_at)?,
            processed_at: processed_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }

    fn column(field: Field) -> Option<Expr> {
        match field {
            Field::Timestamp => Some(Expr::col(InvoiceRequests::RequestedAt)),
            Field::Status => Some(Expr::col(InvoiceRequests::Status)),
            _ => None,
        }
    }

    /// Successful recharges of `user_id` created within the inclusive period.
    fn billable_recharges(user_id: i64, start: NaiveDate, end: NaiveDate) -> Condition {
        Condition::all()
            .add(Expr::col(RechargeTransactions::UserId).eq(user_id))
            .add(Expr::col(RechargeTransactions::Status).eq(RechargeStatus::Success.as_str()))
            .add(
                Expr::col(RechargeTransactions::CreatedAt)
                    .gte(format_timestamp(start_of_day(start))),
            )
            .add(
                Expr::col(RechargeTransactions::CreatedAt).lte(format_timestamp(end_of_day(end))),
            )
    }

    /// Select of one invoice request, narrowed by `condition`.
    fn select_one(invoice_id: i64, condition: Condition) -> String {
        Self::select_invoices()
            .cond_where(condition.add(Expr::col(InvoiceRequests::Id).eq(invoice_id)))
            .to_string(SqliteQueryBuilder)
    }

    async fn fetch_one(&self, invoice_id: i64, query: String) -> Result<InvoiceRequest> {
        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => Self::from_row(&row),
            None => Err(StoreError::NotFound {
                entity: "invoice request",
                id: invoice_id,
            }),
        }
    }
}

#[async_trait]
impl InvoiceStore for SqliteInvoiceStore {
    async fn successful_recharge_total(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64> {
        let query = Query::select()
            .expr(Expr::col(RechargeTransactions::Amount).sum())
            .from(RechargeTransactions::Table)
            .cond_where(Self::billable_recharges(user_id, start, end))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_one(&self.pool).await?;
        let total: Option<i64> = row.try_get(0)?;
        Ok(total.unwrap_or(0))
    }

    async fn create_invoice_request(
        &self,
        user_id: i64,
        request: &NewInvoiceRequest,
    ) -> Result<InvoiceRequest> {
        require_text("billing title", &request.billing_title)?;
        require_text("billing address", &request.billing_address)?;
        if request.period_end < request.period_start {
            return Err(StoreError::invalid(format!(
                "period end {} is before period start {}",
                request.period_end, request.period_start
            )));
        }

        // Total computation and insert are one statement, so the snapshot
        // always matches the recharges visible at request time.
        let query = {
            let source = Query::select()
                .expr(Expr::val(user_id))
                .expr(Expr::val(InvoiceStatus::Pending.as_str()))
                .expr(Expr::val(format_date(request.period_start)))
                .expr(Expr::val(format_date(request.period_end)))
                .expr(Expr::col(RechargeTransactions::Amount).sum())
                .expr(Expr::val(request.billing_title.trim()))
                .expr(Expr::val(request.tax_id.as_deref().and_then(non_empty)))
                .expr(Expr::val(request.billing_address.trim()))
                .expr(Expr::val(now_timestamp()))
                .from(RechargeTransactions::Table)
                .cond_where(Self::billable_recharges(
                    user_id,
                    request.period_start,
                    request.period_end,
                ))
                .group_by_col(RechargeTransactions::UserId)
                .and_having(Expr::expr(Expr::col(RechargeTransactions::Amount).sum()).gt(0))
                .to_owned();

            let mut insert = Query::insert();
            insert.into_table(InvoiceRequests::Table).columns([
                InvoiceRequests::UserId,
                InvoiceRequests::Status,
                InvoiceRequests::PeriodStart,
                InvoiceRequests::PeriodEnd,
                InvoiceRequests::TotalAmount,
                InvoiceRequests::BillingTitle,
                InvoiceRequests::TaxId,
                InvoiceRequests::BillingAddress,
                InvoiceRequests::RequestedAt,
            ]);
            insert
                .select_from(source)
                .map_err(|e| StoreError::Integrity(format!("invoice insert: {e}")))?;
            insert.to_string(SqliteQueryBuilder)
        };
        debug!(%query, "create invoice request");

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::invalid(format!(
                "no billable recharges between {} and {}",
                request.period_start, request.period_end
            )));
        }
        let invoice_id = result.last_insert_rowid();

        let invoice = self.get_invoice_request(invoice_id, user_id).await?;
        info!(
            user_id,
            invoice_id,
            total_amount = invoice.total_amount,
            "invoice requested"
        );
        Ok(invoice)
    }

    async fn list_invoice_requests(
        &self,
        user_id: i64,
        filter: &InvoiceFilter,
    ) -> Result<Vec<InvoiceRequest>> {
        let condition = to_condition(&filter.predicates(), Self::column)?
            .add(Expr::col(InvoiceRequests::UserId).eq(user_id));
        let query = Self::select_invoices()
            .cond_where(condition)
            .order_by(InvoiceRequests::RequestedAt, Order::Desc)
            .order_by(InvoiceRequests::Id, Order::Desc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(Self::from_row).collect()
    }

    async fn get_invoice_request(&self, invoice_id: i64, user_id: i64) -> Result<InvoiceRequest> {
        let query = Self::select_one(
            invoice_id,
            Condition::all().add(Expr::col(InvoiceRequests::UserId).eq(user_id)),
        );
        self.fetch_one(invoice_id, query).await
    }

    async fn process_invoice_request(
        &self,
        invoice_id: i64,
        decision: &InvoiceDecision,
    ) -> Result<InvoiceRequest> {
        if decision.status == InvoiceStatus::Pending {
            return Err(StoreError::invalid(
                "an invoice request can only be processed to Issued or Rejected",
            ));
        }

        let query = Query::update()
            .table(InvoiceRequests::Table)
            .value(InvoiceRequests::Status, decision.status.as_str())
            .value(
                InvoiceRequests::InvoiceNumber,
                decision.invoice_number.as_deref().and_then(non_empty),
            )
            .value(
                InvoiceRequests::Notes,
                decision.notes.as_deref().and_then(non_empty),
            )
            .value(InvoiceRequests::ProcessedAt, now_timestamp())
            .and_where(Expr::col(InvoiceRequests::Id).eq(invoice_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "invoice request",
                id: invoice_id,
            });
        }

        info!(invoice_id, status = %decision.status, "invoice request processed");
        let query = Self::select_one(invoice_id, Condition::all());
        self.fetch_one(invoice_id, query).await
    }
}

//! SQLite LedgerStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::config::TransitionPolicy;
use crate::error::{Result, StoreError};
use crate::filter::{Field, RechargeFilter, ToPredicates};
use crate::interfaces::LedgerStore;
use crate::models::{RechargeStatus, RechargeTransaction};
use crate::money::ensure_positive;
use crate::storage::helpers::{
    non_empty, now_timestamp, parse_status, parse_timestamp, require_text, to_condition,
};
use crate::storage::schema::{RechargeTransactions, Users};

/// SQLite implementation of LedgerStore.
pub struct SqliteLedgerStore {
    pool: SqlitePool,
    policy: TransitionPolicy,
}

impl SqliteLedgerStore {
    /// Create a new SQLite ledger store.
    pub fn new(pool: SqlitePool, policy: TransitionPolicy) -> Self {
        Self { pool, policy }
    }

    fn select_transactions() -> sea_query::SelectStatement {
        Query::select()
            .columns([
                RechargeTransactions::Id,
                RechargeTransactions::UserId,
                RechargeTransactions::Amount,
                RechargeTransactions::Status,
                RechargeTransactions::ExternalReference,
                RechargeTransactions::PaymentMethod,
                RechargeTransactions::CreatedAt,
                RechargeTransactions::UpdatedAt,
            ])
            .from(RechargeTransactions::Table)
            .to_owned()
    }

    fn from_row(row: &SqliteRow) -> Result<RechargeTransaction> {
        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;
        Ok(RechargeTransaction {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            amount: row.try_get("amount")?,
            status: parse_status(&status)?,
            external_reference: row.try_get("external_reference")?,
            payment_method: row.try_get("payment_method")?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    fn column(field: Field) -> Option<Expr> {
        match field {
            Field::Timestamp => Some(Expr::col(RechargeTransactions::CreatedAt)),
            Field::Amount => Some(Expr::col(RechargeTransactions::Amount)),
            Field::Status => Some(Expr::col(RechargeTransactions::Status)),
            _ => None,
        }
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn open_recharge_intent(
        &self,
        user_id: i64,
        amount: i64,
        payment_method: &str,
    ) -> Result<i64> {
        ensure_positive(amount)?;
        require_text("payment method", payment_method)?;

        let now = now_timestamp();
        let query = Query::insert()
            .into_table(RechargeTransactions::Table)
            .columns([
                RechargeTransactions::UserId,
                RechargeTransactions::Amount,
                RechargeTransactions::Status,
                RechargeTransactions::PaymentMethod,
                RechargeTransactions::CreatedAt,
                RechargeTransactions::UpdatedAt,
            ])
            .values_panic([
                user_id.into(),
                amount.into(),
                RechargeStatus::Pending.as_str().into(),
                payment_method.trim().into(),
                now.clone().into(),
                now.into(),
            ])
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        let transaction_id = result.last_insert_rowid();

        info!(user_id, transaction_id, amount, "opened recharge intent");
        Ok(transaction_id)
    }

    async fn complete_recharge(
        &self,
        user_id: i64,
        amount: i64,
        transaction_id: i64,
        external_reference: &str,
    ) -> Result<()> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        // Claim the transaction first: the write lock is taken up front and
        // concurrent completions of the same id see zero rows.
        let claim = Query::update()
            .table(RechargeTransactions::Table)
            .value(RechargeTransactions::Status, RechargeStatus::Success.as_str())
            .value(
                RechargeTransactions::ExternalReference,
                non_empty(external_reference),
            )
            .value(RechargeTransactions::UpdatedAt, now)
            .and_where(Expr::col(RechargeTransactions::Id).eq(transaction_id))
            .and_where(Expr::col(RechargeTransactions::UserId).eq(user_id))
            .and_where(Expr::col(RechargeTransactions::Amount).eq(amount))
            .and_where(
                Expr::col(RechargeTransactions::Status).eq(RechargeStatus::Pending.as_str()),
            )
            .to_string(SqliteQueryBuilder);

        let claimed = sqlx::query(&claim).execute(&mut *tx).await?;
        if claimed.rows_affected() == 0 {
            return Err(StoreError::RechargeNotPending {
                transaction_id,
                user_id,
            });
        }

        let credit = Query::update()
            .table(Users::Table)
            .value(Users::Balance, Expr::col(Users::Balance).add(amount))
            .and_where(Expr::col(Users::Id).eq(user_id))
            .to_string(SqliteQueryBuilder);

        let credited = sqlx::query(&credit).execute(&mut *tx).await?;
        if credited.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "user",
                id: user_id,
            });
        }

        tx.commit().await?;

        info!(user_id, transaction_id, amount, "recharge completed");
        Ok(())
    }

    async fn fail_recharge(&self, transaction_id: i64, reason: &str) -> Result<()> {
        let query = {
            let mut update = Query::update()
                .table(RechargeTransactions::Table)
                .value(RechargeTransactions::Status, RechargeStatus::Failed.as_str())
                .value(RechargeTransactions::ExternalReference, non_empty(reason))
                .value(RechargeTransactions::UpdatedAt, now_timestamp())
                .and_where(Expr::col(RechargeTransactions::Id).eq(transaction_id))
                .to_owned();
            if self.policy.fail_requires_pending {
                update.and_where(
                    Expr::col(RechargeTransactions::Status).eq(RechargeStatus::Pending.as_str()),
                );
            }
            update.to_string(SqliteQueryBuilder)
        };

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "recharge transaction",
                id: transaction_id,
            });
        }

        info!(transaction_id, reason, "recharge failed");
        Ok(())
    }

    async fn get_balance(&self, user_id: i64) -> Result<i64> {
        let query = Query::select()
            .column(Users::Balance)
            .from(Users::Table)
            .and_where(Expr::col(Users::Id).eq(user_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => Ok(row.try_get("balance")?),
            None => Err(StoreError::NotFound {
                entity: "user",
                id: user_id,
            }),
        }
    }

    async fn get_recharge(&self, transaction_id: i64) -> Result<RechargeTransaction> {
        let query = Self::select_transactions()
            .and_where(Expr::col(RechargeTransactions::Id).eq(transaction_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => Self::from_row(&row),
            None => Err(StoreError::NotFound {
                entity: "recharge transaction",
                id: transaction_id,
            }),
        }
    }

    async fn recharge_history(
        &self,
        user_id: i64,
        filter: &RechargeFilter,
    ) -> Result<Vec<RechargeTransaction>> {
        let condition = to_condition(&filter.predicates(), Self::column)?
            .add(Expr::col(RechargeTransactions::UserId).eq(user_id));
        let query = Self::select_transactions()
            .cond_where(condition)
            .order_by(RechargeTransactions::CreatedAt, Order::Desc)
            .order_by(RechargeTransactions::Id, Order::Desc)
            .to_string(SqliteQueryBuilder);
        debug!(%query, "recharge history");

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(Self::from_row).collect()
    }
}

//! Ledger interface: balances and recharge transactions.

use async_trait::async_trait;

use crate::error::Result;
use crate::filter::RechargeFilter;
use crate::models::RechargeTransaction;

/// Interface for money movement.
///
/// A user's balance only changes inside [`LedgerStore::complete_recharge`],
/// in the same atomic unit that moves the transaction from `Pending` to
/// `Success`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Record a pending recharge intent. `amount` must be positive.
    async fn open_recharge_intent(
        &self,
        user_id: i64,
        amount: i64,
        payment_method: &str,
    ) -> Result<i64>;

    /// Credit `amount` to the user and mark the transaction `Success`.
    ///
    /// Fails with a conflict, leaving the balance untouched, unless the
    /// transaction is currently `Pending` and matches `user_id` and `amount`.
    async fn complete_recharge(
        &self,
        user_id: i64,
        amount: i64,
        transaction_id: i64,
        external_reference: &str,
    ) -> Result<()>;

    /// Mark the transaction `Failed`, storing `reason` as its reference.
    async fn fail_recharge(&self, transaction_id: i64, reason: &str) -> Result<()>;

    /// Current balance in minor units.
    async fn get_balance(&self, user_id: i64) -> Result<i64>;

    /// Fetch a single recharge transaction.
    async fn get_recharge(&self, transaction_id: i64) -> Result<RechargeTransaction>;

    /// The user's recharge transactions matching `filter`, newest first.
    async fn recharge_history(
        &self,
        user_id: i64,
        filter: &RechargeFilter,
    ) -> Result<Vec<RechargeTransaction>>;
}

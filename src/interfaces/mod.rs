//! Abstract interfaces for adledger components.
//!
//! These traits define the contracts for:
//! - User directory (accounts, roles)
//! - Ledger (balances, recharge transactions)
//! - Lifecycle (creative and campaign review/cancellation)
//! - Event log (append-only impressions/clicks)
//! - Invoicing (billable totals, invoice requests)

pub mod event_log;
pub mod invoice_store;
pub mod ledger_store;
pub mod lifecycle_store;
pub mod user_store;

pub use event_log::EventLog;
pub use invoice_store::InvoiceStore;
pub use ledger_store::LedgerStore;
pub use lifecycle_store::LifecycleStore;
pub use user_store::UserStore;

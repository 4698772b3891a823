//! SQLite implementations of storage interfaces.

mod event_log;
mod invoice_store;
mod ledger_store;
mod lifecycle_store;
mod user_store;

pub use event_log::SqliteEventLog;
pub use invoice_store::SqliteInvoiceStore;
pub use ledger_store::SqliteLedgerStore;
pub use lifecycle_store::SqliteLifecycleStore;
pub use user_store::SqliteUserStore;

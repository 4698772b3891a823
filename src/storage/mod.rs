//! Storage implementations.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::{StorageConfig, TransitionPolicy};
use crate::error::Result;
use crate::interfaces::{EventLog, InvoiceStore, LedgerStore, LifecycleStore, UserStore};

pub mod helpers;
pub mod mock;
pub mod schema;
pub mod sqlite;

pub use mock::MockEventLog;
pub use sqlite::{
    SqliteEventLog, SqliteInvoiceStore, SqliteLedgerStore, SqliteLifecycleStore, SqliteUserStore,
};

/// Path value selecting a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// One handle per storage concern, all sharing a pool.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub lifecycle: Arc<dyn LifecycleStore>,
    pub events: Arc<dyn EventLog>,
    pub invoices: Arc<dyn InvoiceStore>,
}

impl Stores {
    /// SQLite-backed stores over an initialized pool.
    pub fn sqlite(pool: SqlitePool, policy: &TransitionPolicy) -> Self {
        Self {
            users: Arc::new(SqliteUserStore::new(pool.clone())),
            ledger: Arc::new(SqliteLedgerStore::new(pool.clone(), policy.clone())),
            lifecycle: Arc::new(SqliteLifecycleStore::new(pool.clone(), policy.clone())),
            events: Arc::new(SqliteEventLog::new(pool.clone())),
            invoices: Arc::new(SqliteInvoiceStore::new(pool)),
        }
    }

    /// Swap the event log, e.g. for a failure-injecting mock.
    pub fn with_event_log(mut self, events: Arc<dyn EventLog>) -> Self {
        self.events = events;
        self
    }
}

/// Open a connection pool for the configured database.
pub async fn connect(config: &StorageConfig) -> Result<SqlitePool> {
    let in_memory = config.path == IN_MEMORY;
    let options = if in_memory {
        SqliteConnectOptions::from_str("sqlite::memory:")?
    } else {
        if let Some(parent) = std::path::Path::new(&config.path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
    };
    let options = options
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

    // Every in-memory connection is its own database, so keep exactly one alive.
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
    };

    let pool = pool_options.connect_with(options).await?;
    info!(path = %config.path, "storage connected");
    Ok(pool)
}

/// Apply the schema. Idempotent.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for statement in schema::SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Initialize storage based on configuration.
pub async fn init_storage(config: &StorageConfig, policy: &TransitionPolicy) -> Result<Stores> {
    let pool = connect(config).await?;
    init_schema(&pool).await?;
    Ok(Stores::sqlite(pool, policy))
}

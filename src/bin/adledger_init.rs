//! adledger-init: create or migrate the marketplace database.
//!
//! Loads configuration (optional path as the first argument), opens the
//! configured SQLite database and applies the schema.

use tracing::{error, info};

use adledger::config::Config;
use adledger::storage::{connect, init_schema};
use adledger::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let path = std::env::args().nth(1);
    let config = Config::load(path.as_deref())?;

    let pool = connect(&config.storage).await?;
    if let Err(e) = init_schema(&pool).await {
        error!(error = %e, path = %config.storage.path, "schema initialization failed");
        return Err(e.into());
    }

    info!(path = %config.storage.path, "adledger database ready");
    pool.close().await;
    Ok(())
}

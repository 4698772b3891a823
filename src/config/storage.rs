//! Storage configuration types.

use serde::Deserialize;

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file, or `:memory:` for a private in-memory database.
    pub path: String,
    /// Pool size for file-backed databases.
    pub max_connections: u32,
    /// How long a connection waits on a locked database.
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "data/adledger.db".to_string(),
            max_connections: 8,
            busy_timeout_ms: 5000,
        }
    }
}

impl StorageConfig {
    /// File-backed storage at `path` with default pool settings.
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn in_memory() -> Self {
        Self::at(crate::storage::IN_MEMORY)
    }
}

//! Database registry integration tests


use elevator::config::{Config, WalSyncStrategy};
use elevator::DatabaseStore;
use tempfile::TempDir;

// =============================================================================
// Shared Helpers
// =============================================================================

pub(crate) fn config_for(temp: &TempDir, default_database: Option<&str>) -> Config {
    Config::builder()
        .storage_path(temp.path().join("data"))
        .default_database(default_database)
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .build()
}

/// Store with no default database
pub(crate) fn setup_store() -> (TempDir, DatabaseStore) {
    let temp = TempDir::new().unwrap();
    let store = DatabaseStore::open(&config_for(&temp, None)).unwrap();
    (temp, store)
}

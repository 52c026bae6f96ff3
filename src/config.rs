//! Configuration for Elevator
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for an Elevator server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory under which databases created by bare name live
    /// Internal structure:
    ///   {storage_path}/
    ///     └── {name}/
    ///           ├── wal.log      (write-ahead log)
    ///           └── sstables/    (SSTable files)
    pub storage_path: PathBuf,

    /// Registry file mapping database names to paths, uids and options
    pub registry_path: PathBuf,

    /// Database created at startup when absent from the registry
    pub default_database: Option<String>,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Shared credential expected in request meta under "auth"
    pub secret: Option<String>,

    // -------------------------------------------------------------------------
    // Broker Configuration
    // -------------------------------------------------------------------------
    /// Number of worker threads serving requests
    pub workers: usize,

    /// Per-attempt timeout for supervisor control messages
    pub control_timeout: Duration,

    /// Attempts made before a worker is reported unresponsive
    pub control_retries: usize,

    /// Idle-database reaper period (None disables the reaper)
    pub majordome_interval: Option<Duration>,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./elevator_data"),
            registry_path: PathBuf::from("./elevator_data/databases.json"),
            default_database: Some("default".to_string()),
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            listen_addr: "127.0.0.1:4141".to_string(),
            max_connections: 1024,
            secret: None,
            workers: 4,
            control_timeout: Duration::from_millis(500),
            control_retries: 3,
            majordome_interval: Some(Duration::from_secs(15 * 60)),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage root; the registry file moves along with it
    /// unless set explicitly afterwards
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.config.registry_path = path.join("databases.json");
        self.config.storage_path = path;
        self
    }

    /// Set the registry file location
    pub fn registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.registry_path = path.into();
        self
    }

    /// Set (or clear) the database created at startup
    pub fn default_database(mut self, name: Option<&str>) -> Self {
        self.config.default_database = name.map(str::to_string);
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Require clients to present this credential
    pub fn secret(mut self, secret: Option<&str>) -> Self {
        self.config.secret = secret.map(str::to_string);
        self
    }

    /// Set the worker pool size
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the per-attempt control message timeout
    pub fn control_timeout(mut self, timeout: Duration) -> Self {
        self.config.control_timeout = timeout;
        self
    }

    /// Set the number of control message attempts
    pub fn control_retries(mut self, retries: usize) -> Self {
        self.config.control_retries = retries;
        self
    }

    /// Set the reaper period (None disables it)
    pub fn majordome_interval(mut self, interval: Option<Duration>) -> Self {
        self.config.majordome_interval = interval;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

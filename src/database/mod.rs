//! Database Module
//!
//! Named, independently mounted databases and the registry that owns them.
//!
//! ## Mount model
//! ```text
//!   Database
//!   ├── uid / name / path / options     (immutable)
//!   ├── engine: RwLock<Option<Engine>>  (Some iff MOUNTED)
//!   └── last_access / mounted_at        (unix millis, 0 = never)
//! ```
//!
//! Commands hold a read guard on `engine` for their whole duration. Unmount,
//! drop and repair take the write guard, which waits for every in-flight
//! command to finish, so no command ever runs against a closing engine.

mod registry;
mod sidefile;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

use crate::config::WalSyncStrategy;
use crate::engine::{Engine, EngineOptions};
use crate::error::{ElevatorError, Result};

pub use registry::DatabaseStore;
pub use sidefile::{RegistryEntry, RegistryFile};

/// Whether a database currently holds a live engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStatus {
    Mounted,
    Unmounted,
}

impl MountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MountStatus::Mounted => "MOUNTED",
            MountStatus::Unmounted => "UNMOUNTED",
        }
    }
}

impl fmt::Display for MountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current wall-clock time in unix milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// One registered database
pub struct Database {
    uid: String,
    name: String,
    path: PathBuf,
    options: EngineOptions,
    engine: RwLock<Option<Engine>>,
    last_access: AtomicU64,
    mounted_at: AtomicU64,
}

impl Database {
    pub(crate) fn new(uid: String, name: String, path: PathBuf, options: EngineOptions) -> Self {
        Self {
            uid,
            name,
            path,
            options,
            engine: RwLock::new(None),
            last_access: AtomicU64::new(0),
            mounted_at: AtomicU64::new(0),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn status(&self) -> MountStatus {
        if self.engine.read().is_some() {
            MountStatus::Mounted
        } else {
            MountStatus::Unmounted
        }
    }

    /// Last time a command targeted this database
    pub fn last_access(&self) -> Option<u64> {
        match self.last_access.load(Ordering::Acquire) {
            0 => None,
            at => Some(at),
        }
    }

    /// When the current engine was opened
    pub fn mounted_at(&self) -> Option<u64> {
        match self.mounted_at.load(Ordering::Acquire) {
            0 => None,
            at => Some(at),
        }
    }

    /// Record an access now
    pub fn touch(&self) {
        self.last_access.store(now_millis().max(1), Ordering::Release);
    }

    /// Shared handle to the engine if mounted; holding it blocks unmount
    pub fn engine(&self) -> Option<MappedRwLockReadGuard<'_, Engine>> {
        RwLockReadGuard::try_map(self.engine.read(), |slot| slot.as_ref()).ok()
    }

    pub(crate) fn mount_engine(&self, sync: WalSyncStrategy) -> Result<()> {
        let mut slot = self.engine.write();
        if slot.is_some() {
            return Err(ElevatorError::Database(format!(
                "Database {} already mounted",
                self.name
            )));
        }

        *slot = Some(Engine::open(&self.path, &self.options.for_reopen(), sync)?);
        self.mounted_at.store(now_millis().max(1), Ordering::Release);
        tracing::info!(name = %self.name, uid = %self.uid, "Mounted database");
        Ok(())
    }

    /// Install an engine opened at creation time
    pub(crate) fn install(&self, engine: Engine) {
        *self.engine.write() = Some(engine);
        self.mounted_at.store(now_millis().max(1), Ordering::Release);
    }

    /// Waits for in-flight commands, then closes the engine
    pub(crate) fn unmount_engine(&self) -> Result<()> {
        let mut slot = self.engine.write();
        let engine = slot.take().ok_or_else(|| {
            ElevatorError::Database(format!("Database {} already unmounted", self.name))
        })?;
        self.mounted_at.store(0, Ordering::Release);

        tracing::info!(name = %self.name, uid = %self.uid, "Unmounted database");
        engine.close()
    }

    /// Close the engine if nothing touched it since `cutoff` (unix millis)
    ///
    /// Never waits: a command holding the engine counts as an access.
    /// Access and mount times are read with the write guard held, so a
    /// command that started after `cutoff` always keeps the database.
    pub(crate) fn unmount_if_idle(&self, cutoff: u64) -> Result<bool> {
        let mut slot = match self.engine.try_write() {
            Some(slot) => slot,
            None => return Ok(false),
        };
        if slot.is_none() {
            return Ok(false);
        }

        let idle = matches!(self.last_access(), Some(at) if at < cutoff)
            && matches!(self.mounted_at(), Some(at) if at < cutoff);
        if !idle {
            return Ok(false);
        }

        let engine = match slot.take() {
            Some(engine) => engine,
            None => return Ok(false),
        };
        self.mounted_at.store(0, Ordering::Release);

        tracing::info!(name = %self.name, uid = %self.uid, "Unmounted idle database");
        engine.close()?;
        Ok(true)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("uid", &self.uid)
            .field("name", &self.name)
            .field("path", &self.path)
            .field("status", &self.status())
            .finish()
    }
}

//! Database registry
//!
//! Owns every registered database and the registry file that survives
//! restarts. Lifecycle changes (create, drop, mount, umount, repair, reap)
//! are serialized by `control`; lookups only take the index read lock.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock};
use uuid::Uuid;

use super::sidefile::{self, RegistryEntry, RegistryFile};
use super::{Database, MountStatus};
use crate::config::{Config, WalSyncStrategy};
use crate::engine::{Engine, EngineOptions, RepairReport};
use crate::error::{ElevatorError, Result};

/// In-memory view of the registry
#[derive(Default)]
struct Index {
    by_uid: HashMap<String, Arc<Database>>,
    by_name: HashMap<String, String>,
}

impl Index {
    fn by_name(&self, name: &str) -> Option<Arc<Database>> {
        self.by_name
            .get(name)
            .and_then(|uid| self.by_uid.get(uid))
            .cloned()
    }

    fn insert(&mut self, db: Arc<Database>) {
        self.by_name.insert(db.name().to_string(), db.uid().to_string());
        self.by_uid.insert(db.uid().to_string(), db);
    }

    fn remove(&mut self, name: &str) -> Option<Arc<Database>> {
        let uid = self.by_name.remove(name)?;
        self.by_uid.remove(&uid)
    }

    fn to_file(&self) -> RegistryFile {
        self.by_uid
            .values()
            .map(|db| {
                (
                    db.name().to_string(),
                    RegistryEntry {
                        path: db.path().to_path_buf(),
                        uid: db.uid().to_string(),
                        options: db.options().clone(),
                    },
                )
            })
            .collect()
    }
}

/// Registry of named databases
pub struct DatabaseStore {
    storage_path: PathBuf,
    registry_path: PathBuf,
    sync: WalSyncStrategy,
    index: RwLock<Index>,
    control: Mutex<()>,
}

impl DatabaseStore {
    /// Load the registry file and make sure the default database exists
    ///
    /// Loaded databases start UNMOUNTED; they are mounted on first use.
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.storage_path)?;

        let mut index = Index::default();
        for (name, entry) in sidefile::load(&config.registry_path)? {
            index.insert(Arc::new(Database::new(
                entry.uid,
                name,
                entry.path,
                entry.options,
            )));
        }

        tracing::info!(
            registry = %config.registry_path.display(),
            databases = index.by_uid.len(),
            "Loaded database registry"
        );

        let store = Self {
            storage_path: config.storage_path.clone(),
            registry_path: config.registry_path.clone(),
            sync: config.wal_sync_strategy,
            index: RwLock::new(index),
            control: Mutex::new(()),
        };

        if let Some(name) = &config.default_database {
            if !store.exists(name) {
                store.add(name, EngineOptions::default())?;
            }
        }

        Ok(store)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create, register and mount a database; returns its uid
    ///
    /// An absolute `name` is used verbatim as the directory, a bare name
    /// lives under the storage root, anything else is rejected.
    pub fn add(&self, name: &str, options: EngineOptions) -> Result<String> {
        let _control = self.control.lock();

        if self.index.read().by_name.contains_key(name) {
            return Err(ElevatorError::Database(format!(
                "Database {} already exists",
                name
            )));
        }

        let path = self.resolve_path(name)?;
        let engine = Engine::open(&path, &options, self.sync)?;

        let uid = Uuid::new_v4().to_string();
        let db = Arc::new(Database::new(uid.clone(), name.to_string(), path, options));
        db.install(engine);
        self.index.write().insert(Arc::clone(&db));

        if let Err(e) = self.persist() {
            self.index.write().remove(name);
            if let Err(close) = db.unmount_engine() {
                tracing::warn!(name, error = %close, "Failed to close engine after aborted create");
            }
            return Err(e);
        }

        tracing::info!(name, uid = %uid, path = %db.path().display(), "Created database");
        Ok(uid)
    }

    /// Unregister a database and delete its directory
    ///
    /// The directory is first renamed aside, then the registry file is
    /// rewritten. A failure in either step rolls back the other, so the
    /// registry never names a missing directory. Deleting the renamed
    /// directory afterwards is best effort.
    pub fn drop(&self, name: &str) -> Result<()> {
        let _control = self.control.lock();
        let db = self.lookup(name)?;

        let was_mounted = db.status() == MountStatus::Mounted;
        if was_mounted {
            db.unmount_engine()?;
        }

        let quarantine = quarantine_path(db.path(), db.uid());
        let moved = db.path().exists();
        if moved {
            if let Err(e) = fs::rename(db.path(), &quarantine) {
                self.restore_mount(&db, was_mounted);
                return Err(e.into());
            }
        }

        self.index.write().remove(name);
        if let Err(e) = self.persist() {
            self.index.write().insert(Arc::clone(&db));
            if moved {
                if let Err(undo) = fs::rename(&quarantine, db.path()) {
                    tracing::error!(
                        name,
                        path = %quarantine.display(),
                        error = %undo,
                        "Failed to restore database directory"
                    );
                }
            }
            self.restore_mount(&db, was_mounted);
            return Err(e);
        }

        if moved {
            if let Err(e) = fs::remove_dir_all(&quarantine) {
                tracing::warn!(
                    name,
                    path = %quarantine.display(),
                    error = %e,
                    "Dropped database directory left behind"
                );
            }
        }

        tracing::info!(name, uid = %db.uid(), "Dropped database");
        Ok(())
    }

    /// Open the engine of an UNMOUNTED database
    pub fn mount(&self, name: &str) -> Result<()> {
        let _control = self.control.lock();
        self.lookup(name)?.mount_engine(self.sync)
    }

    /// Close the engine of a MOUNTED database once in-flight commands finish
    pub fn umount(&self, name: &str) -> Result<()> {
        let _control = self.control.lock();
        self.lookup(name)?.unmount_engine()
    }

    /// Repair a database offline, then restore its mount state
    pub fn repair(&self, name: &str) -> Result<RepairReport> {
        let _control = self.control.lock();
        let db = self.lookup(name)?;

        let was_mounted = db.status() == MountStatus::Mounted;
        if was_mounted {
            db.unmount_engine()?;
        }

        let report = Engine::repair(db.path(), &db.options().for_reopen(), self.sync);
        self.restore_mount(&db, was_mounted);
        report
    }

    /// Whether `name` is registered with its directory present
    ///
    /// An entry whose directory vanished is removed from the registry.
    pub fn exists(&self, name: &str) -> bool {
        let _control = self.control.lock();
        let found = self.index.read().by_name(name);
        let db = match found {
            Some(db) => db,
            None => return false,
        };
        if db.path().exists() {
            return true;
        }

        tracing::warn!(
            name,
            path = %db.path().display(),
            "Database directory vanished, removing registry entry"
        );
        if db.status() == MountStatus::Mounted {
            if let Err(e) = db.unmount_engine() {
                tracing::debug!(name, error = %e, "Close of vanished database failed");
            }
        }
        self.index.write().remove(name);
        if let Err(e) = self.persist() {
            tracing::error!(name, error = %e, "Failed to persist registry");
        }
        false
    }

    /// Resolve a name to its uid, mounting the database if needed
    pub fn connect(&self, name: &str) -> Result<String> {
        let db = self.lookup(name)?;
        self.ensure_mounted(&db)?;
        Ok(db.uid().to_string())
    }

    /// Close every mounted engine (server shutdown)
    pub fn close_all(&self) {
        let _control = self.control.lock();
        let databases: Vec<_> = self.index.read().by_uid.values().cloned().collect();
        for db in databases {
            if db.status() == MountStatus::Mounted {
                if let Err(e) = db.unmount_engine() {
                    tracing::error!(name = %db.name(), error = %e, "Failed to close database");
                }
            }
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Registered names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.read().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn status(&self, name: &str) -> Result<MountStatus> {
        Ok(self.lookup(name)?.status())
    }

    pub fn uid_of(&self, name: &str) -> Option<String> {
        self.index.read().by_name.get(name).cloned()
    }

    pub fn get(&self, uid: &str) -> Option<Arc<Database>> {
        self.index.read().by_uid.get(uid).cloned()
    }

    /// Record an access on the database behind `uid`
    pub fn touch(&self, uid: &str) {
        if let Some(db) = self.get(uid) {
            db.touch();
        }
    }

    /// Databases whose engine is currently open
    pub fn mounted(&self) -> Vec<Arc<Database>> {
        self.index
            .read()
            .by_uid
            .values()
            .filter(|db| db.status() == MountStatus::Mounted)
            .cloned()
            .collect()
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    // =========================================================================
    // Engine Access
    // =========================================================================

    /// Shared engine handle for one command, mounting on demand
    ///
    /// The handle blocks unmount, drop and repair of `db` until released.
    /// Counts as an access from the moment it is granted.
    pub fn acquire<'a>(&self, db: &'a Database) -> Result<MappedRwLockReadGuard<'a, Engine>> {
        loop {
            if let Some(engine) = db.engine() {
                db.touch();
                return Ok(engine);
            }
            self.ensure_mounted(db)?;
        }
    }

    /// Unmount `db` if it has been idle since `cutoff` (unix millis)
    ///
    /// Databases never accessed, mounted after `cutoff`, or with a command
    /// in flight are left alone. Never blocks on in-flight commands.
    pub fn unmount_idle(&self, db: &Database, cutoff: u64) -> Result<bool> {
        let _control = self.control.lock();
        db.unmount_if_idle(cutoff)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn lookup(&self, name: &str) -> Result<Arc<Database>> {
        self.index
            .read()
            .by_name(name)
            .ok_or_else(|| ElevatorError::Database(format!("Database {} does not exist", name)))
    }

    fn ensure_mounted(&self, db: &Database) -> Result<()> {
        let _control = self.control.lock();
        if !self.index.read().by_uid.contains_key(db.uid()) {
            return Err(ElevatorError::Database(format!(
                "Database {} was dropped",
                db.name()
            )));
        }
        if db.status() == MountStatus::Mounted {
            return Ok(());
        }

        tracing::debug!(name = %db.name(), "Mounting on demand");
        db.mount_engine(self.sync)
    }

    fn restore_mount(&self, db: &Database, was_mounted: bool) {
        if was_mounted {
            if let Err(e) = db.mount_engine(self.sync) {
                tracing::error!(name = %db.name(), error = %e, "Failed to remount database");
            }
        }
    }

    fn resolve_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() {
            return Err(ElevatorError::Database(
                "Database name must not be empty".to_string(),
            ));
        }

        let candidate = Path::new(name);
        if candidate.is_absolute() {
            return Ok(candidate.to_path_buf());
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(ElevatorError::Database(format!(
                "Relative database path not allowed: {}",
                name
            )));
        }
        Ok(self.storage_path.join(name))
    }

    fn persist(&self) -> Result<()> {
        let file = self.index.read().to_file();
        sidefile::store(&self.registry_path, &file)
    }
}

/// Sibling directory a dropped database is moved to before deletion
fn quarantine_path(path: &Path, uid: &str) -> PathBuf {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "database".to_string());
    path.with_file_name(format!("{}.dropped-{}", base, uid))
}

//! Registry file
//!
//! JSON object mapping database name to `{ path, uid, options }`. The whole
//! file is rewritten on every registry mutation: written to a temporary
//! sibling, synced, then renamed over the old file.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::EngineOptions;
use crate::error::Result;

/// Persisted description of one database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub path: PathBuf,
    pub uid: String,
    #[serde(default)]
    pub options: EngineOptions,
}

/// Name → entry, ordered for stable output
pub type RegistryFile = BTreeMap<String, RegistryEntry>;

/// Load the registry file; a missing file is an empty registry
pub(crate) fn load(path: &Path) -> Result<RegistryFile> {
    if !path.exists() {
        return Ok(RegistryFile::new());
    }
    let raw = fs::read(path)?;
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(RegistryFile::new());
    }
    Ok(serde_json::from_slice(&raw)?)
}

/// Replace the registry file atomically
pub(crate) fn store(path: &Path, entries: &RegistryFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(entries)?)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

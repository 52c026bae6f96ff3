//! Registry commands
//!
//! Thin pass-throughs from DB* commands to the database registry.

use std::collections::BTreeMap;

use super::args::Args;
use crate::database::DatabaseStore;
use crate::engine::EngineOptions;
use crate::error::{ElevatorError, Result};
use crate::protocol::{Response, Value};

pub(crate) fn connect(store: &DatabaseStore, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 1)?;
    let uid = store.connect(args.string(0, "name")?)?;
    Ok(Response::success(vec![Value::Str(uid)]))
}

pub(crate) fn mount(store: &DatabaseStore, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 1)?;
    store.mount(args.string(0, "name")?)?;
    Ok(Response::success(Vec::new()))
}

pub(crate) fn umount(store: &DatabaseStore, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 1)?;
    store.umount(args.string(0, "name")?)?;
    Ok(Response::success(Vec::new()))
}

/// DBCREATE(name, options?) → [uid]
pub(crate) fn create(store: &DatabaseStore, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 2)?;
    let name = args.string(0, "name")?;
    let options = match args.optional(1) {
        None => EngineOptions::default(),
        Some(Value::Map(map)) => parse_options(map)?,
        Some(other) => {
            return Err(ElevatorError::Type(format!(
                "DBCREATE: options must be map, got {}",
                other.type_name()
            )))
        }
    };

    let uid = store.add(name, options)?;
    Ok(Response::success(vec![Value::Str(uid)]))
}

pub(crate) fn drop(store: &DatabaseStore, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 1)?;
    store.drop(args.string(0, "name")?)?;
    Ok(Response::success(Vec::new()))
}

pub(crate) fn list(store: &DatabaseStore, args: &Args<'_>) -> Result<Response> {
    args.expect(0, 0)?;
    Ok(Response::success(
        store.list().into_iter().map(Value::Str).collect(),
    ))
}

/// DBREPAIR(name) → [{wal_corrupted, wal_truncated, quarantined_sstables}]
pub(crate) fn repair(store: &DatabaseStore, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 1)?;
    let report = store.repair(args.string(0, "name")?)?;

    let mut summary = BTreeMap::new();
    summary.insert(
        "wal_corrupted".to_string(),
        Value::Int(report.wal.entries_corrupted as i64),
    );
    summary.insert(
        "wal_truncated".to_string(),
        Value::Bool(report.wal.was_truncated),
    );
    summary.insert(
        "quarantined_sstables".to_string(),
        Value::Int(report.quarantined_sstables as i64),
    );
    Ok(Response::success(vec![Value::Map(summary)]))
}

/// Overlay a partial options map onto the defaults
pub(crate) fn parse_options(map: &BTreeMap<String, Value>) -> Result<EngineOptions> {
    let mut options = EngineOptions::default();

    for (name, value) in map {
        match name.as_str() {
            "create_if_missing" => options.create_if_missing = flag(name, value)?,
            "error_if_exists" => options.error_if_exists = flag(name, value)?,
            "paranoid_checks" => options.paranoid_checks = flag(name, value)?,
            "block_cache_size" => options.block_cache_size = size(name, value)?,
            "write_buffer_size" => options.write_buffer_size = size(name, value)?,
            "block_size" => options.block_size = size(name, value)?,
            "max_open_files" => options.max_open_files = size(name, value)?,
            other => {
                return Err(ElevatorError::Value(format!(
                    "Unknown option {} (expected one of {})",
                    other,
                    EngineOptions::NAMES.join(", ")
                )))
            }
        }
    }

    if options.block_size == 0 {
        return Err(ElevatorError::Value("block_size must be positive".to_string()));
    }
    Ok(options)
}

fn flag(name: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        ElevatorError::Type(format!("Option {} must be bool, got {}", name, value.type_name()))
    })
}

fn size(name: &str, value: &Value) -> Result<usize> {
    let int = value.as_int().ok_or_else(|| {
        ElevatorError::Type(format!("Option {} must be int, got {}", name, value.type_name()))
    })?;
    usize::try_from(int)
        .map_err(|_| ElevatorError::Value(format!("Option {} must not be negative", name)))
}

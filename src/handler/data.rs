//! Data commands
//!
//! Commands that run against one mounted database. Reads of several keys
//! (MGET, RANGE, SLICE) go through a snapshot so their results belong to a
//! single instant.

use super::args::Args;
use crate::engine::Engine;
use crate::error::{ElevatorError, Result};
use crate::protocol::{Response, Value};
use crate::wal::Operation;

const SIGNAL_PUT: &str = "PUT";
const SIGNAL_DELETE: &str = "DELETE";

pub(crate) fn get(engine: &Engine, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 1)?;
    let key = args.bytes(0, "key")?;

    match engine.get(key)? {
        Some(value) => Ok(Response::success(vec![Value::from_stored(value)])),
        None => Err(ElevatorError::KeyNotFound),
    }
}

pub(crate) fn mget(engine: &Engine, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 1)?;
    let keys = args.list(0, "keys")?;

    let mut wanted = Vec::with_capacity(keys.len());
    for key in keys {
        let bytes = key.as_bytes().ok_or_else(|| {
            ElevatorError::Type(format!("MGET: keys must be bytes or string, got {}", key.type_name()))
        })?;
        wanted.push(bytes);
    }

    let snapshot = engine.snapshot();
    let mut missing = false;
    let mut values = Vec::with_capacity(wanted.len());
    for key in wanted {
        match snapshot.get(key)? {
            Some(value) => values.push(Value::from_stored(value)),
            None => {
                missing = true;
                values.push(Value::Null);
            }
        }
    }

    if missing {
        Ok(Response::warning(values))
    } else {
        Ok(Response::success(values))
    }
}

pub(crate) fn put(engine: &Engine, args: &Args<'_>) -> Result<Response> {
    args.expect(2, 2)?;
    let key = args.bytes(0, "key")?;
    let value = args.bytes(1, "value")?;

    engine.put(key, value)?;
    Ok(Response::success(Vec::new()))
}

pub(crate) fn delete(engine: &Engine, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 1)?;
    let key = args.bytes(0, "key")?;

    engine.delete(key)?;
    Ok(Response::success(Vec::new()))
}

pub(crate) fn exists(engine: &Engine, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 1)?;
    let key = args.bytes(0, "key")?;

    Ok(Response::success(vec![Value::Bool(engine.exists(key)?)]))
}

/// RANGE(from, to, include_key=true, include_value=true), both bounds inclusive
pub(crate) fn range(engine: &Engine, args: &Args<'_>) -> Result<Response> {
    args.expect(2, 4)?;
    let from = args.bytes(0, "from")?;
    let to = args.bytes(1, "to")?;
    let shape = Shape::from_args(args, 2)?;

    let snapshot = engine.snapshot();
    let mut datas = Vec::new();
    for entry in snapshot.range(from, to) {
        let (key, value) = entry?;
        datas.push(shape.render(key, value));
    }
    Ok(Response::success(datas))
}

/// SLICE(from, limit, include_key=true, include_value=true)
pub(crate) fn slice(engine: &Engine, args: &Args<'_>) -> Result<Response> {
    args.expect(2, 4)?;
    let from = args.bytes(0, "from")?;
    let limit = args.count(1, "limit")?;
    let shape = Shape::from_args(args, 2)?;

    let snapshot = engine.snapshot();
    let mut datas = Vec::with_capacity(limit.min(1024));
    for entry in snapshot.iter_from(from).take(limit) {
        let (key, value) = entry?;
        datas.push(shape.render(key, value));
    }
    Ok(Response::success(datas))
}

/// BATCH([[signal, key, value?], ...]), validated completely before writing
pub(crate) fn batch(engine: &Engine, args: &Args<'_>) -> Result<Response> {
    args.expect(1, 1)?;
    let items = args.list(0, "commands")?;

    let ops = items
        .iter()
        .enumerate()
        .map(|(position, item)| parse_batch_item(position, item))
        .collect::<Result<Vec<_>>>()?;

    engine.write_batch(ops)?;
    Ok(Response::success(Vec::new()))
}

fn parse_batch_item(position: usize, item: &Value) -> Result<Operation> {
    let fields = item.as_list().ok_or_else(|| {
        ElevatorError::Value(format!(
            "BATCH: item {} must be a list, got {}",
            position,
            item.type_name()
        ))
    })?;

    let signal = match fields.first() {
        Some(Value::Str(signal)) => signal.as_str(),
        Some(other) => {
            return Err(ElevatorError::Type(format!(
                "BATCH: item {} signal must be string, got {}",
                position,
                other.type_name()
            )))
        }
        None => {
            return Err(ElevatorError::Value(format!("BATCH: item {} is empty", position)))
        }
    };

    let payload = |index: usize, name: &str| -> Result<Vec<u8>> {
        let value = fields.get(index).ok_or_else(|| {
            ElevatorError::Value(format!("BATCH: item {} is missing its {}", position, name))
        })?;
        value.as_bytes().map(<[u8]>::to_vec).ok_or_else(|| {
            ElevatorError::Type(format!(
                "BATCH: item {} {} must be bytes or string, got {}",
                position,
                name,
                value.type_name()
            ))
        })
    };

    match signal {
        SIGNAL_PUT => {
            if fields.len() != 3 {
                return Err(ElevatorError::Value(format!(
                    "BATCH: PUT item {} takes key and value",
                    position
                )));
            }
            Ok(Operation::Put {
                key: payload(1, "key")?,
                value: payload(2, "value")?,
            })
        }
        SIGNAL_DELETE => {
            if fields.len() != 2 {
                return Err(ElevatorError::Value(format!(
                    "BATCH: DELETE item {} takes only a key",
                    position
                )));
            }
            Ok(Operation::Delete {
                key: payload(1, "key")?,
            })
        }
        other => Err(ElevatorError::Signal(other.to_string())),
    }
}

/// Which parts of each entry RANGE/SLICE return
struct Shape {
    include_key: bool,
    include_value: bool,
}

impl Shape {
    fn from_args(args: &Args<'_>, first: usize) -> Result<Self> {
        let include_key = args.flag(first, "include_key", true)?;
        let include_value = args.flag(first + 1, "include_value", true)?;
        if !include_key && !include_value {
            return Err(ElevatorError::Value(
                "include_key and include_value cannot both be false".to_string(),
            ));
        }
        Ok(Self {
            include_key,
            include_value,
        })
    }

    fn render(&self, key: Vec<u8>, value: Vec<u8>) -> Value {
        match (self.include_key, self.include_value) {
            (true, true) => Value::List(vec![Value::from_stored(key), Value::from_stored(value)]),
            (true, false) => Value::from_stored(key),
            _ => Value::from_stored(value),
        }
    }
}

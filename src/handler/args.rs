//! Argument extraction
//!
//! Positional argument helpers shared by every command. Wrong counts are
//! ValueErrors, wrong shapes are TypeErrors.

use crate::error::{ElevatorError, Result};
use crate::protocol::Value;

/// Arguments of one command invocation
pub(crate) struct Args<'a> {
    cmd: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub(crate) fn new(cmd: &'a str, values: &'a [Value]) -> Self {
        Self { cmd, values }
    }

    /// Require between `min` and `max` arguments, inclusive
    pub(crate) fn expect(&self, min: usize, max: usize) -> Result<()> {
        let got = self.values.len();
        if got < min || got > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{} to {}", min, max)
            };
            return Err(ElevatorError::Value(format!(
                "{} takes {} argument(s), got {}",
                self.cmd, expected, got
            )));
        }
        Ok(())
    }

    /// String or bytes payload
    pub(crate) fn bytes(&self, index: usize, name: &str) -> Result<&'a [u8]> {
        let value = self.get(index, name)?;
        value.as_bytes().ok_or_else(|| self.wrong_type(name, "bytes or string", value))
    }

    pub(crate) fn string(&self, index: usize, name: &str) -> Result<&'a str> {
        let value = self.get(index, name)?;
        value.as_str().ok_or_else(|| self.wrong_type(name, "string", value))
    }

    pub(crate) fn list(&self, index: usize, name: &str) -> Result<&'a [Value]> {
        let value = self.get(index, name)?;
        value.as_list().ok_or_else(|| self.wrong_type(name, "list", value))
    }

    /// Non-negative integer
    pub(crate) fn count(&self, index: usize, name: &str) -> Result<usize> {
        let value = self.get(index, name)?;
        let int = value.as_int().ok_or_else(|| self.wrong_type(name, "int", value))?;
        usize::try_from(int).map_err(|_| {
            ElevatorError::Value(format!("{}: {} must not be negative", self.cmd, name))
        })
    }

    /// Optional boolean, `default` when absent or null
    pub(crate) fn flag(&self, index: usize, name: &str, default: bool) -> Result<bool> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value.as_bool().ok_or_else(|| self.wrong_type(name, "bool", value)),
        }
    }

    /// Optional argument, `None` when absent or null
    pub(crate) fn optional(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index).filter(|value| !value.is_null())
    }

    fn get(&self, index: usize, name: &str) -> Result<&'a Value> {
        self.values.get(index).ok_or_else(|| {
            ElevatorError::Value(format!("{}: missing argument {}", self.cmd, name))
        })
    }

    fn wrong_type(&self, name: &str, expected: &str, got: &Value) -> ElevatorError {
        ElevatorError::Type(format!(
            "{}: {} must be {}, got {}",
            self.cmd,
            name,
            expected,
            got.type_name()
        ))
    }
}

//! Request definitions
//!
//! Represents commands from clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Value;
use crate::error::{ElevatorError, Result};

/// Meta key asking for a compressed content frame
pub const META_COMPRESSION: &str = "compression";

/// Meta key carrying the shared credential
pub const META_AUTH: &str = "auth";

/// Wire shape of a request; every field is optional so that a frame missing
/// `cmd` or `args` still decodes and can be rejected with a proper error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireRequest {
    pub meta: Option<BTreeMap<String, Value>>,
    pub uid: Option<String>,
    pub cmd: Option<String>,
    pub args: Option<Vec<Value>>,
}

/// A validated client request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub meta: BTreeMap<String, Value>,
    /// Target database, if the command needs one
    pub uid: Option<String>,
    pub cmd: String,
    pub args: Vec<Value>,
}

impl Request {
    pub fn new(cmd: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            meta: BTreeMap::new(),
            uid: None,
            cmd: cmd.into(),
            args,
        }
    }

    /// Target a database by uid
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Attach a meta entry
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    /// Whether the client asked for a compressed content frame
    pub fn wants_compression(&self) -> bool {
        self.meta
            .get(META_COMPRESSION)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Credential presented by the client
    pub fn auth(&self) -> Option<&str> {
        self.meta.get(META_AUTH).and_then(Value::as_str)
    }
}

impl TryFrom<WireRequest> for Request {
    type Error = ElevatorError;

    fn try_from(wire: WireRequest) -> Result<Self> {
        let cmd = wire
            .cmd
            .ok_or_else(|| ElevatorError::Request("missing 'cmd'".to_string()))?;
        let args = wire
            .args
            .ok_or_else(|| ElevatorError::Request("missing 'args'".to_string()))?;

        Ok(Self {
            meta: wire.meta.unwrap_or_default(),
            uid: wire.uid,
            cmd,
            args,
        })
    }
}

impl From<&Request> for WireRequest {
    fn from(request: &Request) -> Self {
        Self {
            meta: Some(request.meta.clone()),
            uid: request.uid.clone(),
            cmd: Some(request.cmd.clone()),
            args: Some(request.args.clone()),
        }
    }
}

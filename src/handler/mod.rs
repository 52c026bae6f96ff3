//! Handler Module
//!
//! Turns one decoded request into one response. Knows nothing about sockets
//! or threads.
//!
//! ## Dispatch order
//! ```text
//!   credential mismatch              → REQUEST_ERROR
//!   uid given but not registered     → RUNTIME_ERROR
//!   unknown command name             → KEY_ERROR
//!   data command without a uid       → REQUEST_ERROR
//!   otherwise                        → the command's own result
//! ```
//!
//! Every failure below this point is an `ElevatorError`, converted to a
//! FAILURE response through `ElevatorError::code()`.

mod admin;
mod args;
mod command;
mod data;

use std::sync::Arc;

use crate::database::DatabaseStore;
use crate::error::{ElevatorError, Result};
use crate::protocol::{Request, Response, Value};

use args::Args;

pub use command::CommandKind;

/// Executes requests against the database registry
pub struct Handler {
    store: Arc<DatabaseStore>,
    secret: Option<String>,
}

impl Handler {
    pub fn new(store: Arc<DatabaseStore>, secret: Option<String>) -> Self {
        Self { store, secret }
    }

    pub fn store(&self) -> &Arc<DatabaseStore> {
        &self.store
    }

    /// Execute a request; never fails, errors become FAILURE responses
    pub fn handle(&self, request: &Request) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(cmd = %request.cmd, error = %e, "Command failed");
                Response::from(e)
            }
        }
    }

    fn dispatch(&self, request: &Request) -> Result<Response> {
        if let Some(secret) = &self.secret {
            if request.auth() != Some(secret.as_str()) {
                return Err(ElevatorError::Request("Authentication failed".to_string()));
            }
        }

        let database = match &request.uid {
            Some(uid) => Some(
                self.store
                    .get(uid)
                    .ok_or_else(|| ElevatorError::UnknownDatabase(uid.clone()))?,
            ),
            None => None,
        };

        let kind = CommandKind::parse(&request.cmd)
            .ok_or_else(|| ElevatorError::UnknownCommand(request.cmd.clone()))?;
        let args = Args::new(kind.name(), &request.args);

        if kind.requires_database() {
            let db = database.ok_or_else(|| {
                ElevatorError::Request(format!("{} requires a database uid", kind))
            })?;
            let engine = self.store.acquire(&db)?;

            return match kind {
                CommandKind::Get => data::get(&engine, &args),
                CommandKind::Mget => data::mget(&engine, &args),
                CommandKind::Put => data::put(&engine, &args),
                CommandKind::Delete => data::delete(&engine, &args),
                CommandKind::Exists => data::exists(&engine, &args),
                CommandKind::Range => data::range(&engine, &args),
                CommandKind::Slice => data::slice(&engine, &args),
                CommandKind::Batch => data::batch(&engine, &args),
                _ => Err(ElevatorError::Runtime(format!("{} is not a data command", kind))),
            };
        }

        match kind {
            CommandKind::Ping => {
                args.expect(0, 0)?;
                Ok(Response::success(vec![Value::from("PONG")]))
            }
            CommandKind::DbConnect => admin::connect(&self.store, &args),
            CommandKind::DbMount => admin::mount(&self.store, &args),
            CommandKind::DbUmount => admin::umount(&self.store, &args),
            CommandKind::DbCreate => admin::create(&self.store, &args),
            CommandKind::DbDrop => admin::drop(&self.store, &args),
            CommandKind::DbList => admin::list(&self.store, &args),
            CommandKind::DbRepair => admin::repair(&self.store, &args),
            _ => Err(ElevatorError::Runtime(format!("{} needs a database", kind))),
        }
    }
}

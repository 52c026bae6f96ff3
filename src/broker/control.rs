//! Control plane messages
//!
//! Supervisor → worker instructions and the replies that mirror them. These
//! travel on a per-worker channel pair, never on the data queue.

use std::fmt;

use uuid::Uuid;

/// Identity issued to a worker at spawn
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(String);

impl WorkerId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Instructions a supervisor can send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Status,
    Stop,
    LastAction,
}

impl Instruction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Instruction::Status => "STATUS",
            Instruction::Stop => "STOP",
            Instruction::LastAction => "LAST_ACTION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STATUS" => Some(Instruction::Status),
            "STOP" => Some(Instruction::Stop),
            "LAST_ACTION" => Some(Instruction::LastAction),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Worker run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Processing,
    Stopped,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Idle => "IDLE",
            WorkerState::Processing => "PROCESSING",
            WorkerState::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most recent completed command of a worker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activity {
    /// Unix millis
    pub timestamp: Option<u64>,
    /// Uid of the database the command targeted
    pub database: Option<String>,
}

/// Answer to one instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlReply {
    Status(WorkerState),
    LastAction(Activity),
    Stopped,
}

impl ControlReply {
    /// Instruction this reply answers
    pub fn instruction(&self) -> Instruction {
        match self {
            ControlReply::Status(_) => Instruction::Status,
            ControlReply::LastAction(_) => Instruction::LastAction,
            ControlReply::Stopped => Instruction::Stop,
        }
    }
}

/// Instruction envelope; `seq` pairs replies with attempts
#[derive(Debug, Clone, Copy)]
pub(crate) struct ControlMessage {
    pub seq: u64,
    pub instruction: Instruction,
}

#[derive(Debug, Clone)]
pub(crate) struct ControlAnswer {
    pub seq: u64,
    pub reply: ControlReply,
}

//! Command kinds
//!
//! The closed set of commands the server understands. Parsing a name is the
//! only place an unknown command can be detected.

use std::fmt;

/// Every command the handler dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    // Data commands (need a mounted database)
    Get,
    Mget,
    Put,
    Delete,
    Exists,
    Range,
    Slice,
    Batch,

    // Server commands
    Ping,

    // Registry commands
    DbConnect,
    DbMount,
    DbUmount,
    DbCreate,
    DbDrop,
    DbList,
    DbRepair,
}

impl CommandKind {
    pub const ALL: [CommandKind; 16] = [
        CommandKind::Get,
        CommandKind::Mget,
        CommandKind::Put,
        CommandKind::Delete,
        CommandKind::Exists,
        CommandKind::Range,
        CommandKind::Slice,
        CommandKind::Batch,
        CommandKind::Ping,
        CommandKind::DbConnect,
        CommandKind::DbMount,
        CommandKind::DbUmount,
        CommandKind::DbCreate,
        CommandKind::DbDrop,
        CommandKind::DbList,
        CommandKind::DbRepair,
    ];

    /// Look up a command by its wire name (case-sensitive)
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Get => "GET",
            CommandKind::Mget => "MGET",
            CommandKind::Put => "PUT",
            CommandKind::Delete => "DELETE",
            CommandKind::Exists => "EXISTS",
            CommandKind::Range => "RANGE",
            CommandKind::Slice => "SLICE",
            CommandKind::Batch => "BATCH",
            CommandKind::Ping => "PING",
            CommandKind::DbConnect => "DBCONNECT",
            CommandKind::DbMount => "DBMOUNT",
            CommandKind::DbUmount => "DBUMOUNT",
            CommandKind::DbCreate => "DBCREATE",
            CommandKind::DbDrop => "DBDROP",
            CommandKind::DbList => "DBLIST",
            CommandKind::DbRepair => "DBREPAIR",
        }
    }

    /// Whether the request must carry the uid of a database
    pub fn requires_database(&self) -> bool {
        matches!(
            self,
            CommandKind::Get
                | CommandKind::Mget
                | CommandKind::Put
                | CommandKind::Delete
                | CommandKind::Exists
                | CommandKind::Range
                | CommandKind::Slice
                | CommandKind::Batch
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

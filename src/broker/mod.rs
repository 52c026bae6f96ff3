//! Broker Module
//!
//! Routes request frames from connections to a pool of workers and replies
//! back, with a separate control plane for managing the pool.
//!
//! ```text
//!   Connection ──Envelope──▶ data queue ──▶ Worker ─┐
//!        ▲                    (shared)       Worker │──▶ Handler
//!        └──────────── Reply ◀───────────── Worker ─┘
//!
//!   Supervisor ──ControlMessage──▶ Worker   (one channel pair per worker)
//!              ◀──ControlAnswer───
//! ```

mod control;
mod supervisor;
mod worker;

use crossbeam::channel::{self, Receiver, Sender};

pub use control::{Activity, ControlReply, Instruction, WorkerId, WorkerState};
pub use supervisor::{Supervisor, Target};

/// Identifies the connection a request came from
pub type ClientId = u64;

/// A request frame on its way to a worker
pub struct Envelope {
    pub client: ClientId,
    /// Undecoded request payload
    pub frame: Vec<u8>,
    /// Where the worker sends the reply
    pub reply_to: Sender<Reply>,
}

/// Encoded response ready to be written to the client
pub struct Reply {
    pub client: ClientId,
    /// Header frame then content frame, length-prefixed
    pub frames: Vec<u8>,
}

/// Data queue shared by all workers
pub fn queue() -> (Sender<Envelope>, Receiver<Envelope>) {
    channel::unbounded()
}

//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One reader thread and one writer thread per connection
//! - Requests executed by the broker's worker pool

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;

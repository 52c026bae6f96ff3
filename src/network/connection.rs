//! Connection Handler
//!
//! Handles individual client connections. A reader loop forwards request
//! frames to the broker queue; a writer thread sends replies back in the
//! order workers complete them, so clients may pipeline requests.

use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::net::TcpStream;
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};

use crate::broker::{ClientId, Envelope, Reply};
use crate::error::{ElevatorError, Result};
use crate::protocol::{encode_response_frames, read_frame, Response};

/// Handles a single client connection
pub struct Connection {
    client: ClientId,

    stream: TcpStream,

    /// Broker data queue
    queue: Sender<Envelope>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, client: ClientId, queue: Sender<Envelope>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        Ok(Self {
            client,
            stream,
            queue,
            peer_addr,
        })
    }

    /// Serve the connection (blocking until closed)
    ///
    /// Returns once the client disconnects and every reply already owed to
    /// it has been written.
    pub fn serve(self) -> Result<()> {
        tracing::debug!(client = self.client, peer = %self.peer_addr, "Connection established");

        let (reply_tx, reply_rx) = channel::unbounded::<Reply>();
        let write_stream = self.stream.try_clone()?;
        let peer = self.peer_addr.clone();
        let writer = thread::Builder::new()
            .name(format!("conn-{}-writer", self.client))
            .spawn(move || write_replies(write_stream, reply_rx, &peer))?;

        let mut reader = BufReader::new(&self.stream);
        loop {
            let frame = match read_frame(&mut reader) {
                Ok(frame) => frame,
                Err(ref e) if is_disconnect(e) => {
                    tracing::debug!(client = self.client, peer = %self.peer_addr, "Client disconnected");
                    break;
                }
                Err(e @ ElevatorError::Protocol(_)) => {
                    // The stream cannot be resynchronized after a bad length
                    tracing::warn!(peer = %self.peer_addr, error = %e, "Rejected frame, closing");
                    if let Ok(frames) = encode_response_frames(&Response::from(e), false) {
                        let _ = reply_tx.send(Reply {
                            client: self.client,
                            frames,
                        });
                    }
                    break;
                }
                Err(e) => {
                    tracing::warn!(peer = %self.peer_addr, error = %e, "Error reading from client");
                    break;
                }
            };

            let envelope = Envelope {
                client: self.client,
                frame,
                reply_to: reply_tx.clone(),
            };
            if self.queue.send(envelope).is_err() {
                tracing::debug!(client = self.client, "Broker queue closed");
                break;
            }
        }

        // Writer exits once every envelope still holding a sender is answered
        drop(reply_tx);
        if writer.join().is_err() {
            tracing::error!(client = self.client, "Connection writer panicked");
        }
        Ok(())
    }
}

/// Writer thread body
fn write_replies(stream: TcpStream, replies: Receiver<Reply>, peer: &str) {
    let mut writer = BufWriter::new(stream);

    for reply in replies {
        let written = writer
            .write_all(&reply.frames)
            .and_then(|_| writer.flush());

        if let Err(e) = written {
            match e.kind() {
                ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe => {
                    tracing::debug!(peer, client = reply.client, "Client disconnected before reply could be sent");
                }
                _ => tracing::warn!(peer, error = %e, "Error writing to client"),
            }
            return;
        }
    }
}

fn is_disconnect(e: &ElevatorError) -> bool {
    match e {
        ElevatorError::Io(io) => matches!(
            io.kind(),
            ErrorKind::UnexpectedEof
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::NotConnected
        ),
        _ => false,
    }
}

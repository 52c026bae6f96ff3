//! TCP Server
//!
//! Wires the pieces together: registry, handler, worker pool, reaper and
//! the accept loop. One thread per connection; requests are executed by the
//! worker pool, not by connection threads.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::Sender;
use parking_lot::Mutex;

use super::Connection;
use crate::broker::{self, ClientId, Envelope, Supervisor};
use crate::config::Config;
use crate::database::DatabaseStore;
use crate::error::Result;
use crate::handler::Handler;
use crate::majordome::Majordome;

/// Accept loop poll interval while idle
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// TCP server for Elevator
pub struct Server {
    config: Config,
    listener: TcpListener,
    store: Arc<DatabaseStore>,
    queue: Sender<Envelope>,
    supervisor: Supervisor,
    majordome: Option<Majordome>,
    shutdown: Arc<AtomicBool>,
    /// Open client streams, shut down on teardown
    connections: Arc<Mutex<HashMap<ClientId, TcpStream>>>,
    active: Arc<AtomicUsize>,
    next_client: ClientId,
}

impl Server {
    /// Bind the listener, load the registry, start workers and the reaper
    pub fn bind(config: Config) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        let store = Arc::new(DatabaseStore::open(&config)?);
        let handler = Arc::new(Handler::new(Arc::clone(&store), config.secret.clone()));

        let (queue, work) = broker::queue();
        let mut supervisor = Supervisor::new(
            handler,
            work,
            config.control_timeout,
            config.control_retries,
        );
        supervisor.spawn(config.workers.max(1))?;

        let majordome = match config.majordome_interval {
            Some(interval) if !interval.is_zero() => {
                Some(Majordome::start(Arc::clone(&store), interval)?)
            }
            _ => None,
        };

        tracing::info!(
            addr = %listener.local_addr()?,
            workers = supervisor.pool_size(),
            databases = store.list().len(),
            "Server listening"
        );

        Ok(Self {
            config,
            listener,
            store,
            queue,
            supervisor,
            majordome,
            shutdown: Arc::new(AtomicBool::new(false)),
            connections: Arc::new(Mutex::new(HashMap::new())),
            active: Arc::new(AtomicUsize::new(0)),
            next_client: 0,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that makes `run` return after teardown once set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn store(&self) -> &Arc<DatabaseStore> {
        &self.store
    }

    pub fn supervisor(&mut self) -> &mut Supervisor {
        &mut self.supervisor
    }

    /// Accept connections until shutdown is requested, then tear down
    pub fn run(mut self) -> Result<()> {
        while !self.shutdown.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => self.accept(stream, peer),
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        self.teardown();
        Ok(())
    }

    fn accept(&mut self, stream: TcpStream, peer: SocketAddr) {
        if self.active.load(Ordering::Acquire) >= self.config.max_connections {
            tracing::warn!(%peer, max = self.config.max_connections, "Connection limit reached, refusing");
            return;
        }

        let client = self.next_client;
        self.next_client += 1;

        let connection = match self.prepare(client, stream) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!(%peer, error = %e, "Failed to set up connection");
                self.connections.lock().remove(&client);
                return;
            }
        };

        let active = Arc::clone(&self.active);
        let connections = Arc::clone(&self.connections);
        active.fetch_add(1, Ordering::AcqRel);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", client))
            .spawn(move || {
                if let Err(e) = connection.serve() {
                    tracing::warn!(client, error = %e, "Connection failed");
                }
                connections.lock().remove(&client);
                active.fetch_sub(1, Ordering::AcqRel);
            });

        if let Err(e) = spawned {
            tracing::error!(%peer, error = %e, "Failed to spawn connection thread");
            self.connections.lock().remove(&client);
            self.active.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn prepare(&self, client: ClientId, stream: TcpStream) -> Result<Connection> {
        stream.set_nonblocking(false)?;
        self.connections.lock().insert(client, stream.try_clone()?);
        Connection::new(stream, client, self.queue.clone())
    }

    /// Stop accepting, halt workers, cancel the reaper, close databases
    fn teardown(mut self) {
        tracing::info!("Shutting down");

        self.supervisor.shutdown();
        if let Some(majordome) = self.majordome.take() {
            majordome.cancel();
        }

        for (_, stream) in self.connections.lock().drain() {
            let _ = stream.shutdown(Shutdown::Both);
        }

        self.store.close_all();
        tracing::info!("Shutdown complete");
    }
}

//! Majordome
//!
//! Periodic reaper that unmounts databases nobody used since the previous
//! tick, bounding open files and cache memory. A reaped database is mounted
//! again by the next command that targets it.
//!
//! ```text
//!   tick N-1            tick N
//!      │                   │
//!      ├── cutoff ─────────┤  mounted, last access < cutoff → umount
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, select, Sender};

use crate::database::{now_millis, DatabaseStore};
use crate::error::Result;

/// Handle to the running reaper thread
pub struct Majordome {
    cancel: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Majordome {
    /// Start ticking every `interval`
    pub fn start(store: Arc<DatabaseStore>, interval: Duration) -> Result<Self> {
        let (cancel_tx, cancel_rx) = channel::bounded::<()>(1);

        let thread = thread::Builder::new()
            .name("majordome".to_string())
            .spawn(move || {
                let ticker = channel::tick(interval);
                let mut previous_tick = now_millis();

                loop {
                    select! {
                        recv(cancel_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            let now = now_millis();
                            let reaped = reap_idle(&store, previous_tick);
                            if !reaped.is_empty() {
                                tracing::info!(databases = ?reaped, "Unmounted idle databases");
                            }
                            previous_tick = now;
                        }
                    }
                }
                tracing::debug!("Majordome stopped");
            })?;

        tracing::info!(interval_secs = interval.as_secs(), "Majordome started");
        Ok(Self {
            cancel: Some(cancel_tx),
            thread: Some(thread),
        })
    }

    /// Stop future ticks and wait for a tick in progress to finish
    pub fn cancel(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Dropping the sender disconnects the cancel channel
        self.cancel.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Majordome thread panicked");
            }
        }
    }
}

impl Drop for Majordome {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Unmount every mounted database idle since `cutoff` (unix millis)
///
/// Returns the names unmounted. Databases never accessed, or mounted after
/// `cutoff`, are spared.
pub fn reap_idle(store: &DatabaseStore, cutoff: u64) -> Vec<String> {
    let mut reaped = Vec::new();

    for db in store.mounted() {
        match store.unmount_idle(&db, cutoff) {
            Ok(true) => reaped.push(db.name().to_string()),
            Ok(false) => {}
            Err(e) => tracing::warn!(name = %db.name(), error = %e, "Failed to unmount idle database"),
        }
    }

    reaped.sort();
    reaped
}

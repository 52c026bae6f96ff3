//! Supervisor
//!
//! Spawns the worker pool and drives it over the control plane. Every
//! instruction is retried `retries` times with a per-attempt `timeout`; a
//! worker that never answers is logged and left in the pool.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use super::control::{
    Activity, ControlAnswer, ControlMessage, ControlReply, Instruction, WorkerId, WorkerState,
};
use super::worker::Worker;
use super::Envelope;
use crate::error::{ElevatorError, Result};
use crate::handler::Handler;

/// Which workers an instruction addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    One(WorkerId),
}

/// Supervisor's side of one worker
struct WorkerHandle {
    id: WorkerId,
    control: Sender<ControlMessage>,
    answers: Receiver<ControlAnswer>,
    thread: Option<JoinHandle<()>>,
    next_seq: u64,
}

/// Owner of the worker pool
pub struct Supervisor {
    handler: Arc<Handler>,
    queue: Receiver<Envelope>,
    timeout: Duration,
    retries: usize,
    workers: Vec<WorkerHandle>,
}

impl Supervisor {
    pub fn new(
        handler: Arc<Handler>,
        queue: Receiver<Envelope>,
        timeout: Duration,
        retries: usize,
    ) -> Self {
        Self {
            handler,
            queue,
            timeout,
            retries: retries.max(1),
            workers: Vec::new(),
        }
    }

    /// Start `count` workers on the shared data queue
    pub fn spawn(&mut self, count: usize) -> Result<Vec<WorkerId>> {
        let mut spawned = Vec::with_capacity(count);

        for _ in 0..count {
            let id = WorkerId::generate();
            let (control_tx, control_rx) = channel::unbounded();
            let (answer_tx, answer_rx) = channel::unbounded();

            let worker = Worker::new(
                id.clone(),
                Arc::clone(&self.handler),
                self.queue.clone(),
                control_rx,
                answer_tx,
            );
            let thread = thread::Builder::new()
                .name(format!("worker-{}", &id.as_str()[..8]))
                .spawn(move || worker.run())?;

            self.workers.push(WorkerHandle {
                id: id.clone(),
                control: control_tx,
                answers: answer_rx,
                thread: Some(thread),
                next_seq: 0,
            });
            spawned.push(id);
        }

        tracing::info!(spawned = count, pool = self.workers.len(), "Spawned workers");
        Ok(spawned)
    }

    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.workers.iter().map(|w| w.id.clone()).collect()
    }

    /// Run state per worker; `None` for workers that never answered
    pub fn status(&mut self, target: &Target) -> Result<BTreeMap<WorkerId, Option<WorkerState>>> {
        let mut states = BTreeMap::new();
        for index in self.resolve(target)? {
            let state = match self.ask(index, Instruction::Status) {
                Some(ControlReply::Status(state)) => Some(state),
                _ => None,
            };
            states.insert(self.workers[index].id.clone(), state);
        }
        Ok(states)
    }

    /// Last completed command per worker; `None` for workers that never answered
    pub fn last_activity(&mut self, target: &Target) -> Result<BTreeMap<WorkerId, Option<Activity>>> {
        let mut activities = BTreeMap::new();
        for index in self.resolve(target)? {
            let activity = match self.ask(index, Instruction::LastAction) {
                Some(ControlReply::LastAction(activity)) => Some(activity),
                _ => None,
            };
            activities.insert(self.workers[index].id.clone(), activity);
        }
        Ok(activities)
    }

    /// Stop workers and join their threads; returns the ids removed
    ///
    /// A worker finishes its in-flight request before acknowledging.
    /// Unresponsive workers stay in the pool.
    pub fn halt(&mut self, target: &Target) -> Result<Vec<WorkerId>> {
        let indices = self.resolve(target)?;

        let mut stopped = Vec::new();
        for index in indices {
            if let Some(ControlReply::Stopped) = self.ask(index, Instruction::Stop) {
                stopped.push(index);
            }
        }

        // Highest index first so removals don't shift pending ones
        let mut removed = Vec::with_capacity(stopped.len());
        for index in stopped.into_iter().rev() {
            let mut handle = self.workers.remove(index);
            if let Some(thread) = handle.thread.take() {
                if thread.join().is_err() {
                    tracing::error!(worker = %handle.id, "Worker thread panicked");
                }
            }
            tracing::debug!(worker = %handle.id, "Worker halted");
            removed.push(handle.id);
        }
        removed.reverse();
        Ok(removed)
    }

    /// Halt every worker (server shutdown)
    pub fn shutdown(&mut self) {
        let total = self.workers.len();
        match self.halt(&Target::All) {
            Ok(stopped) => tracing::info!(stopped = stopped.len(), total, "Worker pool shut down"),
            Err(e) => tracing::error!(error = %e, "Worker pool shutdown failed"),
        }
        for handle in &self.workers {
            tracing::error!(worker = %handle.id, "Worker left running after shutdown");
        }
    }

    fn resolve(&self, target: &Target) -> Result<Vec<usize>> {
        match target {
            Target::All => Ok((0..self.workers.len()).collect()),
            Target::One(id) => self
                .workers
                .iter()
                .position(|w| &w.id == id)
                .map(|index| vec![index])
                .ok_or_else(|| ElevatorError::Runtime(format!("Unknown worker {}", id))),
        }
    }

    /// Send an instruction and wait for its reply, retrying on timeout
    fn ask(&mut self, index: usize, instruction: Instruction) -> Option<ControlReply> {
        let timeout = self.timeout;
        let retries = self.retries;
        let handle = &mut self.workers[index];
        let first_seq = handle.next_seq;

        for attempt in 1..=retries {
            let seq = handle.next_seq;
            handle.next_seq += 1;

            if handle.control.send(ControlMessage { seq, instruction }).is_err() {
                tracing::error!(worker = %handle.id, %instruction, "Worker control channel closed");
                return None;
            }

            let deadline = Instant::now() + timeout;
            loop {
                match handle.answers.recv_deadline(deadline) {
                    // Any attempt of this call counts; older ones are stale
                    Ok(answer) if answer.seq >= first_seq => return Some(answer.reply),
                    Ok(stale) => {
                        tracing::debug!(worker = %handle.id, seq = stale.seq, "Discarded stale control reply");
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        tracing::warn!(
                            worker = %handle.id,
                            %instruction,
                            attempt,
                            retries,
                            "Worker missed control deadline"
                        );
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        tracing::error!(worker = %handle.id, %instruction, "Worker gone");
                        return None;
                    }
                }
            }
        }

        tracing::error!(
            worker = %handle.id,
            %instruction,
            "Worker unresponsive, leaving it for manual cleanup"
        );
        None
    }
}

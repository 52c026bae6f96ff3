//! Worker
//!
//! One thread owning a handler. Serves exactly one request at a time from
//! the shared data queue and answers control messages between requests.
//!
//! ```text
//!   IDLE ──request──▶ PROCESSING ──done──▶ IDLE
//!   IDLE ──STOP──▶ STOPPED (drops its queue handle, acks, exits)
//! ```

use std::sync::Arc;

use crossbeam::channel::{self, select, Receiver, Sender};

use super::control::{
    Activity, ControlAnswer, ControlMessage, ControlReply, Instruction, WorkerId, WorkerState,
};
use super::{Envelope, Reply};
use crate::database::now_millis;
use crate::handler::Handler;
use crate::protocol::{decode_request, encode_response_frames, Response};

pub(crate) struct Worker {
    id: WorkerId,
    handler: Arc<Handler>,
    queue: Receiver<Envelope>,
    control: Receiver<ControlMessage>,
    answers: Sender<ControlAnswer>,
    state: WorkerState,
    activity: Activity,
}

impl Worker {
    pub(crate) fn new(
        id: WorkerId,
        handler: Arc<Handler>,
        queue: Receiver<Envelope>,
        control: Receiver<ControlMessage>,
        answers: Sender<ControlAnswer>,
    ) -> Self {
        Self {
            id,
            handler,
            queue,
            control,
            answers,
            state: WorkerState::Idle,
            activity: Activity::default(),
        }
    }

    /// Thread body; returns once stopped or orphaned by its supervisor
    pub(crate) fn run(mut self) {
        tracing::debug!(worker = %self.id, "Worker started");

        loop {
            // Local handles so the arms below may borrow self mutably
            let control = self.control.clone();
            let queue = self.queue.clone();

            select! {
                recv(control) -> message => match message {
                    Ok(message) => {
                        if !self.on_control(message) {
                            break;
                        }
                    }
                    Err(_) => {
                        tracing::debug!(worker = %self.id, "Supervisor gone");
                        break;
                    }
                },
                recv(queue) -> envelope => match envelope {
                    Ok(envelope) => self.process(envelope),
                    // Keep answering control messages until told to stop
                    Err(_) => self.queue = channel::never(),
                },
            }
        }

        tracing::debug!(worker = %self.id, "Worker exited");
    }

    /// Returns false once the worker must exit
    fn on_control(&mut self, message: ControlMessage) -> bool {
        let reply = match message.instruction {
            Instruction::Status => ControlReply::Status(self.state),
            Instruction::LastAction => ControlReply::LastAction(self.activity.clone()),
            Instruction::Stop => {
                self.queue = channel::never();
                self.state = WorkerState::Stopped;
                ControlReply::Stopped
            }
        };

        let answer = ControlAnswer {
            seq: message.seq,
            reply,
        };
        if self.answers.send(answer).is_err() {
            return false;
        }
        self.state != WorkerState::Stopped
    }

    fn process(&mut self, envelope: Envelope) {
        self.state = WorkerState::Processing;

        let (response, compress, database) = match decode_request(&envelope.frame) {
            Ok(request) => {
                let response = self.handler.handle(&request);
                (response, request.wants_compression(), request.uid)
            }
            Err(e) => {
                tracing::debug!(worker = %self.id, client = envelope.client, error = %e, "Rejected frame");
                (Response::from(e), false, None)
            }
        };

        if let Some(uid) = &database {
            self.handler.store().touch(uid);
        }
        self.activity = Activity {
            timestamp: Some(now_millis()),
            database,
        };

        let frames = match encode_response_frames(&response, compress) {
            Ok(frames) => Some(frames),
            Err(e) => {
                tracing::warn!(worker = %self.id, error = %e, "Failed to encode response");
                encode_response_frames(&Response::from(e), false).ok()
            }
        };

        if let Some(frames) = frames {
            let reply = Reply {
                client: envelope.client,
                frames,
            };
            if envelope.reply_to.send(reply).is_err() {
                tracing::debug!(worker = %self.id, client = envelope.client, "Client left before reply");
            }
        }

        self.state = WorkerState::Idle;
    }
}

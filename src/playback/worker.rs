// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background decode loop.
//!
//! The worker owns the frame source. It receives commands tagged with a
//! generation number and tags every frame it sends back with the
//! generation that asked for it. Only the newest pending command is
//! acted on, so a burst of seeks decodes just the last target.

use crate::io::media::{Frame, FrameSource};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Decode and send a single frame.
    Seek { frame: u64, generation: u64 },
    /// Send frames from `from` (inclusive) onward at the source frame rate.
    Play { from: u64, generation: u64 },
    Pause { generation: u64 },
    Shutdown,
}

#[derive(Debug)]
pub enum WorkerEvent {
    Frame { generation: u64, frame: Frame },
    EndOfStream { generation: u64 },
    Failed { generation: u64, message: String },
}

struct PlayCursor {
    next: u64,
    generation: u64,
    deadline: Instant,
}

/// Run until `Shutdown` arrives or either channel is closed.
pub fn run(mut source: Box<dyn FrameSource>, commands: Receiver<WorkerCommand>, events: Sender<WorkerEvent>) {
    let interval = source.metadata().frame_interval();
    let frame_count = source.metadata().frame_count;
    let mut cursor: Option<PlayCursor> = None;

    loop {
        let received = match &cursor {
            Some(c) => {
                let wait = c.deadline.saturating_duration_since(Instant::now());
                match commands.recv_timeout(wait) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };

        if let Some(mut command) = received {
            // Older commands are superseded by newer generations.
            while let Ok(newer) = commands.try_recv() {
                if command == WorkerCommand::Shutdown {
                    break;
                }
                command = newer;
            }

            match command {
                WorkerCommand::Shutdown => break,
                WorkerCommand::Pause { .. } => cursor = None,
                WorkerCommand::Seek { frame, generation } => {
                    cursor = None;
                    if deliver(source.as_mut(), frame, generation, &events) == Delivery::Disconnected {
                        break;
                    }
                }
                WorkerCommand::Play { from, generation } => {
                    cursor = Some(PlayCursor {
                        next: from,
                        generation,
                        deadline: Instant::now(),
                    });
                }
            }
            continue;
        }

        let Some(c) = cursor.as_mut() else { continue };
        if c.next >= frame_count {
            let generation = c.generation;
            cursor = None;
            if events.send(WorkerEvent::EndOfStream { generation }).is_err() {
                break;
            }
            continue;
        }

        match deliver(source.as_mut(), c.next, c.generation, &events) {
            Delivery::Sent => {}
            Delivery::Failed => {
                cursor = None;
                continue;
            }
            Delivery::Disconnected => break,
        }
        c.next += 1;
        c.deadline += interval;
        let now = Instant::now();
        if c.deadline < now {
            // Decoding fell behind; don't burst to catch up.
            c.deadline = now;
        }
    }
    log::debug!("Decode worker exiting");
}

#[derive(Debug, PartialEq, Eq)]
enum Delivery {
    Sent,
    Failed,
    Disconnected,
}

/// Decode one frame and send it, or report why it could not be.
fn deliver(source: &mut dyn FrameSource, index: u64, generation: u64, events: &Sender<WorkerEvent>) -> Delivery {
    let (event, outcome) = match source.read_frame(index) {
        Ok(frame) => (WorkerEvent::Frame { generation, frame }, Delivery::Sent),
        Err(e) => {
            log::error!("Failed to decode frame {}: {}", index, e);
            let message = e.to_string();
            (WorkerEvent::Failed { generation, message }, Delivery::Failed)
        }
    };
    match events.send(event) {
        Ok(()) => outcome,
        Err(_) => Delivery::Disconnected,
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback controller.
//!
//! Owns the transport state (stopped, playing, paused), a background
//! decode worker and the audio sink. All methods are called from the UI
//! thread; decoded frames come back over a channel and are picked up by
//! [`PlaybackController::poll`]. Every request bumps a generation
//! counter and frames produced for an older generation are dropped, so
//! a seek always wins over work still in flight.

pub mod audio;
mod worker;

use crate::error::{Error, Result};
use crate::io::media::{Frame, FrameSource};
use crate::models::metadata::VideoMetadata;
use audio::AudioSink;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;
use worker::{WorkerCommand, WorkerEvent};

/// Transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Clamp a requested frame into `[0, frame_count - 1]`.
pub fn clamp_frame(target: i64, frame_count: u64) -> u64 {
    if target <= 0 || frame_count == 0 {
        0
    } else {
        (target as u64).min(frame_count - 1)
    }
}

pub struct PlaybackController {
    metadata: VideoMetadata,
    state: PlaybackState,
    generation: u64,
    current_frame: u64,
    /// Index of the last current-generation frame handed out.
    shown_frame: Option<u64>,
    commands: Option<Sender<WorkerCommand>>,
    events: Receiver<WorkerEvent>,
    worker: Option<JoinHandle<()>>,
    audio: Box<dyn AudioSink>,
    last_error: Option<String>,
}

impl PlaybackController {
    /// Start a session on `source`. Lands in `Paused` with frame 0 requested.
    pub fn open(source: Box<dyn FrameSource>, mut audio: Box<dyn AudioSink>) -> Result<Self> {
        let metadata = source.metadata().clone();
        if metadata.frame_count == 0 {
            return Err(Error::media(&metadata.source, "media contains no frames"));
        }

        let (command_tx, command_rx) = channel();
        let (event_tx, event_rx) = channel();
        let worker = std::thread::Builder::new()
            .name("decode".into())
            .spawn(move || worker::run(source, command_rx, event_tx))
            .map_err(|e| Error::media(&metadata.source, e))?;

        audio.seek(Duration::ZERO);
        let mut controller = Self {
            metadata,
            state: PlaybackState::Paused,
            generation: 0,
            current_frame: 0,
            shown_frame: None,
            commands: Some(command_tx),
            events: event_rx,
            worker: Some(worker),
            audio,
            last_error: None,
        };
        let generation = controller.next_generation();
        controller.send(WorkerCommand::Seek { frame: 0, generation });
        log::info!(
            "Playback opened for {} ({} frames at {:.2} fps)",
            controller.metadata.source,
            controller.metadata.frame_count,
            controller.metadata.frame_rate
        );
        Ok(controller)
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Index of the frame on display (or being fetched after a seek).
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    /// Position reported by the audio output.
    pub fn audio_position(&self) -> Duration {
        self.audio.position()
    }

    /// Most recent decode failure, if any.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn send(&mut self, command: WorkerCommand) {
        let sent = self.commands.as_ref().map(|tx| tx.send(command).is_ok());
        if sent == Some(false) {
            log::error!("Decode worker is gone; dropping {:?}", command);
            self.last_error = Some("video decoder stopped unexpectedly".into());
        }
    }

    pub fn play(&mut self) {
        if self.state != PlaybackState::Paused {
            log::warn!("Ignoring play while {:?}", self.state);
            return;
        }
        // A seek still in flight has not shown its frame yet.
        let from = match self.shown_frame {
            Some(shown) if shown == self.current_frame => shown + 1,
            _ => self.current_frame,
        };
        let generation = self.next_generation();
        self.send(WorkerCommand::Play { from, generation });
        self.audio.start(self.metadata.time_of(self.current_frame));
        self.state = PlaybackState::Playing;
        log::info!("Playing from frame {}", self.current_frame);
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            log::warn!("Ignoring pause while {:?}", self.state);
            return;
        }
        let generation = self.next_generation();
        self.send(WorkerCommand::Pause { generation });
        self.audio.pause();
        self.state = PlaybackState::Paused;
        log::info!("Paused at frame {}", self.current_frame);
    }

    pub fn toggle_play(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.play(),
            PlaybackState::Stopped => {}
        }
    }

    /// Jump to a frame, clamped to the video. Always lands in `Paused`.
    /// Returns the frame actually targeted.
    pub fn seek(&mut self, target: i64) -> u64 {
        if self.state == PlaybackState::Stopped {
            log::warn!("Ignoring seek while stopped");
            return self.current_frame;
        }
        let frame = clamp_frame(target, self.metadata.frame_count);
        let generation = self.next_generation();
        self.send(WorkerCommand::Seek { frame, generation });
        if self.state == PlaybackState::Playing {
            self.audio.pause();
        }
        self.audio.seek(self.metadata.time_of(frame));
        self.current_frame = frame;
        self.shown_frame = None;
        self.state = PlaybackState::Paused;
        log::debug!("Seek to frame {} (requested {})", frame, target);
        frame
    }

    /// Seek relative to the current frame.
    pub fn step(&mut self, delta: i64) -> u64 {
        self.seek(self.current_frame as i64 + delta)
    }

    /// Stop the worker and release the source and audio.
    pub fn stop(&mut self) {
        if self.state == PlaybackState::Stopped {
            return;
        }
        self.send(WorkerCommand::Shutdown);
        self.commands = None;
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Decode worker panicked");
            }
        }
        self.audio.stop();
        self.state = PlaybackState::Stopped;
        log::info!("Playback stopped for {}", self.metadata.source);
    }

    /// Handle one worker event. Returns a frame when it belongs to the
    /// current generation.
    fn handle(&mut self, event: WorkerEvent) -> Option<Frame> {
        match event {
            WorkerEvent::Frame { generation, frame } if generation == self.generation => {
                self.current_frame = frame.index;
                self.shown_frame = Some(frame.index);
                Some(frame)
            }
            WorkerEvent::EndOfStream { generation } if generation == self.generation => {
                if self.state == PlaybackState::Playing {
                    self.audio.pause();
                    self.state = PlaybackState::Paused;
                    log::info!("Reached end of video at frame {}", self.current_frame);
                }
                None
            }
            WorkerEvent::Failed { generation, message } if generation == self.generation => {
                if self.state == PlaybackState::Playing {
                    self.audio.pause();
                    self.state = PlaybackState::Paused;
                }
                self.last_error = Some(message);
                None
            }
            stale => {
                log::trace!("Discarding stale worker event {:?}", event_generation(&stale));
                None
            }
        }
    }

    /// Drain pending worker events without blocking. Returns the frames
    /// of the current generation in delivery order.
    pub fn poll(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if let Some(frame) = self.handle(event) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Block up to `timeout` for the next current-generation frame.
    /// Returns `None` on timeout, end of stream or decode failure.
    #[cfg(test)]
    pub fn recv_frame(&mut self, timeout: Duration) -> Option<Frame> {
        use std::sync::mpsc::RecvTimeoutError;
        use std::time::Instant;

        let deadline = Instant::now() + timeout;
        loop {
            let wait = deadline.saturating_duration_since(Instant::now());
            let event = match self.events.recv_timeout(wait) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            };
            let terminal = matches!(
                &event,
                WorkerEvent::EndOfStream { generation } | WorkerEvent::Failed { generation, .. }
                    if *generation == self.generation
            );
            if let Some(frame) = self.handle(event) {
                return Some(frame);
            }
            if terminal {
                return None;
            }
        }
    }
}

fn event_generation(event: &WorkerEvent) -> u64 {
    match event {
        WorkerEvent::Frame { generation, .. }
        | WorkerEvent::EndOfStream { generation }
        | WorkerEvent::Failed { generation, .. } => *generation,
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop();
    }
}

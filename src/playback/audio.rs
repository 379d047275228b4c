// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Audio output kept in lockstep with video playback.

use std::time::{Duration, Instant};

/// An audio output the playback controller starts, pauses and seeks
/// together with the video.
pub trait AudioSink: Send {
    /// Begin (or resume) output at `position`.
    fn start(&mut self, position: Duration);
    fn pause(&mut self);
    /// Jump to `position` without changing the play/pause state.
    fn seek(&mut self, position: Duration);
    /// Stop output and release the device.
    fn stop(&mut self);
    /// Current output position.
    fn position(&self) -> Duration;
}

/// Audio sink without a device. It keeps the clock an output device
/// would report so the rest of the app can read a consistent position.
#[derive(Debug, Clone, Default)]
pub struct NullAudio {
    playing: bool,
    anchor_instant: Option<Instant>,
    anchor_position: Duration,
}

impl NullAudio {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl AudioSink for NullAudio {
    fn start(&mut self, position: Duration) {
        self.playing = true;
        self.anchor_position = position;
        self.anchor_instant = Some(Instant::now());
        log::debug!("Audio started at {:?}", position);
    }

    fn pause(&mut self) {
        self.anchor_position = self.position();
        self.playing = false;
        self.anchor_instant = None;
        log::debug!("Audio paused at {:?}", self.anchor_position);
    }

    fn seek(&mut self, position: Duration) {
        self.anchor_position = position;
        if self.playing {
            self.anchor_instant = Some(Instant::now());
        }
        log::debug!("Audio seeked to {:?}", position);
    }

    fn stop(&mut self) {
        self.playing = false;
        self.anchor_instant = None;
        self.anchor_position = Duration::ZERO;
        log::debug!("Audio stopped");
    }

    fn position(&self) -> Duration {
        match (self.playing, self.anchor_instant) {
            (true, Some(anchor)) => self.anchor_position + anchor.elapsed(),
            _ => self.anchor_position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paused_clock_holds_position() {
        let mut audio = NullAudio::new();
        audio.seek(Duration::from_secs(3));
        assert_eq!(audio.position(), Duration::from_secs(3));
        assert!(!audio.is_playing());
    }

    #[test]
    fn test_running_clock_advances() {
        let mut audio = NullAudio::new();
        audio.start(Duration::from_secs(1));
        std::thread::sleep(Duration::from_millis(20));
        audio.pause();
        let paused_at = audio.position();
        assert!(paused_at >= Duration::from_millis(1020));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(audio.position(), paused_at);

        audio.stop();
        assert_eq!(audio.position(), Duration::ZERO);
    }
}

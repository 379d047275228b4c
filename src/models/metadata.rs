// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video session metadata.
//!
//! Describes the media that is currently open: where it came from, its
//! frame rate, frame count and resolution. The values are fixed for the
//! lifetime of a session.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Audio stream description recorded alongside the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioInfo {
    /// Build from the sample rate and channel count a decoder reports.
    /// Decoders report zero (or nothing sensible) when there is no audio.
    #[cfg_attr(not(feature = "video-opencv"), allow(dead_code))]
    pub fn from_reported(sample_rate: f64, channels: f64) -> Option<Self> {
        if !(1.0..=u32::MAX as f64).contains(&sample_rate) || !(1.0..=u16::MAX as f64).contains(&channels) {
            return None;
        }
        Some(Self {
            sample_rate: sample_rate.round() as u32,
            channels: channels.round() as u16,
        })
    }
}

/// Properties of the open video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub source: String,
    pub frame_rate: f64,
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
    pub audio: Option<AudioInfo>,
}

impl VideoMetadata {
    pub fn new(source: impl Into<String>, frame_rate: f64, frame_count: u64, width: u32, height: u32) -> Self {
        Self {
            source: source.into(),
            frame_rate,
            frame_count,
            width,
            height,
            audio: None,
        }
    }

    #[cfg_attr(not(feature = "video-opencv"), allow(dead_code))]
    pub fn with_audio(mut self, audio: AudioInfo) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Total length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.frame_rate > 0.0 {
            self.frame_count as f64 / self.frame_rate
        } else {
            0.0
        }
    }

    /// Time between two consecutive frames.
    pub fn frame_interval(&self) -> Duration {
        if self.frame_rate > 0.0 {
            Duration::from_secs_f64(1.0 / self.frame_rate)
        } else {
            Duration::ZERO
        }
    }

    /// Presentation time of a frame.
    pub fn time_of(&self, frame: u64) -> Duration {
        if self.frame_rate > 0.0 {
            Duration::from_secs_f64(frame as f64 / self.frame_rate)
        } else {
            Duration::ZERO
        }
    }

    pub fn last_frame(&self) -> u64 {
        self.frame_count.saturating_sub(1)
    }

    /// `HH:MM:SS` timer text for a frame.
    pub fn timer_text(&self, frame: u64) -> String {
        let secs = self.time_of(frame).as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_and_timing() {
        let meta = VideoMetadata::new("clip.mp4", 25.0, 100, 640, 480);
        assert!((meta.duration_secs() - 4.0).abs() < 1e-9);
        assert_eq!(meta.frame_interval(), Duration::from_millis(40));
        assert_eq!(meta.time_of(50), Duration::from_secs(2));
        assert_eq!(meta.last_frame(), 99);
    }

    #[test]
    fn test_timer_text() {
        let meta = VideoMetadata::new("clip.mp4", 1.0, 4000, 640, 480);
        assert_eq!(meta.timer_text(0), "00:00:00");
        assert_eq!(meta.timer_text(3725), "01:02:05");
    }

    #[test]
    fn test_reported_audio() {
        assert_eq!(
            AudioInfo::from_reported(44100.0, 2.0),
            Some(AudioInfo { sample_rate: 44100, channels: 2 })
        );
        assert_eq!(AudioInfo::from_reported(0.0, 0.0), None);
        assert_eq!(AudioInfo::from_reported(48000.0, 0.0), None);
        assert_eq!(AudioInfo::from_reported(f64::NAN, 2.0), None);

        let meta = VideoMetadata::new("clip.mp4", 25.0, 100, 640, 480);
        let with = meta.clone().with_audio(AudioInfo { sample_rate: 48000, channels: 1 });
        assert_eq!(with.audio.map(|a| a.channels), Some(1));
        assert_eq!(meta.audio, None);
    }

    #[test]
    fn test_zero_frame_rate_is_safe() {
        let meta = VideoMetadata::new("still.png", 0.0, 1, 10, 10);
        assert_eq!(meta.duration_secs(), 0.0);
        assert_eq!(meta.frame_interval(), Duration::ZERO);
    }
}

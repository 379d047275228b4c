// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! On-disk document layout.
//!
//! A saved document pairs the video metadata with every annotation,
//! grouped under the decimal frame index they belong to:
//!
//! ```json
//! {
//!   "metadata": {
//!     "source": "clip.mp4",
//!     "frame_rate": 25.0,
//!     "resolution": { "width": 640, "height": 480 },
//!     "duration": 0.4,
//!     "frame_count": 10
//!   },
//!   "annotations": { "3": [ { "id": "...", "shape": "rectangle", ... } ] }
//! }
//! ```

use super::annotation::Annotation;
use super::metadata::{AudioInfo, VideoMetadata};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// The `metadata` object of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub frame_rate: f64,
    pub resolution: Resolution,
    /// Length of the video in seconds.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioInfo>,
}

impl From<&VideoMetadata> for DocumentMetadata {
    fn from(meta: &VideoMetadata) -> Self {
        Self {
            source: meta.source.clone(),
            frame_rate: meta.frame_rate,
            resolution: Resolution {
                width: meta.width,
                height: meta.height,
            },
            duration: meta.duration_secs(),
            frame_count: Some(meta.frame_count),
            audio: meta.audio,
        }
    }
}

impl DocumentMetadata {
    /// Validate and convert into session metadata.
    ///
    /// A missing `frame_count` is derived from duration and frame rate.
    pub fn to_video_metadata(&self) -> Result<VideoMetadata> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(Error::MalformedDocument(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(Error::MalformedDocument(format!(
                "duration must be non-negative, got {}",
                self.duration
            )));
        }
        let frame_count = self
            .frame_count
            .unwrap_or_else(|| (self.duration * self.frame_rate).round() as u64);

        Ok(VideoMetadata {
            source: self.source.clone(),
            frame_rate: self.frame_rate,
            frame_count,
            width: self.resolution.width,
            height: self.resolution.height,
            audio: self.audio,
        })
    }
}

/// Complete document for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub annotations: BTreeMap<String, Vec<Annotation>>,
}

impl PersistedDocument {
    /// Parse a JSON document, mapping schema violations to `MalformedDocument`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::MalformedDocument(e.to_string()))
    }

    /// Parse a YAML document, mapping schema violations to `MalformedDocument`.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::MalformedDocument(e.to_string()))
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_metadata_is_malformed() {
        let err = PersistedDocument::from_json(r#"{"annotations": {}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let json = r#"{"metadata": {"source": "a.mp4", "frame_rate": 25.0, "duration": 1.0}}"#;
        let err = PersistedDocument::from_json(json).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_frame_count_derived_from_duration() {
        let json = r#"{
            "metadata": {
                "source": "a.mp4",
                "frame_rate": 30.0,
                "resolution": {"width": 320, "height": 240},
                "duration": 2.0
            }
        }"#;
        let doc = PersistedDocument::from_json(json).unwrap();
        assert!(doc.annotations.is_empty());
        let meta = doc.metadata.to_video_metadata().unwrap();
        assert_eq!(meta.frame_count, 60);
        assert_eq!((meta.width, meta.height), (320, 240));
    }

    #[test]
    fn test_audio_info_survives_json() {
        let meta = VideoMetadata::new("talk.mp4", 25.0, 50, 640, 360).with_audio(AudioInfo {
            sample_rate: 48_000,
            channels: 2,
        });
        let doc = PersistedDocument {
            metadata: DocumentMetadata::from(&meta),
            annotations: BTreeMap::new(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"sample_rate\":48000"));
        let back = PersistedDocument::from_json(&json).unwrap();
        assert_eq!(back.metadata.to_video_metadata().unwrap(), meta);
    }

    #[test]
    fn test_non_positive_frame_rate_rejected() {
        let meta = DocumentMetadata {
            source: "a.mp4".into(),
            frame_rate: 0.0,
            resolution: Resolution { width: 1, height: 1 },
            duration: 1.0,
            frame_count: None,
            audio: None,
        };
        assert!(matches!(meta.to_video_metadata(), Err(Error::MalformedDocument(_))));
    }
}

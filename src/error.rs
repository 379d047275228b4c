// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types shared by the store, media and persistence layers.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced to the UI as dismissible notices.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Frame index {frame} is outside the video (0..{frame_count})")]
    InvalidFrameIndex { frame: u64, frame_count: u64 },

    #[error("No annotation {id} on frame {frame}")]
    AnnotationNotFound { frame: u64, id: Uuid },

    #[error("Malformed annotation document: {0}")]
    MalformedDocument(String),

    #[error("Failed to open media {}: {reason}", .path.display())]
    MediaOpenFailure { path: PathBuf, reason: String },

    #[error("Could not read or write {}: {source}", .path.display())]
    PersistenceFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Build a `MediaOpenFailure` from any displayable cause.
    pub fn media(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::MediaOpenFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a `PersistenceFailure` for the given path.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::PersistenceFailure {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

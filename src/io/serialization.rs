// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation document reading and writing.
//!
//! Documents are saved as JSON, or as YAML when the target path ends in
//! `.yaml`/`.yml`. Writes go to a uniquely named temporary file next to the
//! target and are renamed over it once synced, so an interrupted save never
//! damages an existing document.

use crate::error::{Error, Result};
use crate::models::document::PersistedDocument;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File format chosen from a path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Default document location for a media file:
/// `<output_dir>/<stem>_annotated.json`, next to the media when no
/// output directory is configured.
pub fn default_document_path(media: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = media
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "annotations".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| media.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}_annotated.json", stem))
}

/// Save a document, choosing the format from the path.
pub fn save_document(document: &PersistedDocument, path: &Path) -> Result<()> {
    let contents = match DocumentFormat::from_path(path) {
        DocumentFormat::Json => serde_json::to_string_pretty(document)
            .map_err(|e| Error::persistence(path, std::io::Error::other(e)))?,
        DocumentFormat::Yaml => serde_yaml::to_string(document)
            .map_err(|e| Error::persistence(path, std::io::Error::other(e)))?,
    };
    write_atomic(path, contents.as_bytes()).map_err(|e| Error::persistence(path, e))?;
    log::info!(
        "Saved {} annotations to {}",
        document.annotation_count(),
        path.display()
    );
    Ok(())
}

/// Load a document, choosing the format from the path.
pub fn load_document(path: &Path) -> Result<PersistedDocument> {
    let contents = fs::read_to_string(path).map_err(|e| Error::persistence(path, e))?;
    let document = match DocumentFormat::from_path(path) {
        DocumentFormat::Json => PersistedDocument::from_json(&contents)?,
        DocumentFormat::Yaml => PersistedDocument::from_yaml(&contents)?,
    };
    log::info!(
        "Read {} annotations from {}",
        document.annotation_count(),
        path.display()
    );
    Ok(document)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir
        }
        None => Path::new("."),
    };
    // Dropped (and removed) on any error before the rename.
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

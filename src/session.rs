// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! An open video: its playback controller plus its annotation store.
//!
//! The session is owned by the UI thread and is the single owner of the
//! store. Playback results reach it only through the controller's
//! channel, never by mutating session state from another thread.

use crate::error::Result;
use crate::io::media::{Frame, FrameSource};
use crate::io::serialization::default_document_path;
use crate::models::annotation::Annotation;
use crate::models::document::PersistedDocument;
use crate::models::metadata::VideoMetadata;
use crate::models::store::{AnnotationStore, StoreCommand};
use crate::playback::audio::AudioSink;
use crate::playback::PlaybackController;
use std::path::{Path, PathBuf};

pub struct Session {
    media_path: PathBuf,
    document_path: PathBuf,
    store: AnnotationStore,
    playback: PlaybackController,
    dirty: bool,
    /// Bumped on every change to the annotations.
    revision: u64,
}

impl Session {
    /// Start a session for media opened from `media_path`.
    pub fn open(
        media_path: &Path,
        source: Box<dyn FrameSource>,
        audio: Box<dyn AudioSink>,
        output_dir: Option<&Path>,
    ) -> Result<Self> {
        let store = AnnotationStore::new(source.metadata().clone());
        let playback = PlaybackController::open(source, audio)?;
        Ok(Self {
            media_path: media_path.to_path_buf(),
            document_path: default_document_path(media_path, output_dir),
            store,
            playback,
            dirty: false,
            revision: 0,
        })
    }

    pub fn media_path(&self) -> &Path {
        &self.media_path
    }

    /// Where the next save goes unless the user picks another path.
    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn metadata(&self) -> &VideoMetadata {
        self.playback.metadata()
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackController {
        &mut self.playback
    }

    /// Unsaved edits exist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Identifies the current annotation contents; pair it with a
    /// [`Session::document`] snapshot and hand it back to
    /// [`Session::mark_saved`].
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn current_frame(&self) -> u64 {
        self.playback.current_frame()
    }

    /// Annotations on the frame currently shown.
    pub fn current_annotations(&self) -> &[Annotation] {
        self.store.get(self.playback.current_frame())
    }

    /// Apply a store command; the store is unchanged on error.
    pub fn apply(&mut self, command: StoreCommand) -> Result<()> {
        self.store.apply(command)?;
        self.dirty = true;
        self.revision += 1;
        Ok(())
    }

    /// Add an annotation to the frame currently shown.
    pub fn annotate(&mut self, annotation: Annotation) -> Result<()> {
        let frame = self.playback.current_frame();
        self.apply(StoreCommand::Add { frame, annotation })
    }

    /// Pick up decoded frames; returns the newest one.
    pub fn poll_frame(&mut self) -> Option<Frame> {
        self.playback.poll().pop()
    }

    /// Snapshot for saving.
    pub fn document(&self) -> PersistedDocument {
        self.store.serialize()
    }

    /// Record that the snapshot taken at `revision` was written to
    /// `path`. Edits made since then keep the session dirty.
    pub fn mark_saved(&mut self, path: PathBuf, revision: u64) {
        self.document_path = path;
        if revision == self.revision {
            self.dirty = false;
        } else {
            log::debug!("Saved revision {} but session is at {}", revision, self.revision);
        }
    }

    /// Replace the annotations with a loaded document.
    ///
    /// The open video's metadata stays in charge. Annotations must fit
    /// inside the open video; otherwise nothing changes.
    pub fn load_document(&mut self, document: &PersistedDocument, path: PathBuf) -> Result<()> {
        let candidate = AnnotationStore::from_document(document)?;
        let source = candidate.metadata().source.clone();
        self.store.replace_frames(candidate)?;
        if source != self.metadata().source {
            log::warn!(
                "Document was made for {} but {} is open",
                source,
                self.metadata().source
            );
        }
        self.document_path = path;
        self.dirty = false;
        self.revision += 1;
        Ok(())
    }

    /// Stop playback and release media resources.
    pub fn close(mut self) {
        self.playback.stop();
        log::info!("Closed session for {}", self.media_path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::io::media::SyntheticSource;
    use crate::io::serialization::{load_document, save_document};
    use crate::models::annotation::{Point, ShapeKind};
    use crate::playback::audio::NullAudio;
    use std::time::Duration;
    use tempfile::tempdir;

    const WAIT: Duration = Duration::from_secs(2);

    fn open_synthetic(dir: &Path) -> Session {
        let source = SyntheticSource::new(10, 64, 48, 25.0);
        Session::open(
            &dir.join("synthetic.mp4"),
            Box::new(source),
            Box::new(NullAudio::new()),
            Some(dir),
        )
        .unwrap()
    }

    fn dot(x: f64, y: f64) -> Annotation {
        Annotation::with_points(ShapeKind::Point, vec![Point::new(x, y)])
    }

    #[test]
    fn test_annotate_save_reopen() {
        let dir = tempdir().unwrap();
        let mut session = open_synthetic(dir.path());
        assert_eq!(session.document_path(), dir.path().join("synthetic_annotated.json"));

        let rect = Annotation::with_points(
            ShapeKind::Rectangle,
            vec![Point::new(4.0, 5.0), Point::new(30.5, 22.25)],
        )
        .labeled("box");
        let point = dot(12.0, 40.0);

        session.playback_mut().seek(3);
        assert_eq!(session.playback_mut().recv_frame(WAIT).unwrap().index, 3);
        session.annotate(rect.clone()).unwrap();

        session.playback_mut().seek(7);
        session.annotate(point.clone()).unwrap();
        assert!(session.is_dirty());

        let path = session.document_path().to_path_buf();
        save_document(&session.document(), &path).unwrap();
        session.mark_saved(path.clone(), session.revision());
        assert!(!session.is_dirty());
        session.close();

        let mut reopened = open_synthetic(dir.path());
        let document = load_document(&path).unwrap();
        reopened.load_document(&document, path).unwrap();

        let store = reopened.store();
        assert_eq!(store.frames().collect::<Vec<_>>(), vec![3, 7]);
        assert_eq!(store.get(3), &[rect]);
        assert_eq!(store.get(7), &[point]);
        assert_eq!(store.get(7)[0].points, vec![Point::new(12.0, 40.0)]);
        reopened.close();
    }

    #[test]
    fn test_loaded_document_keeps_open_video_metadata() {
        let dir = tempdir().unwrap();
        let mut session = open_synthetic(dir.path());
        let video = session.metadata().clone();

        // Made for a shorter, different video.
        let mut shorter = AnnotationStore::new(VideoMetadata::new("other.mp4", 30.0, 5, 1920, 1080));
        shorter.add(2, dot(3.0, 3.0)).unwrap();
        session
            .load_document(&shorter.serialize(), dir.path().join("other.json"))
            .unwrap();
        assert_eq!(session.store().metadata(), &video);

        // Frame 7 exists in the open video even though the document stopped at 5.
        session.playback_mut().seek(7);
        session.annotate(dot(9.0, 9.0)).unwrap();

        let saved = session.document();
        assert_eq!(saved.metadata.source, video.source);
        assert_eq!(saved.metadata.frame_rate, 25.0);
        assert_eq!((saved.metadata.resolution.width, saved.metadata.resolution.height), (64, 48));
        assert_eq!(saved.metadata.frame_count, Some(10));
        assert_eq!(saved.annotation_count(), 2);
        session.close();
    }

    #[test]
    fn test_failed_load_keeps_current_annotations() {
        let dir = tempdir().unwrap();
        let mut session = open_synthetic(dir.path());
        session.annotate(dot(1.0, 1.0)).unwrap();
        let before = session.store().clone();

        // Made for a longer video: frame 50 does not exist here.
        let mut longer = AnnotationStore::new(VideoMetadata::new("long.mp4", 25.0, 100, 64, 48));
        longer.add(50, dot(2.0, 2.0)).unwrap();
        let err = session.load_document(&longer.serialize(), dir.path().join("long.json"));
        assert!(matches!(err, Err(Error::MalformedDocument(_))));
        assert_eq!(session.store(), &before);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_edit_during_save_stays_dirty() {
        let dir = tempdir().unwrap();
        let mut session = open_synthetic(dir.path());
        session.annotate(dot(1.0, 1.0)).unwrap();

        let snapshot = session.document();
        let revision = session.revision();
        session.annotate(dot(2.0, 2.0)).unwrap();

        let path = session.document_path().to_path_buf();
        save_document(&snapshot, &path).unwrap();
        session.mark_saved(path, revision);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_invalid_command_leaves_session_clean() {
        let dir = tempdir().unwrap();
        let mut session = open_synthetic(dir.path());
        let err = session.apply(StoreCommand::Remove {
            frame: 0,
            id: uuid::Uuid::new_v4(),
        });
        assert!(matches!(err, Err(Error::AnnotationNotFound { .. })));
        assert!(!session.is_dirty());
        assert_eq!(session.revision(), 0);
    }
}

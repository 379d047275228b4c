// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame-indexed annotation store.
//!
//! The store maps a frame index to the annotations drawn on that frame,
//! in the order they were drawn. Frames without annotations have no
//! entry at all. Every operation either succeeds completely or leaves
//! the store untouched.

use super::annotation::Annotation;
use super::document::{DocumentMetadata, PersistedDocument};
use super::history::History;
use super::metadata::VideoMetadata;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use uuid::Uuid;

type FrameMap = BTreeMap<u64, Vec<Annotation>>;

/// A mutation requested by the UI.
#[derive(Debug, Clone)]
pub enum StoreCommand {
    Add { frame: u64, annotation: Annotation },
    Update { frame: u64, id: Uuid, annotation: Annotation },
    Remove { frame: u64, id: Uuid },
    /// Remove every annotation on every frame.
    Clear,
    Undo,
    Redo,
}

/// Annotations for one open video.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    metadata: VideoMetadata,
    frames: FrameMap,
    history: History<FrameMap>,
}

impl PartialEq for AnnotationStore {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata && self.frames == other.frames
    }
}

impl AnnotationStore {
    /// Create an empty store for the given video.
    pub fn new(metadata: VideoMetadata) -> Self {
        Self {
            metadata,
            frames: BTreeMap::new(),
            history: History::default(),
        }
    }

    /// Build a store from a loaded document.
    pub fn from_document(document: &PersistedDocument) -> Result<Self> {
        let metadata = document.metadata.to_video_metadata()?;
        let frames = parse_frames(document, metadata.frame_count)?;
        Ok(Self {
            metadata,
            frames,
            history: History::default(),
        })
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    pub fn frame_count(&self) -> u64 {
        self.metadata.frame_count
    }

    fn check_frame(&self, frame: u64) -> Result<()> {
        if frame >= self.metadata.frame_count {
            return Err(Error::InvalidFrameIndex {
                frame,
                frame_count: self.metadata.frame_count,
            });
        }
        Ok(())
    }

    fn position(&self, frame: u64, id: Uuid) -> Result<usize> {
        self.frames
            .get(&frame)
            .and_then(|list| list.iter().position(|a| a.id == id))
            .ok_or(Error::AnnotationNotFound { frame, id })
    }

    /// Append an annotation to a frame.
    pub fn add(&mut self, frame: u64, annotation: Annotation) -> Result<()> {
        self.check_frame(frame)?;
        self.frames.entry(frame).or_default().push(annotation);
        log::debug!("Added annotation on frame {}", frame);
        Ok(())
    }

    /// Replace an annotation in place. The stored id is kept.
    pub fn update(&mut self, frame: u64, id: Uuid, mut annotation: Annotation) -> Result<()> {
        let index = self.position(frame, id)?;
        annotation.id = id;
        if let Some(list) = self.frames.get_mut(&frame) {
            list[index] = annotation;
        }
        log::debug!("Updated annotation {} on frame {}", id, frame);
        Ok(())
    }

    /// Delete an annotation, dropping the frame entry once it is empty.
    pub fn remove(&mut self, frame: u64, id: Uuid) -> Result<Annotation> {
        let index = self.position(frame, id)?;
        let list = self
            .frames
            .get_mut(&frame)
            .ok_or(Error::AnnotationNotFound { frame, id })?;
        let removed = list.remove(index);
        if list.is_empty() {
            self.frames.remove(&frame);
        }
        log::debug!("Removed annotation {} from frame {}", id, frame);
        Ok(removed)
    }

    /// Annotations on a frame in drawing order; empty when there are none.
    pub fn get(&self, frame: u64) -> &[Annotation] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Locate an annotation by id anywhere in the store.
    pub fn find(&self, id: Uuid) -> Option<(u64, &Annotation)> {
        self.frames
            .iter()
            .find_map(|(frame, list)| list.iter().find(|a| a.id == id).map(|a| (*frame, a)))
    }

    /// Annotated frame indices in ascending order.
    pub fn frames(&self) -> impl Iterator<Item = u64> + '_ {
        self.frames.keys().copied()
    }

    pub fn annotation_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Remove every annotation. Undoable through [`StoreCommand::Clear`].
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Annotations on the `span` frames before `frame`, oldest first.
    pub fn earlier(&self, frame: u64, span: u64) -> impl Iterator<Item = (u64, &Annotation)> + '_ {
        self.frames
            .range(frame.saturating_sub(span)..frame)
            .flat_map(|(f, list)| list.iter().map(move |a| (*f, a)))
    }

    /// Take over the annotations of `other` while keeping this store's
    /// video metadata. Fails without changes when any of them lies
    /// outside this video. History starts over.
    pub fn replace_frames(&mut self, other: AnnotationStore) -> Result<()> {
        if let Some(frame) = other.frames().find(|f| *f >= self.frame_count()) {
            return Err(Error::MalformedDocument(format!(
                "annotations on frame {} but the video has {} frames",
                frame,
                self.frame_count()
            )));
        }
        self.frames = other.frames;
        self.history.clear();
        Ok(())
    }

    /// Produce the on-disk document.
    pub fn serialize(&self) -> PersistedDocument {
        PersistedDocument {
            metadata: DocumentMetadata::from(&self.metadata),
            annotations: self
                .frames
                .iter()
                .map(|(frame, list)| (frame.to_string(), list.clone()))
                .collect(),
        }
    }

    /// Replace metadata and contents from a document.
    ///
    /// The document is validated in full before anything is replaced.
    pub fn deserialize(&mut self, document: &PersistedDocument) -> Result<()> {
        let loaded = Self::from_document(document)?;
        *self = loaded;
        log::info!(
            "Loaded {} annotations across {} frames for {}",
            self.annotation_count(),
            self.frames.len(),
            self.metadata.source
        );
        Ok(())
    }

    /// Apply a UI command, recording it for undo when it changes the store.
    pub fn apply(&mut self, command: StoreCommand) -> Result<()> {
        let snapshot = self.frames.clone();
        match command {
            StoreCommand::Add { frame, annotation } => self.add(frame, annotation)?,
            StoreCommand::Update { frame, id, annotation } => self.update(frame, id, annotation)?,
            StoreCommand::Remove { frame, id } => {
                self.remove(frame, id)?;
            }
            StoreCommand::Clear => self.clear(),
            StoreCommand::Undo => {
                if let Some(previous) = self.history.undo(snapshot) {
                    self.frames = previous;
                    log::info!("Undo");
                }
                return Ok(());
            }
            StoreCommand::Redo => {
                if let Some(next) = self.history.redo(snapshot) {
                    self.frames = next;
                    log::info!("Redo");
                }
                return Ok(());
            }
        }
        self.history.push(snapshot);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

fn parse_frames(document: &PersistedDocument, frame_count: u64) -> Result<FrameMap> {
    let mut frames = FrameMap::new();
    for (key, list) in &document.annotations {
        // Only the canonical spelling, so "03" and "3" never collide.
        let frame = key
            .parse::<u64>()
            .ok()
            .filter(|f| f.to_string() == *key)
            .ok_or_else(|| {
                Error::MalformedDocument(format!("frame key {:?} is not a non-negative integer", key))
            })?;
        if frame >= frame_count {
            return Err(Error::MalformedDocument(format!(
                "frame {} is outside the video (0..{})",
                frame, frame_count
            )));
        }
        if list.is_empty() {
            continue;
        }
        frames.entry(frame).or_default().extend(list.iter().cloned());
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Point, ShapeKind};

    fn store() -> AnnotationStore {
        AnnotationStore::new(VideoMetadata::new("clip.mp4", 25.0, 10, 640, 480))
    }

    fn point(x: f64, y: f64) -> Annotation {
        Annotation::with_points(ShapeKind::Point, vec![Point::new(x, y)])
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut s = store();
        let a = point(1.0, 1.0);
        let b = point(2.0, 2.0);
        let c = point(3.0, 3.0);
        s.add(4, a.clone()).unwrap();
        s.add(4, b.clone()).unwrap();
        s.add(4, c.clone()).unwrap();
        assert_eq!(s.get(4), &[a, b, c]);
        assert!(s.get(5).is_empty());
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut s = store();
        let a = point(1.0, 1.0);
        s.apply(StoreCommand::Add { frame: 2, annotation: a.clone() }).unwrap();
        s.apply(StoreCommand::Clear).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.annotation_count(), 0);

        s.apply(StoreCommand::Undo).unwrap();
        assert_eq!(s.get(2), &[a]);
    }

    #[test]
    fn test_earlier_frames_window() {
        let mut s = store();
        let (a, b, c) = (point(1.0, 1.0), point(2.0, 2.0), point(3.0, 3.0));
        s.add(1, a.clone()).unwrap();
        s.add(4, b.clone()).unwrap();
        s.add(6, c.clone()).unwrap();

        let seen: Vec<_> = s.earlier(6, 5).map(|(f, x)| (f, x.id)).collect();
        assert_eq!(seen, vec![(1, a.id), (4, b.id)]);
        let seen: Vec<_> = s.earlier(6, 2).map(|(f, _)| f).collect();
        assert_eq!(seen, vec![4]);
        assert_eq!(s.earlier(0, 5).count(), 0);
    }

    #[test]
    fn test_replace_frames_keeps_own_metadata() {
        let mut s = store();
        let mut other = AnnotationStore::new(VideoMetadata::new("other.mp4", 30.0, 5, 1920, 1080));
        let a = point(5.0, 5.0);
        other.add(3, a.clone()).unwrap();

        s.replace_frames(other).unwrap();
        assert_eq!(s.metadata(), &VideoMetadata::new("clip.mp4", 25.0, 10, 640, 480));
        assert_eq!(s.get(3), &[a]);
        assert!(!s.can_undo());
        s.add(8, point(1.0, 1.0)).unwrap();
    }

    #[test]
    fn test_replace_frames_rejects_frames_past_end() {
        let mut s = store();
        s.add(0, point(1.0, 1.0)).unwrap();
        let before = s.clone();

        let mut longer = AnnotationStore::new(VideoMetadata::new("long.mp4", 25.0, 100, 640, 480));
        longer.add(50, point(2.0, 2.0)).unwrap();
        assert!(matches!(s.replace_frames(longer), Err(Error::MalformedDocument(_))));
        assert_eq!(s, before);
    }

    #[test]
    fn test_non_canonical_frame_keys_rejected() {
        let base = store().serialize();
        for key in [" 3", "+3", "03", "3.0", "-1"] {
            let mut doc = base.clone();
            doc.annotations.insert(key.to_string(), vec![point(1.0, 1.0)]);
            let err = AnnotationStore::from_document(&doc).unwrap_err();
            assert!(matches!(err, Error::MalformedDocument(_)), "key {:?}", key);
        }
    }

    #[test]
    fn test_add_rejects_out_of_range_frame() {
        let mut s = store();
        let err = s.add(10, point(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidFrameIndex { frame: 10, frame_count: 10 }));
        assert!(s.is_empty());
    }

    #[test]
    fn test_add_remove_sequence_reflects_net_set() {
        let mut s = store();
        let anns: Vec<Annotation> = (0..5).map(|i| point(i as f64, 0.0)).collect();
        for a in &anns {
            s.add(2, a.clone()).unwrap();
        }
        s.remove(2, anns[1].id).unwrap();
        s.remove(2, anns[3].id).unwrap();
        let extra = point(9.0, 9.0);
        s.add(2, extra.clone()).unwrap();

        let expected = vec![anns[0].clone(), anns[2].clone(), anns[4].clone(), extra];
        assert_eq!(s.get(2), expected.as_slice());
        assert_eq!(s.annotation_count(), 4);
    }

    #[test]
    fn test_remove_last_annotation_drops_frame_key() {
        let mut s = store();
        let a = point(1.0, 2.0);
        s.add(3, a.clone()).unwrap();
        assert_eq!(s.frames().collect::<Vec<_>>(), vec![3]);

        let removed = s.remove(3, a.id).unwrap();
        assert_eq!(removed, a);
        assert!(s.get(3).is_empty());
        assert_eq!(s.frames().count(), 0);
        assert!(s.serialize().annotations.is_empty());
    }

    #[test]
    fn test_remove_and_update_missing() {
        let mut s = store();
        let a = point(1.0, 2.0);
        s.add(1, a.clone()).unwrap();

        let missing = Uuid::new_v4();
        assert!(matches!(s.remove(1, missing), Err(Error::AnnotationNotFound { .. })));
        assert!(matches!(s.remove(2, a.id), Err(Error::AnnotationNotFound { .. })));
        assert!(matches!(
            s.update(1, missing, point(0.0, 0.0)),
            Err(Error::AnnotationNotFound { .. })
        ));
        assert_eq!(s.get(1), &[a]);
    }

    #[test]
    fn test_update_replaces_in_place_and_keeps_id() {
        let mut s = store();
        let a = point(1.0, 1.0);
        let b = point(2.0, 2.0);
        s.add(0, a.clone()).unwrap();
        s.add(0, b.clone()).unwrap();

        let mut moved = a.clone();
        moved.translate(5.0, 5.0);
        moved.id = Uuid::new_v4();
        s.update(0, a.id, moved).unwrap();

        let list = s.get(0);
        assert_eq!(list[0].id, a.id);
        assert_eq!(list[0].points, vec![Point::new(6.0, 6.0)]);
        assert_eq!(list[1], b);
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut s = store();
        s.add(3, Annotation::with_points(
            ShapeKind::Rectangle,
            vec![Point::new(10.0, 20.0), Point::new(50.5, 60.25)],
        ).labeled("car")).unwrap();
        s.add(7, point(3.0, 4.0)).unwrap();
        s.add(7, Annotation::with_points(
            ShapeKind::Freehand,
            vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 0.5)],
        )).unwrap();

        let json = serde_json::to_string(&s.serialize()).unwrap();
        let doc = PersistedDocument::from_json(&json).unwrap();
        let restored = AnnotationStore::from_document(&doc).unwrap();
        assert_eq!(restored, s);
        assert_eq!(restored.serialize(), s.serialize());
    }

    #[test]
    fn test_round_trip_without_frame_count() {
        let json = r#"{
            "metadata": {
                "source": "legacy.mp4",
                "frame_rate": 25.0,
                "resolution": {"width": 640, "height": 480},
                "duration": 2.0
            },
            "annotations": {
                "4": [{"shape": "line", "points": [[1.0, 2.0], [30.0, 40.0]], "timestamp": "2025-01-02T03:04:05Z"}]
            }
        }"#;
        let loaded = AnnotationStore::from_document(&PersistedDocument::from_json(json).unwrap()).unwrap();
        assert_eq!(loaded.frame_count(), 50);

        let resaved = loaded.serialize();
        assert_eq!(resaved.metadata.frame_count, Some(50));
        assert_eq!(resaved.metadata.duration, 2.0);

        let text = serde_json::to_string(&resaved).unwrap();
        let restored = AnnotationStore::from_document(&PersistedDocument::from_json(&text).unwrap()).unwrap();
        assert_eq!(restored.metadata(), loaded.metadata());
        assert_eq!(restored.get(4), loaded.get(4));
        assert_eq!(restored.get(4)[0].points, vec![Point::new(1.0, 2.0), Point::new(30.0, 40.0)]);
    }

    #[test]
    fn test_deserialize_failure_leaves_store_untouched() {
        let mut s = store();
        let a = point(1.0, 1.0);
        s.add(2, a.clone()).unwrap();
        let before = s.clone();

        let no_metadata = PersistedDocument::from_json(r#"{"annotations": {"1": []}}"#);
        assert!(matches!(no_metadata, Err(Error::MalformedDocument(_))));

        let mut doc = s.serialize();
        doc.annotations.insert("1".into(), vec![point(0.0, 0.0)]);
        doc.annotations.insert("-4".into(), vec![point(0.0, 0.0)]);
        assert!(matches!(s.deserialize(&doc), Err(Error::MalformedDocument(_))));
        assert_eq!(s, before);

        let mut doc = s.serialize();
        doc.annotations.insert("12".into(), vec![point(0.0, 0.0)]);
        assert!(matches!(s.deserialize(&doc), Err(Error::MalformedDocument(_))));

        let mut doc = s.serialize();
        doc.annotations.insert("frame".into(), vec![point(0.0, 0.0)]);
        assert!(matches!(s.deserialize(&doc), Err(Error::MalformedDocument(_))));
        assert_eq!(s, before);
    }

    #[test]
    fn test_deserialize_replaces_contents() {
        let mut s = store();
        s.add(1, point(1.0, 1.0)).unwrap();

        let mut other = AnnotationStore::new(VideoMetadata::new("other.mp4", 30.0, 90, 1920, 1080));
        other.add(80, point(5.0, 5.0)).unwrap();

        s.deserialize(&other.serialize()).unwrap();
        assert_eq!(s, other);
        assert!(s.get(1).is_empty());
        assert_eq!(s.metadata().source, "other.mp4");
    }

    #[test]
    fn test_empty_frame_lists_are_not_loaded() {
        let mut doc = store().serialize();
        doc.annotations.insert("5".into(), Vec::new());
        let s = AnnotationStore::from_document(&doc).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_apply_with_undo_redo() {
        let mut s = store();
        let a = point(1.0, 1.0);
        s.apply(StoreCommand::Add { frame: 1, annotation: a.clone() }).unwrap();
        s.apply(StoreCommand::Remove { frame: 1, id: a.id }).unwrap();
        assert!(s.is_empty());

        s.apply(StoreCommand::Undo).unwrap();
        assert_eq!(s.get(1), &[a.clone()]);
        s.apply(StoreCommand::Undo).unwrap();
        assert!(s.is_empty());
        assert!(!s.can_undo());

        s.apply(StoreCommand::Redo).unwrap();
        assert_eq!(s.get(1), &[a]);
        assert!(s.can_redo());
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let mut s = store();
        let err = s.apply(StoreCommand::Remove { frame: 0, id: Uuid::new_v4() });
        assert!(err.is_err());
        assert!(!s.can_undo());
    }

    #[test]
    fn test_find_locates_annotation() {
        let mut s = store();
        let a = point(1.0, 1.0);
        s.add(6, a.clone()).unwrap();
        assert_eq!(s.find(a.id), Some((6, &a)));
        assert_eq!(s.find(Uuid::new_v4()), None);
    }
}

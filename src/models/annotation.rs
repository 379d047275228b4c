// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the shapes a user can draw on a frame and the
//! metadata carried with each of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A 2D point in frame pixel coordinates.
///
/// Serialized as a two-element `[x, y]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Kind of shape an annotation describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Point,
    Line,
    /// Two opposite corners.
    Rectangle,
    Freehand,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Line => "line",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Freehand => "freehand",
        }
    }

    /// Whether `count` points make a drawable shape of this kind.
    pub fn accepts_point_count(&self, count: usize) -> bool {
        match self {
            ShapeKind::Point => count == 1,
            ShapeKind::Line | ShapeKind::Rectangle => count == 2,
            ShapeKind::Freehand => count >= 2,
        }
    }
}

/// A shape drawn on a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub shape: ShapeKind,
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Annotation {
    /// Create an empty annotation of the given kind, stamped now.
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape,
            points: Vec::new(),
            label: None,
            timestamp: Utc::now(),
        }
    }

    /// Create an annotation with all of its points at once.
    pub fn with_points(shape: ShapeKind, points: Vec<Point>) -> Self {
        Self {
            points,
            ..Self::new(shape)
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a point to the annotation.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Check if the annotation has enough points to be stored.
    pub fn is_complete(&self) -> bool {
        self.shape.accepts_point_count(self.points.len())
    }

    /// Move every point by the given offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    /// Replace the label; blank labels clear it.
    pub fn relabel(&mut self, label: &str) {
        let trimmed = label.trim();
        self.label = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    /// Name shown in lists: the label, or the shape kind.
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.shape.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_point_counts() {
        assert!(ShapeKind::Point.accepts_point_count(1));
        assert!(!ShapeKind::Point.accepts_point_count(2));
        assert!(ShapeKind::Rectangle.accepts_point_count(2));
        assert!(!ShapeKind::Line.accepts_point_count(3));
        assert!(ShapeKind::Freehand.accepts_point_count(40));
        assert!(!ShapeKind::Freehand.accepts_point_count(1));
    }

    #[test]
    fn test_translate_and_relabel() {
        let mut a = Annotation::with_points(
            ShapeKind::Line,
            vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
        );
        a.translate(10.0, -1.0);
        assert_eq!(a.points, vec![Point::new(11.0, 1.0), Point::new(13.0, 3.0)]);

        a.relabel("  lane  ");
        assert_eq!(a.label.as_deref(), Some("lane"));
        a.relabel("   ");
        assert_eq!(a.label, None);
        assert_eq!(a.display_name(), "line");
    }

    #[test]
    fn test_json_shape() {
        let a = Annotation::with_points(ShapeKind::Point, vec![Point::new(5.0, 6.5)]);
        let value = serde_json::to_value(&a).unwrap();
        assert_eq!(value["shape"], "point");
        assert_eq!(value["points"], serde_json::json!([[5.0, 6.5]]));
        assert!(value.get("label").is_none());
    }

    #[test]
    fn test_missing_id_gets_generated() {
        let json = r#"{"shape":"line","points":[[0,0],[1,1]],"timestamp":"2025-01-01T00:00:00Z"}"#;
        let a: Annotation = serde_json::from_str(json).unwrap();
        assert!(!a.id.is_nil());
        assert!(a.is_complete());
    }
}

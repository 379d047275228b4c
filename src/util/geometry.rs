// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides coordinate transformations between the on-screen
//! display rectangle and frame pixel coordinates, plus hit testing of
//! annotations.

use crate::models::annotation::{Annotation, Point, ShapeKind};
use uuid::Uuid;

/// Convert a position relative to the displayed image into frame pixels.
pub fn display_to_frame(rel_x: f64, rel_y: f64, display_w: f64, display_h: f64, width: u32, height: u32) -> Point {
    Point {
        x: (rel_x / display_w * width as f64).clamp(0.0, width as f64),
        y: (rel_y / display_h * height as f64).clamp(0.0, height as f64),
    }
}

/// Convert frame pixels into a position relative to the displayed image.
pub fn frame_to_display(point: &Point, display_w: f64, display_h: f64, width: u32, height: u32) -> (f64, f64) {
    (
        point.x / width as f64 * display_w,
        point.y / height as f64 * display_h,
    )
}

/// Largest `(w, h)` with the image's aspect ratio that fits the area.
pub fn fit_size(image_w: f64, image_h: f64, avail_w: f64, avail_h: f64) -> (f64, f64) {
    let img_aspect = image_w / image_h;
    if img_aspect > avail_w / avail_h {
        (avail_w, avail_w / img_aspect)
    } else {
        (avail_h * img_aspect, avail_h)
    }
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: &Point, a: &Point, b: &Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// The four corners of a rectangle annotation, clockwise from the first point.
pub fn rectangle_corners(a: &Point, b: &Point) -> [Point; 4] {
    [*a, Point::new(b.x, a.y), *b, Point::new(a.x, b.y)]
}

/// Distance from `p` to the drawn outline of an annotation. Points inside
/// a rectangle are at distance zero.
pub fn distance_to_annotation(p: &Point, annotation: &Annotation) -> f64 {
    let pts = &annotation.points;
    match (annotation.shape, pts.as_slice()) {
        (_, []) => f64::INFINITY,
        (ShapeKind::Point, [only, ..]) => p.distance_to(only),
        (ShapeKind::Rectangle, [a, b, ..]) => {
            let inside = p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y);
            if inside {
                0.0
            } else {
                let c = rectangle_corners(a, b);
                (0..4)
                    .map(|i| distance_to_segment(p, &c[i], &c[(i + 1) % 4]))
                    .fold(f64::INFINITY, f64::min)
            }
        }
        (_, [only]) => p.distance_to(only),
        (_, _) => pts
            .windows(2)
            .map(|w| distance_to_segment(p, &w[0], &w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Topmost (most recently drawn) annotation within `tolerance` of `p`.
pub fn hit_test(annotations: &[Annotation], p: &Point, tolerance: f64) -> Option<Uuid> {
    annotations
        .iter()
        .rev()
        .find(|a| distance_to_annotation(p, a) <= tolerance)
        .map(|a| a.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_frame_roundtrip() {
        let p = display_to_frame(480.0, 270.0, 960.0, 540.0, 1920, 1080);
        assert_eq!(p, Point::new(960.0, 540.0));
        let (x, y) = frame_to_display(&p, 960.0, 540.0, 1920, 1080);
        assert!((x - 480.0).abs() < 1e-9);
        assert!((y - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_to_frame_clamps_to_frame() {
        let p = display_to_frame(-5.0, 600.0, 960.0, 540.0, 1920, 1080);
        assert_eq!(p, Point::new(0.0, 1080.0));
    }

    #[test]
    fn test_fit_size() {
        let (w, h) = fit_size(1920.0, 1080.0, 800.0, 800.0);
        assert_eq!(w, 800.0);
        assert!((h - 450.0).abs() < 1e-9);

        let (w, h) = fit_size(1080.0, 1920.0, 800.0, 800.0);
        assert!((w - 450.0).abs() < 1e-9);
        assert_eq!(h, 800.0);
    }

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(&Point::new(5.0, 3.0), &a, &b), 3.0);
        assert_eq!(distance_to_segment(&Point::new(-4.0, 3.0), &a, &b), 5.0);
        assert_eq!(distance_to_segment(&Point::new(1.0, 1.0), &a, &a), 2f64.sqrt());
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let rect = Annotation::with_points(
            ShapeKind::Rectangle,
            vec![Point::new(0.0, 0.0), Point::new(100.0, 100.0)],
        );
        let dot = Annotation::with_points(ShapeKind::Point, vec![Point::new(50.0, 50.0)]);
        let line = Annotation::with_points(
            ShapeKind::Line,
            vec![Point::new(200.0, 0.0), Point::new(200.0, 100.0)],
        );
        let anns = vec![rect.clone(), dot.clone(), line.clone()];

        assert_eq!(hit_test(&anns, &Point::new(51.0, 50.0), 4.0), Some(dot.id));
        assert_eq!(hit_test(&anns, &Point::new(10.0, 10.0), 4.0), Some(rect.id));
        assert_eq!(hit_test(&anns, &Point::new(203.0, 40.0), 4.0), Some(line.id));
        assert_eq!(hit_test(&anns, &Point::new(150.0, 150.0), 4.0), None);
    }
}

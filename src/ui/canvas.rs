// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for video display and annotation.
//!
//! This module provides the main canvas area where users view the
//! current frame and draw points, lines, rectangles and freehand paths.

use crate::app::Tool;
use crate::models::annotation::{Annotation, Point, ShapeKind};
use crate::util::geometry::{display_to_frame, fit_size, frame_to_display, rectangle_corners};
use uuid::Uuid;

/// Result of canvas interaction. Points are in frame pixels.
pub enum CanvasAction {
    None,
    AddVertex(Point),
    StartShape(Point),
    ExtendShape(Point),
    FinishAnnotation,
    SelectAt(Point),
    StartDragging(Point),
    DragTo(Point),
    StopDragging,
}

/// What to draw on top of the frame.
pub struct CanvasOverlay<'a> {
    pub annotations: &'a [Annotation],
    /// Annotations from earlier frames, drawn faded.
    pub trail: &'a [&'a Annotation],
    pub selected: Option<Uuid>,
    /// Shape being drawn.
    pub in_progress: Option<&'a Annotation>,
    /// Moved copy shown in place of the annotation being dragged.
    pub drag_preview: Option<&'a Annotation>,
}

/// Display the main canvas area and handle mouse interactions.
pub fn show(
    ui: &mut egui::Ui,
    current_tool: Tool,
    frame_texture: Option<&egui::TextureHandle>,
    frame_size: Option<(u32, u32)>,
    overlay: CanvasOverlay<'_>,
    status: &str,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size() - egui::vec2(0.0, 24.0);

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let (Some(texture), Some((width, height))) = (frame_texture, frame_size) else {
            welcome(ui);
            return;
        };

        let available = ui.available_size();
        let (display_w, display_h) = fit_size(
            width as f64,
            height as f64,
            available.x as f64,
            available.y as f64,
        );
        let x_offset = (available.x - display_w as f32) / 2.0;
        let y_offset = (available.y - display_h as f32) / 2.0;
        let image_rect = egui::Rect::from_min_size(
            ui.min_rect().min + egui::vec2(x_offset, y_offset),
            egui::vec2(display_w as f32, display_h as f32),
        );

        ui.painter().image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let to_frame = |pos: egui::Pos2| {
            display_to_frame(
                (pos.x - image_rect.min.x) as f64,
                (pos.y - image_rect.min.y) as f64,
                display_w,
                display_h,
                width,
                height,
            )
        };
        let to_screen = |p: &Point| {
            let (x, y) = frame_to_display(p, display_w, display_h, width, height);
            egui::pos2(image_rect.min.x + x as f32, image_rect.min.y + y as f32)
        };

        let response = ui.allocate_rect(image_rect, egui::Sense::click_and_drag());
        let press_origin = ui.input(|i| i.pointer.press_origin());

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                action = match current_tool {
                    Tool::Select => CanvasAction::SelectAt(to_frame(pos)),
                    Tool::Point => CanvasAction::AddVertex(to_frame(pos)),
                    _ => CanvasAction::None,
                };
            }
        } else if response.drag_started() {
            if let Some(pos) = press_origin.or(response.interact_pointer_pos()) {
                action = match current_tool {
                    Tool::Select => CanvasAction::StartDragging(to_frame(pos)),
                    Tool::Point => CanvasAction::None,
                    _ => CanvasAction::StartShape(to_frame(pos)),
                };
            }
        } else if response.drag_stopped() {
            action = match current_tool {
                Tool::Select => CanvasAction::StopDragging,
                Tool::Point => CanvasAction::None,
                _ => CanvasAction::FinishAnnotation,
            };
        } else if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                action = match current_tool {
                    Tool::Select => CanvasAction::DragTo(to_frame(pos)),
                    Tool::Point => CanvasAction::None,
                    _ => CanvasAction::ExtendShape(to_frame(pos)),
                };
            }
        }

        let painter = ui.painter_at(image_rect);

        let faded = egui::Color32::YELLOW.gamma_multiply(0.4);
        for annotation in overlay.trail {
            draw_annotation(&painter, annotation, &to_screen, faded, false);
        }

        for annotation in overlay.annotations {
            let dragged = overlay.drag_preview.filter(|p| p.id == annotation.id);
            let shown = dragged.unwrap_or(annotation);
            let color = if overlay.selected == Some(annotation.id) {
                egui::Color32::from_rgb(255, 140, 0)
            } else {
                egui::Color32::YELLOW
            };
            draw_annotation(&painter, shown, &to_screen, color, false);
        }

        if let Some(annotation) = overlay.in_progress {
            draw_annotation(&painter, annotation, &to_screen, egui::Color32::LIGHT_BLUE, true);
        }
    });

    ui.horizontal(|ui| {
        ui.label(format!("Current tool: {:?}", current_tool));
        ui.separator();
        ui.label(status);
    });

    action
}

fn welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("Annotater")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Open a video to begin annotating")
                    .color(egui::Color32::from_gray(180)),
            );
            ui.add_space(10.0);
            ui.label(
                egui::RichText::new("File → Open Media...")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}

/// Draw an annotation on the canvas.
fn draw_annotation(
    painter: &egui::Painter,
    annotation: &Annotation,
    to_screen: &dyn Fn(&Point) -> egui::Pos2,
    color: egui::Color32,
    is_in_progress: bool,
) {
    let screen_points: Vec<egui::Pos2> = annotation.points.iter().map(to_screen).collect();
    let Some(first) = screen_points.first().copied() else {
        return;
    };
    let stroke = egui::Stroke::new(2.0, color);

    match annotation.shape {
        ShapeKind::Point => {
            painter.circle_filled(first, 5.0, color);
            painter.circle_stroke(first, 5.0, egui::Stroke::new(1.0, egui::Color32::BLACK));
        }
        ShapeKind::Rectangle if annotation.points.len() >= 2 => {
            let corners = rectangle_corners(&annotation.points[0], &annotation.points[1]);
            let mut outline: Vec<egui::Pos2> = corners.iter().map(to_screen).collect();
            outline.push(outline[0]);
            painter.add(egui::Shape::line(outline, stroke));
        }
        _ => {
            painter.add(egui::Shape::line(screen_points.clone(), stroke));
        }
    }

    if let Some(label) = &annotation.label {
        painter.text(
            first + egui::vec2(6.0, -6.0),
            egui::Align2::LEFT_BOTTOM,
            label,
            egui::FontId::proportional(14.0),
            color,
        );
    }

    // Vertex handles, except along freehand paths
    if annotation.shape != ShapeKind::Freehand && annotation.shape != ShapeKind::Point {
        let vertex_color = if is_in_progress { egui::Color32::WHITE } else { color };
        for point in &screen_points {
            painter.circle_filled(*point, 4.0, vertex_color);
            painter.circle_stroke(*point, 4.0, egui::Stroke::new(1.0, egui::Color32::BLACK));
        }
    }
}

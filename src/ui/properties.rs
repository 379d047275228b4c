// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation properties panel.
//!
//! This module provides the properties panel for viewing and editing
//! the annotations on the current frame: selection, labels and deletion.

use crate::models::annotation::Annotation;
use uuid::Uuid;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    Select(Uuid),
    Relabel(Uuid, String),
    Delete(Uuid),
}

/// Display the annotation list for one frame.
pub fn show(
    ui: &mut egui::Ui,
    frame: Option<u64>,
    annotations: &[Annotation],
    selected: Option<Uuid>,
    label_buffer: &mut String,
) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Annotations");
    ui.separator();

    let Some(frame) = frame else {
        ui.label(egui::RichText::new("No video loaded").weak());
        return action;
    };

    ui.label(format!("Frame {}: {} annotation(s)", frame, annotations.len()));
    ui.add_space(4.0);

    egui::ScrollArea::vertical()
        .max_height(240.0)
        .show(ui, |ui| {
            for (i, annotation) in annotations.iter().enumerate() {
                let is_selected = selected == Some(annotation.id);
                let text = format!("{}. {} ({})", i + 1, annotation.display_name(), annotation.shape.label());
                if ui.selectable_label(is_selected, text).clicked() {
                    action = PropertiesAction::Select(annotation.id);
                }
            }
        });

    let Some(current) = selected.and_then(|id| annotations.iter().find(|a| a.id == id)) else {
        return action;
    };

    ui.separator();
    ui.label(egui::RichText::new("Selected").strong());
    ui.label(format!("Shape: {}", current.shape.label()));
    ui.label(format!("Created: {}", current.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));

    for (i, p) in current.points.iter().take(4).enumerate() {
        ui.label(egui::RichText::new(format!("  p{}: ({:.1}, {:.1})", i, p.x, p.y)).monospace());
    }
    if current.points.len() > 4 {
        ui.label(egui::RichText::new(format!("  … {} points", current.points.len())).weak());
    }

    ui.horizontal(|ui| {
        ui.label("Label:");
        let response = ui.text_edit_singleline(label_buffer);
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if submitted || ui.button("Apply").clicked() {
            action = PropertiesAction::Relabel(current.id, label_buffer.clone());
        }
    });

    if ui.button("🗑 Delete").clicked() {
        action = PropertiesAction::Delete(current.id);
    }

    action
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! This module provides the toolbar interface for picking the shape
//! drawn on the canvas, or the select tool for editing.

use crate::app::{DrawOptions, Tool};

const TOOLS: [(Tool, &str); 5] = [
    (Tool::Select, "⬆ Select"),
    (Tool::Point, "• Point"),
    (Tool::Line, "⟋ Line"),
    (Tool::Rectangle, "▭ Rectangle"),
    (Tool::Freehand, "✎ Freehand"),
];

/// Display the toolbar with tool selection buttons and drawing options.
pub fn show(ui: &mut egui::Ui, current_tool: &mut Tool, options: &mut DrawOptions) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");

        ui.separator();

        for (tool, text) in TOOLS {
            if ui.selectable_label(*current_tool == tool, text).clicked() {
                *current_tool = tool;
            }
        }

        ui.separator();

        ui.label("Label:");
        ui.add(
            egui::TextEdit::singleline(&mut options.default_label)
                .hint_text("none")
                .desired_width(100.0),
        );
        ui.checkbox(&mut options.long_annotations, "Long annotations")
            .on_hover_text("Keep annotations from the last second visible");

        ui.separator();

        let tool_text = match current_tool {
            Tool::Select => "Click to select an annotation, drag to move it",
            Tool::Point => "Click to place a point",
            Tool::Line => "Drag from start to end",
            Tool::Rectangle => "Drag from one corner to the opposite corner",
            Tool::Freehand => "Drag to draw a path",
        };

        ui.label(egui::RichText::new(tool_text).italics().weak());
    });
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video timeline scrubber and transport controls.
//!
//! Buttons are enabled from the playback state: nothing works once
//! playback is stopped, pause only while playing.

use crate::playback::PlaybackState;
use std::time::Duration;

/// Result of timeline interaction.
pub enum TransportAction {
    None,
    TogglePlay,
    Step(i64),
    Seek(i64),
    Stop,
}

/// Display transport buttons and the frame slider.
pub fn show(
    ui: &mut egui::Ui,
    state: PlaybackState,
    current_frame: u64,
    frame_count: u64,
    timer_text: &str,
    audio_position: Duration,
    annotated_frames: &[u64],
) -> TransportAction {
    let mut action = TransportAction::None;
    let active = state != PlaybackState::Stopped;
    let paused = state == PlaybackState::Paused;

    ui.horizontal(|ui| {
        if ui.add_enabled(paused, egui::Button::new("⏮")).on_hover_text("Previous frame").clicked() {
            action = TransportAction::Step(-1);
        }

        let play_text = if state == PlaybackState::Playing { "⏸ Pause" } else { "▶ Play" };
        if ui.add_enabled(active, egui::Button::new(play_text)).clicked() {
            action = TransportAction::TogglePlay;
        }

        if ui.add_enabled(paused, egui::Button::new("⏭")).on_hover_text("Next frame").clicked() {
            action = TransportAction::Step(1);
        }

        if ui.add_enabled(active, egui::Button::new("⏹ Stop")).clicked() {
            action = TransportAction::Stop;
        }

        ui.separator();

        let last = frame_count.saturating_sub(1);
        let mut frame = current_frame;
        let slider = egui::Slider::new(&mut frame, 0..=last).show_value(false);
        ui.spacing_mut().slider_width = (ui.available_width() - 280.0).max(100.0);
        if ui.add_enabled(active, slider).changed() {
            action = TransportAction::Seek(frame as i64);
        }

        ui.label(format!("Frame {} / {}", current_frame, last));
        ui.separator();
        ui.label(timer_text);
        ui.label(egui::RichText::new(format!("🔊 {:.1}s", audio_position.as_secs_f64())).weak())
            .on_hover_text("Audio clock");
    });

    // Marks for frames that carry annotations
    if !annotated_frames.is_empty() {
        ui.horizontal_wrapped(|ui| {
            ui.label(egui::RichText::new("Annotated:").weak());
            for frame in annotated_frames {
                let text = egui::RichText::new(frame.to_string()).color(egui::Color32::YELLOW);
                if ui
                    .add_enabled(active, egui::Button::new(text).small())
                    .clicked()
                {
                    action = TransportAction::Seek(*frame as i64);
                }
            }
        });
    }

    action
}

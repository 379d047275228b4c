// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the open [`Session`] and turns UI
//! interactions into store commands and playback requests.

use crate::config::AppConfig;
use crate::error::Result;
use crate::io::media::{open_media, FrameSource, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::io::serialization::{load_document, save_document};
use crate::models::annotation::{Annotation, Point, ShapeKind};
use crate::models::document::PersistedDocument;
use crate::models::metadata::VideoMetadata;
use crate::models::store::StoreCommand;
use crate::playback::audio::NullAudio;
use crate::playback::PlaybackState;
use crate::session::Session;
use crate::ui::canvas::{self, CanvasAction, CanvasOverlay};
use crate::ui::properties::{self, PropertiesAction};
use crate::ui::timeline::{self, TransportAction};
use crate::ui::toolbar;
use crate::util::geometry::hit_test;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use uuid::Uuid;

/// Selection distance in frame pixels.
const HIT_TOLERANCE: f64 = 6.0;

/// Freehand paths only take a new point once the pointer moved this far.
const FREEHAND_MIN_STEP: f64 = 1.5;

/// Current drawing tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Select,
    Point,
    Line,
    Rectangle,
    Freehand,
}

impl Tool {
    /// Shape drawn by this tool; `None` for the select tool.
    pub fn shape(&self) -> Option<ShapeKind> {
        match self {
            Tool::Select => None,
            Tool::Point => Some(ShapeKind::Point),
            Tool::Line => Some(ShapeKind::Line),
            Tool::Rectangle => Some(ShapeKind::Rectangle),
            Tool::Freehand => Some(ShapeKind::Freehand),
        }
    }
}

/// Settings applied to new annotations and to the canvas overlay.
#[derive(Debug, Clone, Default)]
pub struct DrawOptions {
    /// Label given to new annotations; blank means none.
    pub default_label: String,
    /// Keep annotations from the last second on screen.
    pub long_annotations: bool,
}

impl DrawOptions {
    fn annotation(&self, shape: ShapeKind, points: Vec<Point>) -> Annotation {
        let annotation = Annotation::with_points(shape, points);
        match self.default_label.trim() {
            "" => annotation,
            label => annotation.labeled(label),
        }
    }
}

/// Number of earlier frames kept on screen in long-annotation mode.
fn trail_span(metadata: &VideoMetadata) -> u64 {
    (metadata.frame_rate.round() as u64).max(1)
}

/// Result of a background job.
enum JobResult {
    Opened {
        path: PathBuf,
        source: Result<Box<dyn FrameSource>>,
    },
    Saved {
        path: PathBuf,
        /// Session revision the saved snapshot was taken at
        revision: u64,
        result: Result<()>,
    },
    Exported {
        path: PathBuf,
        result: Result<()>,
    },
    Loaded {
        path: PathBuf,
        result: Result<PersistedDocument>,
    },
}

/// An annotation being moved with the select tool.
struct DragState {
    frame: u64,
    origin: Point,
    original: Annotation,
    preview: Annotation,
}

/// Main application state.
pub struct AnnotaterApp {
    config: AppConfig,

    /// Currently selected drawing tool
    current_tool: Tool,

    options: DrawOptions,

    /// Open video and its annotations
    session: Option<Session>,

    /// Selected annotation on the current frame
    selected: Option<Uuid>,

    /// Label text being edited in the properties panel
    label_buffer: String,

    /// Shape being drawn and the frame it belongs to
    in_progress: Option<(u64, Annotation)>,

    drag: Option<DragState>,

    /// Texture holding the frame on display
    frame_texture: Option<egui::TextureHandle>,

    /// Frame dimensions (width, height)
    frame_size: Option<(u32, u32)>,

    /// Receiver for the running background job
    jobs: Option<Receiver<JobResult>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Error waiting to be dismissed
    notice: Option<String>,
}

impl AnnotaterApp {
    /// Create the application, optionally opening `media` right away.
    pub fn new(config: AppConfig, media: Option<PathBuf>) -> Self {
        let mut app = Self {
            config,
            current_tool: Tool::Select,
            options: DrawOptions::default(),
            session: None,
            selected: None,
            label_buffer: String::new(),
            in_progress: None,
            drag: None,
            frame_texture: None,
            frame_size: None,
            jobs: None,
            loading_message: None,
            notice: None,
        };
        if let Some(path) = media {
            app.open_media_file(path);
        }
        app
    }

    fn is_busy(&self) -> bool {
        self.jobs.is_some()
    }

    /// Log an error and show it to the user.
    fn report(&mut self, context: &str, error: impl std::fmt::Display) {
        log::error!("{}: {}", context, error);
        self.notice = Some(format!("{}: {}", context, error));
    }

    fn spawn_job<F>(&mut self, message: String, job: F)
    where
        F: FnOnce() -> JobResult + Send + 'static,
    {
        let (sender, receiver) = channel();
        self.jobs = Some(receiver);
        self.loading_message = Some(message);
        std::thread::spawn(move || {
            let _ = sender.send(job());
        });
    }

    /// Open a video or image in the background.
    pub fn open_media_file(&mut self, path: PathBuf) {
        log::info!("Opening {}", path.display());
        self.spawn_job("Opening media...".to_string(), move || {
            let source = open_media(&path);
            JobResult::Opened { path, source }
        });
    }

    fn load_annotations(&mut self, path: PathBuf) {
        self.spawn_job("Loading annotations...".to_string(), move || {
            let result = load_document(&path);
            JobResult::Loaded { path, result }
        });
    }

    fn save_annotations(&mut self, path: PathBuf, export: bool) {
        let Some(session) = &self.session else {
            return;
        };
        let document = session.document();
        let revision = session.revision();
        self.spawn_job("Saving annotations...".to_string(), move || {
            let result = save_document(&document, &path);
            if export {
                JobResult::Exported { path, result }
            } else {
                JobResult::Saved { path, revision, result }
            }
        });
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            if session.is_dirty() {
                log::warn!(
                    "Closing {} with unsaved annotations",
                    session.media_path().display()
                );
            }
            session.close();
        }
        self.frame_texture = None;
        self.frame_size = None;
        self.in_progress = None;
        self.drag = None;
        self.select(None);
    }

    fn finish_job(&mut self, result: JobResult) {
        match result {
            JobResult::Opened { path, source } => {
                let session = source.and_then(|source| {
                    Session::open(
                        &path,
                        source,
                        Box::new(NullAudio::new()),
                        self.config.output_dir.as_deref(),
                    )
                });
                match session {
                    Ok(session) => {
                        self.close_session();
                        log::info!(
                            "Opened {} ({}x{}, {} frames)",
                            path.display(),
                            session.metadata().width,
                            session.metadata().height,
                            session.metadata().frame_count
                        );
                        self.session = Some(session);
                    }
                    Err(e) => self.report("Could not open media", e),
                }
            }
            JobResult::Saved { path, revision, result } => match result {
                Ok(()) => {
                    if let Some(session) = self.session.as_mut() {
                        session.mark_saved(path, revision);
                    }
                }
                Err(e) => self.report("Could not save annotations", e),
            },
            JobResult::Exported { path, result } => match result {
                Ok(()) => log::info!("Exported annotations to {}", path.display()),
                Err(e) => self.report("Could not export annotations", e),
            },
            JobResult::Loaded { path, result } => {
                let Some(session) = self.session.as_mut() else {
                    self.report("Could not load annotations", "no video is open");
                    return;
                };
                match result.and_then(|document| session.load_document(&document, path)) {
                    Ok(()) => {
                        log::info!(
                            "Loaded {} annotations",
                            session.store().annotation_count()
                        );
                        self.select(None);
                    }
                    Err(e) => self.report("Could not load annotations", e),
                }
            }
        }
    }

    fn select(&mut self, id: Option<Uuid>) {
        self.selected = id;
        self.label_buffer = id
            .and_then(|id| self.current_annotation(id))
            .and_then(|a| a.label.clone())
            .unwrap_or_default();
    }

    fn current_annotation(&self, id: Uuid) -> Option<&Annotation> {
        self.session
            .as_ref()?
            .current_annotations()
            .iter()
            .find(|a| a.id == id)
    }

    fn apply(&mut self, command: StoreCommand) {
        // The running job may be saving a snapshot of the store.
        if self.is_busy() {
            log::debug!("Ignoring edit while a background job runs");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = session.apply(command) {
            self.report("Edit failed", e);
        }
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected else {
            return;
        };
        let Some((frame, _)) = self.session.as_ref().and_then(|s| s.store().find(id)) else {
            return;
        };
        self.apply(StoreCommand::Remove { frame, id });
        self.select(None);
    }

    fn clear_annotations(&mut self) {
        self.apply(StoreCommand::Clear);
        self.select(None);
    }

    fn undo(&mut self) {
        self.apply(StoreCommand::Undo);
        self.select(None);
    }

    fn redo(&mut self) {
        self.apply(StoreCommand::Redo);
        self.select(None);
    }

    /// Pick up decoded frames and playback errors.
    fn poll_session(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Some(frame) = session.poll_frame() {
            let size = [frame.width as usize, frame.height as usize];
            let image = egui::ColorImage::from_rgba_unmultiplied(size, &frame.pixels);
            match &mut self.frame_texture {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    self.frame_texture =
                        Some(ctx.load_texture("video_frame", image, egui::TextureOptions::LINEAR));
                }
            }
            self.frame_size = Some((frame.width, frame.height));
        }

        let error = session.playback_mut().take_error();
        let playing = session.playback().state() == PlaybackState::Playing;

        if let Some(error) = error {
            self.report("Playback error", error);
        }

        if playing {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        // Selection belongs to one frame
        if let Some(id) = self.selected {
            if self.current_annotation(id).is_none() {
                self.select(None);
            }
        }
    }

    fn handle_canvas(&mut self, action: CanvasAction) {
        let Some(frame) = self.session.as_ref().map(|s| s.current_frame()) else {
            return;
        };

        match action {
            CanvasAction::AddVertex(point) => {
                let annotation = self.options.annotation(ShapeKind::Point, vec![point]);
                log::info!("Added point at ({:.1}, {:.1}) on frame {}", point.x, point.y, frame);
                self.apply(StoreCommand::Add { frame, annotation });
            }
            CanvasAction::StartShape(point) => {
                if let Some(shape) = self.current_tool.shape() {
                    let annotation = self.options.annotation(shape, vec![point]);
                    self.in_progress = Some((frame, annotation));
                }
            }
            CanvasAction::ExtendShape(point) => {
                if let Some((_, annotation)) = self.in_progress.as_mut() {
                    extend_shape(annotation, point);
                }
            }
            CanvasAction::FinishAnnotation => {
                if let Some((frame, annotation)) = self.in_progress.take() {
                    if is_drawable(&annotation) {
                        log::info!(
                            "Added {} with {} points on frame {}",
                            annotation.shape.label(),
                            annotation.point_count(),
                            frame
                        );
                        self.apply(StoreCommand::Add { frame, annotation });
                    }
                }
            }
            CanvasAction::SelectAt(point) => {
                let hit = self
                    .session
                    .as_ref()
                    .and_then(|s| hit_test(s.current_annotations(), &point, HIT_TOLERANCE));
                self.select(hit);
            }
            CanvasAction::StartDragging(point) => {
                let hit = self
                    .session
                    .as_ref()
                    .and_then(|s| hit_test(s.current_annotations(), &point, HIT_TOLERANCE));
                self.select(hit);
                self.drag = hit.and_then(|id| self.current_annotation(id)).map(|a| DragState {
                    frame,
                    origin: point,
                    original: a.clone(),
                    preview: a.clone(),
                });
            }
            CanvasAction::DragTo(point) => {
                if let Some(drag) = self.drag.as_mut() {
                    drag.preview = drag.original.clone();
                    drag.preview.translate(point.x - drag.origin.x, point.y - drag.origin.y);
                }
            }
            CanvasAction::StopDragging => {
                if let Some(drag) = self.drag.take() {
                    if drag.preview.points != drag.original.points {
                        self.apply(StoreCommand::Update {
                            frame: drag.frame,
                            id: drag.original.id,
                            annotation: drag.preview,
                        });
                    }
                }
            }
            CanvasAction::None => {}
        }
    }

    fn handle_properties(&mut self, action: PropertiesAction) {
        match action {
            PropertiesAction::Select(id) => self.select(Some(id)),
            PropertiesAction::Relabel(id, label) => {
                let (Some(session), Some(current)) = (&self.session, self.current_annotation(id))
                else {
                    return;
                };
                let frame = session.current_frame();
                let mut annotation = current.clone();
                annotation.relabel(&label);
                if annotation.label != current.label {
                    self.apply(StoreCommand::Update { frame, id, annotation });
                }
            }
            PropertiesAction::Delete(id) => {
                self.selected = Some(id);
                self.delete_selected();
            }
            PropertiesAction::None => {}
        }
    }

    fn handle_transport(&mut self, action: TransportAction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let playback = session.playback_mut();
        match action {
            TransportAction::TogglePlay => playback.toggle_play(),
            TransportAction::Step(delta) => {
                playback.step(delta);
            }
            TransportAction::Seek(frame) => {
                playback.seek(frame);
            }
            TransportAction::Stop => playback.stop(),
            TransportAction::None => {}
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.in_progress = None;
            self.drag = None;
            self.select(None);
        }

        // Only process if no text field is focused (to avoid deleting while editing labels)
        if ctx.wants_keyboard_input() || self.session.is_none() {
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.handle_transport(TransportAction::TogglePlay);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowLeft)) {
            self.handle_transport(TransportAction::Step(-1));
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowRight)) {
            self.handle_transport(TransportAction::Step(1));
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
            self.delete_selected();
        }

        // Undo (Ctrl+Z)
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift) {
            self.undo();
        }

        // Redo (Ctrl+Shift+Z or Ctrl+Y)
        if ctx.input(|i| {
            (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                || (i.modifiers.command && i.key_pressed(egui::Key::Y))
        }) {
            self.redo();
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        let has_session = self.session.is_some();
        let idle = !self.is_busy();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.add_enabled(idle, egui::Button::new("Open Media...")).clicked() {
                        let mut extensions = VIDEO_EXTENSIONS.to_vec();
                        extensions.extend_from_slice(IMAGE_EXTENSIONS);
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Media", &extensions)
                            .pick_file()
                        {
                            self.open_media_file(path);
                        }
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(idle && has_session, egui::Button::new("Load Annotations..."))
                        .clicked()
                    {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Annotations", &["json", "yaml", "yml"])
                            .pick_file()
                        {
                            self.load_annotations(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui
                        .add_enabled(idle && has_session, egui::Button::new("Save Annotations"))
                        .clicked()
                    {
                        if let Some(path) = self.session.as_ref().map(|s| s.document_path().to_path_buf()) {
                            self.save_annotations(path, false);
                        }
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(idle && has_session, egui::Button::new("Save Annotations As..."))
                        .clicked()
                    {
                        if let Some(path) = self.pick_save_path("JSON", &["json"], "json") {
                            self.save_annotations(path, false);
                        }
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(idle && has_session, egui::Button::new("Export as YAML..."))
                        .clicked()
                    {
                        if let Some(path) = self.pick_save_path("YAML", &["yaml", "yml"], "yaml") {
                            self.save_annotations(path, true);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.add_enabled(idle && has_session, egui::Button::new("Close Video")).clicked() {
                        self.close_session();
                        ui.close_menu();
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let can_undo = idle && self.session.as_ref().is_some_and(|s| s.store().can_undo());
                    if ui.add_enabled(can_undo, egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                        self.undo();
                        ui.close_menu();
                    }

                    let can_redo = idle && self.session.as_ref().is_some_and(|s| s.store().can_redo());
                    if ui.add_enabled(can_redo, egui::Button::new("Redo (Ctrl+Shift+Z)")).clicked() {
                        self.redo();
                        ui.close_menu();
                    }

                    ui.separator();

                    let has_selection = idle && self.selected.is_some();
                    if ui.add_enabled(has_selection, egui::Button::new("Delete Selected")).clicked() {
                        self.delete_selected();
                        ui.close_menu();
                    }

                    let has_annotations = idle && self.session.as_ref().is_some_and(|s| !s.store().is_empty());
                    if ui
                        .add_enabled(has_annotations, egui::Button::new("Clear All Annotations"))
                        .clicked()
                    {
                        self.clear_annotations();
                        ui.close_menu();
                    }
                });
            });
        });
    }

    /// Ask for a save location, suggesting `<stem>_annotated.<extension>`
    /// in the default document directory.
    fn pick_save_path(&self, name: &str, filter: &[&str], extension: &str) -> Option<PathBuf> {
        let default = self.session.as_ref()?.document_path().with_extension(extension);
        let mut dialog = rfd::FileDialog::new().add_filter(name, filter);
        if let Some(dir) = default.parent() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(file) = default.file_name() {
            dialog = dialog.set_file_name(file.to_string_lossy());
        }
        dialog.save_file()
    }

    fn status_text(&self) -> String {
        let Some(session) = &self.session else {
            return "No video loaded".to_string();
        };
        format!(
            "{:?} | {} annotation(s) | {}{}",
            session.playback().state(),
            session.store().annotation_count(),
            session.document_path().display(),
            if session.is_dirty() { " *" } else { "" }
        )
    }

    fn notice_window(&mut self, ctx: &egui::Context) {
        let Some(message) = self.notice.clone() else {
            return;
        };
        let mut open = true;
        let mut dismissed = false;
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if !open || dismissed {
            self.notice = None;
        }
    }
}

/// Add a dragged-to point to a shape being drawn. Lines and rectangles
/// keep their first point and follow the pointer with the second.
fn extend_shape(annotation: &mut Annotation, point: Point) {
    match annotation.shape {
        ShapeKind::Point => {}
        ShapeKind::Line | ShapeKind::Rectangle => {
            annotation.points.truncate(1);
            annotation.add_point(point);
        }
        ShapeKind::Freehand => {
            let far_enough = annotation
                .points
                .last()
                .map_or(true, |last| last.distance_to(&point) >= FREEHAND_MIN_STEP);
            if far_enough {
                annotation.add_point(point);
            }
        }
    }
}

/// Complete, and not collapsed onto a single spot.
fn is_drawable(annotation: &Annotation) -> bool {
    if !annotation.is_complete() {
        return false;
    }
    match (annotation.shape, annotation.points.as_slice()) {
        (ShapeKind::Rectangle, [a, b]) => a.x != b.x && a.y != b.y,
        (ShapeKind::Line, [a, b]) => a != b,
        _ => true,
    }
}

impl eframe::App for AnnotaterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for a completed background job
        if let Some(receiver) = &self.jobs {
            if let Ok(result) = receiver.try_recv() {
                self.jobs = None;
                self.loading_message = None;
                self.finish_job(result);
            }
        }

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        self.poll_session(ctx);
        self.menu_bar(ctx);

        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut self.current_tool, &mut self.options);
        });

        // Transport and timeline (bottom)
        let transport_action = egui::TopBottomPanel::bottom("timeline")
            .show(ctx, |ui| match &self.session {
                Some(session) => {
                    let frame = session.current_frame();
                    let annotated: Vec<u64> = session.store().frames().collect();
                    timeline::show(
                        ui,
                        session.playback().state(),
                        frame,
                        session.metadata().frame_count,
                        &session.metadata().timer_text(frame),
                        session.playback().audio_position(),
                        &annotated,
                    )
                }
                None => {
                    ui.label(egui::RichText::new("No video loaded").weak());
                    TransportAction::None
                }
            })
            .inner;
        self.handle_transport(transport_action);

        // Properties panel (right side)
        let idle = !self.is_busy();
        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| {
                let frame = self.session.as_ref().map(|s| s.current_frame());
                let annotations = self
                    .session
                    .as_ref()
                    .map(|s| s.current_annotations())
                    .unwrap_or(&[]);
                ui.add_enabled_ui(idle, |ui| {
                    properties::show(ui, frame, annotations, self.selected, &mut self.label_buffer)
                })
                .inner
            })
            .inner;
        self.handle_properties(properties_action);

        if !self.is_busy() {
            self.handle_keys(ctx);
        }

        // Main canvas (center)
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                // Show loading overlay if loading
                if let Some(message) = &self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    return CanvasAction::None;
                }

                let frame = self.session.as_ref().map(|s| s.current_frame());
                let annotations = self
                    .session
                    .as_ref()
                    .map(|s| s.current_annotations())
                    .unwrap_or(&[]);
                let trail: Vec<&Annotation> = match (&self.session, frame) {
                    (Some(session), Some(frame)) if self.options.long_annotations => session
                        .store()
                        .earlier(frame, trail_span(session.metadata()))
                        .map(|(_, a)| a)
                        .collect(),
                    _ => Vec::new(),
                };
                let overlay = CanvasOverlay {
                    annotations,
                    trail: &trail,
                    selected: self.selected,
                    in_progress: self
                        .in_progress
                        .as_ref()
                        .filter(|(f, _)| Some(*f) == frame)
                        .map(|(_, a)| a),
                    drag_preview: self.drag.as_ref().map(|d| &d.preview),
                };
                canvas::show(
                    ui,
                    self.current_tool,
                    self.frame_texture.as_ref(),
                    self.frame_size,
                    overlay,
                    &self.status_text(),
                )
            })
            .inner;
        self.handle_canvas(canvas_action);

        self.notice_window(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_shapes() {
        assert_eq!(Tool::Select.shape(), None);
        assert_eq!(Tool::Rectangle.shape(), Some(ShapeKind::Rectangle));
        assert_eq!(Tool::Freehand.shape(), Some(ShapeKind::Freehand));
    }

    #[test]
    fn test_rectangle_follows_pointer() {
        let mut rect = Annotation::with_points(ShapeKind::Rectangle, vec![Point::new(1.0, 1.0)]);
        extend_shape(&mut rect, Point::new(5.0, 5.0));
        extend_shape(&mut rect, Point::new(9.0, 7.0));
        assert_eq!(rect.points, vec![Point::new(1.0, 1.0), Point::new(9.0, 7.0)]);
        assert!(is_drawable(&rect));
    }

    #[test]
    fn test_freehand_skips_tiny_moves() {
        let mut path = Annotation::with_points(ShapeKind::Freehand, vec![Point::new(0.0, 0.0)]);
        extend_shape(&mut path, Point::new(0.5, 0.5));
        assert_eq!(path.point_count(), 1);
        assert!(!is_drawable(&path));
        extend_shape(&mut path, Point::new(3.0, 0.0));
        assert_eq!(path.point_count(), 2);
        assert!(is_drawable(&path));
    }

    #[test]
    fn test_default_label_applies_to_new_annotations() {
        let mut options = DrawOptions::default();
        assert_eq!(options.annotation(ShapeKind::Point, vec![Point::new(1.0, 1.0)]).label, None);

        options.default_label = "  car ".to_string();
        let annotation = options.annotation(ShapeKind::Line, vec![Point::new(1.0, 1.0)]);
        assert_eq!(annotation.label.as_deref(), Some("car"));
        assert_eq!(annotation.points, vec![Point::new(1.0, 1.0)]);
    }

    #[test]
    fn test_trail_span_is_one_second() {
        assert_eq!(trail_span(&VideoMetadata::new("a.mp4", 29.97, 100, 8, 8)), 30);
        assert_eq!(trail_span(&VideoMetadata::new("a.png", 1.0, 1, 8, 8)), 1);
        assert_eq!(trail_span(&VideoMetadata::new("a.mp4", 0.0, 1, 8, 8)), 1);
    }

    #[test]
    fn test_degenerate_shapes_are_dropped() {
        let flat = Annotation::with_points(
            ShapeKind::Rectangle,
            vec![Point::new(2.0, 2.0), Point::new(8.0, 2.0)],
        );
        assert!(!is_drawable(&flat));
        let dot = Annotation::with_points(ShapeKind::Line, vec![Point::new(2.0, 2.0), Point::new(2.0, 2.0)]);
        assert!(!is_drawable(&dot));
    }
}

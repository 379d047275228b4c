// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotater - frame-indexed video annotation
//!
//! A cross-platform desktop application for drawing points, lines,
//! rectangles and freehand paths on individual frames of a video.

mod app;
mod config;
mod error;
mod io;
mod logging;
mod models;
mod playback;
mod session;
mod ui;
mod util;

use anyhow::Result;
use app::AnnotaterApp;
use config::AppConfig;
use std::path::PathBuf;

fn setup() -> Result<AppConfig> {
    let config = AppConfig::discover()?;
    logging::init(&config.logging)?;
    log::info!("Annotater {} starting", config.app_version);
    Ok(config)
}

fn main() -> Result<()> {
    let config = match setup() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("annotater: {:#}", e);
            std::process::exit(1);
        }
    };

    // Optional media file to open at launch
    let media = std::env::args_os().nth(1).map(PathBuf::from);

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Annotater"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Annotater",
        options,
        Box::new(move |_cc| Ok(Box::new(AnnotaterApp::new(config, media)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    log::info!("Annotater exiting");
    Ok(())
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Logging setup.
//!
//! Each configured handler is keyed by a severity and routes every
//! record at or above that severity to its destination, either the
//! console or a log file. Every handler is backed by its own
//! `env_logger` logger; a small router fans records out to them.

use anyhow::{bail, Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Handler severities. `CRITICAL` has no counterpart in `log` and
/// behaves like `ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    #[serde(alias = "WARN")]
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Severity::Debug => LevelFilter::Debug,
            Severity::Info => LevelFilter::Info,
            Severity::Warning => LevelFilter::Warn,
            Severity::Error | Severity::Critical => LevelFilter::Error,
        }
    }
}

/// Where a handler writes: `console` (stderr) or a file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Destination {
    Console,
    File(PathBuf),
}

impl From<String> for Destination {
    fn from(s: String) -> Self {
        match s.trim() {
            "console" | "stderr" => Destination::Console,
            path => Destination::File(PathBuf::from(path)),
        }
    }
}

impl From<Destination> for String {
    fn from(d: Destination) -> Self {
        match d {
            Destination::Console => "console".to_string(),
            Destination::File(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Logging section of the application config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub handlers: BTreeMap<Severity, Destination>,
    /// Extra `env_logger` directives, e.g. `"wgpu_core=warn"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut handlers = BTreeMap::new();
        handlers.insert(Severity::Info, Destination::Console);
        Self {
            handlers,
            filters: Some("eframe=warn,egui_glow=warn,winit=warn".to_string()),
        }
    }
}

struct Handler {
    max_level: LevelFilter,
    logger: env_logger::Logger,
}

/// Fans records out to per-severity handlers.
pub struct LevelRouter {
    handlers: Vec<Handler>,
}

impl LevelRouter {
    /// Build the router, opening (and creating) any log files.
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        if config.handlers.is_empty() {
            bail!("logging configuration defines no handlers");
        }

        let mut handlers = Vec::with_capacity(config.handlers.len());
        for (severity, destination) in &config.handlers {
            let max_level = severity.level_filter();
            let mut builder = env_logger::Builder::new();
            builder.filter_level(max_level);
            if let Some(filters) = &config.filters {
                builder.parse_filters(filters);
            }
            match destination {
                Destination::Console => {
                    builder.target(env_logger::Target::Stderr);
                }
                Destination::File(path) => {
                    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                        std::fs::create_dir_all(dir)
                            .with_context(|| format!("creating log directory {}", dir.display()))?;
                    }
                    let file = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(path)
                        .with_context(|| format!("opening log file {}", path.display()))?;
                    builder
                        .target(env_logger::Target::Pipe(Box::new(file)))
                        .write_style(env_logger::WriteStyle::Never)
                        .format_timestamp_millis();
                }
            }
            handlers.push(Handler {
                max_level,
                logger: builder.build(),
            });
        }
        Ok(Self { handlers })
    }

    /// Most verbose level any handler accepts.
    pub fn max_level(&self) -> LevelFilter {
        self.handlers
            .iter()
            .map(|h| h.max_level)
            .max()
            .unwrap_or(LevelFilter::Off)
    }

    fn accepts(handler: &Handler, level: Level) -> bool {
        level <= handler.max_level
    }
}

impl Log for LevelRouter {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.handlers
            .iter()
            .any(|h| Self::accepts(h, metadata.level()) && h.logger.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        for handler in &self.handlers {
            if Self::accepts(handler, record.level()) && handler.logger.matches(record) {
                handler.logger.log(record);
            }
        }
    }

    fn flush(&self) {
        for handler in &self.handlers {
            handler.logger.flush();
        }
    }
}

/// Install the router as the global `log` backend.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let router = LevelRouter::from_config(config)?;
    let max_level = router.max_level();
    log::set_boxed_logger(Box::new(router)).context("a logger is already installed")?;
    log::set_max_level(max_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_handlers() {
        let yaml = r#"
handlers:
  DEBUG: logs/debug.log
  INFO: console
  WARN: console
  CRITICAL: logs/critical.log
filters: "winit=warn"
"#;
        let config: LoggingConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.handlers.len(), 4);
        assert_eq!(config.handlers[&Severity::Info], Destination::Console);
        assert_eq!(config.handlers[&Severity::Warning], Destination::Console);
        assert_eq!(
            config.handlers[&Severity::Debug],
            Destination::File(PathBuf::from("logs/debug.log"))
        );
        assert_eq!(Severity::Critical.level_filter(), LevelFilter::Error);
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let yaml = "handlers:\n  LOUD: console\n";
        assert!(serde_yaml::from_str::<LoggingConfig>(yaml).is_err());
    }

    #[test]
    fn test_empty_handlers_rejected() {
        let config = LoggingConfig {
            handlers: BTreeMap::new(),
            filters: None,
        };
        assert!(LevelRouter::from_config(&config).is_err());
    }

    #[test]
    fn test_records_routed_by_severity() {
        let dir = tempdir().unwrap();
        let debug_log = dir.path().join("debug.log");
        let error_log = dir.path().join("nested").join("error.log");

        let mut handlers = BTreeMap::new();
        handlers.insert(Severity::Debug, Destination::File(debug_log.clone()));
        handlers.insert(Severity::Error, Destination::File(error_log.clone()));
        let router = LevelRouter::from_config(&LoggingConfig { handlers, filters: None }).unwrap();
        assert_eq!(router.max_level(), LevelFilter::Debug);

        router.log(
            &Record::builder()
                .level(Level::Debug)
                .target("annotater")
                .args(format_args!("decoded frame"))
                .build(),
        );
        router.log(
            &Record::builder()
                .level(Level::Error)
                .target("annotater")
                .args(format_args!("save failed"))
                .build(),
        );
        router.flush();

        let debug_text = std::fs::read_to_string(&debug_log).unwrap();
        let error_text = std::fs::read_to_string(&error_log).unwrap();
        assert!(debug_text.contains("decoded frame"));
        assert!(debug_text.contains("save failed"));
        assert!(!error_text.contains("decoded frame"));
        assert!(error_text.contains("save failed"));
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Read once at startup from a YAML file and handed to the components
//! that need it.

use crate::logging::LoggingConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ANNOTATER_CONFIG";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "annotater.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_version: String,
    /// Where annotation documents are saved by default. Defaults to the
    /// directory of the opened media.
    pub output_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            output_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("invalid configuration")
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("parsing configuration {}", path.display()))
    }

    /// Load from `$ANNOTATER_CONFIG`, else `./annotater.yaml`, else
    /// defaults. A file named by the environment variable must exist.
    pub fn discover() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            Self::load(local)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Destination, Severity};

    #[test]
    fn test_full_config() {
        let yaml = r#"
app_version: "1.2.0"
output_dir: /data/annotated
logging:
  handlers:
    INFO: console
    ERROR: logs/error.log
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.app_version, "1.2.0");
        assert_eq!(config.output_dir, Some(PathBuf::from("/data/annotated")));
        assert_eq!(
            config.logging.handlers[&Severity::Error],
            Destination::File(PathBuf::from("logs/error.log"))
        );
        assert_eq!(config.logging.filters, None);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = AppConfig::from_yaml("output_dir: out\n").unwrap();
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.app_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_malformed_config_fails() {
        assert!(AppConfig::from_yaml("logging: [not, a, map]").is_err());
        assert!(AppConfig::load(Path::new("/no/such/annotater.yaml")).is_err());
    }
}

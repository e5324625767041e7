//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.evalboard.toml` files.

use crate::cli::{Args, ExportFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".evalboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// School details printed on reports.
    #[serde(default)]
    pub school: SchoolConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Share link settings.
    #[serde(default)]
    pub share: ShareConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the JSON store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            verbose: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".evalboard")
}

/// School details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchoolConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub supervisor: String,

    #[serde(default)]
    pub academic_year: String,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default export format.
    #[serde(default)]
    pub format: ExportFormat,

    /// Rows in the Markdown criteria table (0 = all).
    #[serde(default = "default_top_criteria")]
    pub top_criteria: usize,

    /// List individual reports under each band.
    #[serde(default = "default_true")]
    pub include_reports: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            top_criteria: default_top_criteria(),
            include_reports: true,
        }
    }
}

fn default_top_criteria() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// Share link settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Phone number used when `share` gets no `--phone`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_phone: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.clone();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

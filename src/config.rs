//! Organizer configuration.
//!
//! This module loads the source and destination directories, the cutoff
//! date and the ordered set of file name patterns from a TOML file, and
//! compiles them into a [`LoadRequest`].
//!
//! # Configuration File Format
//!
//! ```toml
//! source = "/home/me/Pictures/inbox"
//! destination = "/home/me/Pictures/library"
//! cutoff = "01/01/2020"
//!
//! [[patterns]]
//! name = "camera"
//! regex = '^IMG_\d{8}'
//!
//! [[patterns]]
//! name = "video"
//! regex = '^VID_\d{8}'
//! ```
//!
//! Patterns are an array of tables so the order they are tried in is the
//! order they are written in.

use crate::eligibility::{Criteria, PatternSet};
use crate::error::ConfigError;
use crate::organizer::LoadRequest;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Format of the `cutoff` value.
pub const CUTOFF_FORMAT: &str = "%d/%m/%Y";

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".mediatidy.toml";

/// One named regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub name: String,
    pub regex: String,
}

/// Raw configuration as written in the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Directory to read media from.
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Root of the `yyyy/MM` tree files are moved into.
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Files captured before this `dd/MM/yyyy` date are left alone.
    /// No cutoff when absent.
    #[serde(default)]
    pub cutoff: Option<String>,

    /// Name patterns, tried in order.
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
}

impl OrganizerConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.mediatidy.toml` in the current directory
    /// 3. Look for `~/.config/mediatidy/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("mediatidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::Invalid` if TOML parsing fails.
    /// Returns `ConfigError::Io` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Parsed cutoff date. `NaiveDate::MIN` when none is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidCutoff` if the value is not `dd/MM/yyyy`.
    pub fn cutoff_date(&self) -> Result<NaiveDate, ConfigError> {
        match self.cutoff.as_deref() {
            None => Ok(NaiveDate::MIN),
            Some(value) => parse_cutoff(value),
        }
    }

    /// Compile the name patterns, keeping their order.
    pub fn pattern_set(&self) -> Result<PatternSet, ConfigError> {
        PatternSet::compile(
            self.patterns
                .iter()
                .map(|p| (p.name.clone(), p.regex.as_str())),
        )
    }

    /// Compile configuration into a request the organizer can run.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory is missing from the configuration, the
    /// cutoff is malformed, or any regex is invalid.
    pub fn compile(&self) -> Result<LoadRequest, ConfigError> {
        let source_dir = self
            .source
            .clone()
            .ok_or(ConfigError::MissingPath("source"))?;
        let destination_dir = self
            .destination
            .clone()
            .ok_or(ConfigError::MissingPath("destination"))?;

        Ok(LoadRequest {
            source_dir,
            destination_dir,
            criteria: Criteria::new(self.cutoff_date()?, self.pattern_set()?),
        })
    }
}

/// Parse a `dd/MM/yyyy` cutoff string.
pub fn parse_cutoff(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), CUTOFF_FORMAT).map_err(|_| {
        ConfigError::InvalidCutoff {
            value: value.to_string(),
        }
    })
}

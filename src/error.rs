//! Error types for loading, processing and configuration.
//!
//! Malformed file names are not errors: the date extractor always falls back
//! to the creation time. Only filesystem failures and invalid configuration
//! are reported.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error returned by the organizer surfaces.
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Load failed: {0}")]
    Load(#[from] LoadError),

    #[error("Process failed: {0}")]
    Process(#[from] ProcessError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A load or process pass is already running.
    #[error("Another load or process pass is still running")]
    Busy,

    /// The background worker panicked or vanished before reporting.
    #[error("Background pass ended without a result")]
    WorkerLost,
}

/// Failures of the load pass.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Destination directory not found: {path}")]
    DestinationNotFound { path: PathBuf },

    #[error("Failed to enumerate {path}: {source}")]
    Enumerate {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read metadata of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Load was cancelled")]
    Cancelled,
}

/// Failures of the process pass. Each carries the source path of the
/// record that could not be moved.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to create directory {path} for {record}: {source}")]
    CreateDirectory {
        record: PathBuf,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot move {record}: {destination} already exists")]
    DestinationExists {
        record: PathBuf,
        destination: PathBuf,
    },

    #[error("Failed to move {record} to {destination}: {source}")]
    Move {
        record: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Process was cancelled")]
    Cancelled,
}

impl ProcessError {
    /// Source path of the record that failed, if the error concerns one.
    pub fn record(&self) -> Option<&PathBuf> {
        match self {
            Self::CreateDirectory { record, .. }
            | Self::DestinationExists { record, .. }
            | Self::Move { record, .. } => Some(record),
            Self::Cancelled => None,
        }
    }
}

/// Errors that can occur during configuration loading and compilation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid cutoff date '{value}': expected dd/MM/yyyy")]
    InvalidCutoff { value: String },

    #[error("Invalid regex pattern '{name}' ({pattern}): {reason}")]
    InvalidRegex {
        name: String,
        pattern: String,
        reason: String,
    },

    #[error("No {0} directory configured")]
    MissingPath(&'static str),

    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for the organizer surfaces.
pub type Result<T> = std::result::Result<T, OrganizerError>;

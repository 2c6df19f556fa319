//! Command-line interface module for mediatidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing with clap
//! - Merging command-line overrides into the loaded configuration
//! - Running the load and process passes in the background
//! - Rendering progress and summaries from organizer events
//!
//! ## Usage
//! ```bash
//! # List what would be organized
//! mediatidy scan --source ~/Pictures/inbox --destination ~/Pictures/library
//!
//! # Move files into destination/yyyy/MM
//! mediatidy organize --cutoff 01/01/2020 --pattern camera='^IMG_\d{8}'
//! ```

use crate::background::BackgroundOrganizer;
use crate::config::{OrganizerConfig, PatternEntry};
use crate::error::{ConfigError, LoadError, OrganizerError};
use crate::events::{Event, EventReceiver};
use crate::medium::MediumRecord;
use crate::organizer::OrganizerState;
use crate::output::OutputFormatter;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// mediatidy - sort media into year/month folders
#[derive(Parser, Debug)]
#[command(name = "mediatidy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify the source tree and list the files that would be organized
    Scan {
        #[command(flatten)]
        options: SourceOptions,

        /// Print the retained files as JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify the source tree and move files into destination/yyyy/MM
    Organize {
        #[command(flatten)]
        options: SourceOptions,

        /// Show where files would go without moving anything
        #[arg(long)]
        dry_run: bool,
    },
}

/// Options shared by every command. Flags override the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceOptions {
    /// Configuration file (defaults to .mediatidy.toml, then ~/.config/mediatidy/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory to read media from
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Root of the year/month tree
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// Skip files captured before this date (dd/MM/yyyy)
    #[arg(long)]
    pub cutoff: Option<String>,

    /// Name pattern as NAME=REGEX; replaces configured patterns, may be repeated
    #[arg(short, long = "pattern", value_parser = parse_pattern)]
    pub patterns: Vec<PatternEntry>,
}

fn parse_pattern(value: &str) -> Result<PatternEntry, String> {
    let (name, regex) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=REGEX, got '{}'", value))?;
    if name.is_empty() {
        return Err("pattern name must not be empty".to_string());
    }
    Ok(PatternEntry {
        name: name.to_string(),
        regex: regex.to_string(),
    })
}

/// Parse arguments from the process and run.
pub fn run() -> Result<(), OrganizerError> {
    run_command(Cli::parse().command)
}

/// Runs one command to completion.
pub fn run_command(command: Command) -> Result<(), OrganizerError> {
    match command {
        Command::Scan { options, json } => scan(&options, json),
        Command::Organize { options, dry_run } => organize(&options, dry_run),
    }
}

/// Loads the configuration and applies command-line overrides.
pub fn resolve_config(options: &SourceOptions) -> Result<OrganizerConfig, ConfigError> {
    let mut config = OrganizerConfig::load(options.config.as_deref())?;

    if let Some(source) = &options.source {
        config.source = Some(source.clone());
    }
    if let Some(destination) = &options.destination {
        config.destination = Some(destination.clone());
    }
    if let Some(cutoff) = &options.cutoff {
        config.cutoff = Some(cutoff.clone());
    }
    if !options.patterns.is_empty() {
        config.patterns = options.patterns.clone();
    }
    Ok(config)
}

/// Creates the destination directory if it is missing.
fn ensure_destination(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "Creating destination directory");
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Runs the load pass with a progress bar.
///
/// Returns the retained records and the destination they were loaded for.
fn load(
    organizer: &BackgroundOrganizer,
    options: &SourceOptions,
    quiet: bool,
) -> Result<(Vec<MediumRecord>, PathBuf), OrganizerError> {
    let request = resolve_config(options)?.compile()?;
    // A mistyped source must not leave an empty destination behind.
    if !request.source_dir.is_dir() {
        return Err(LoadError::SourceNotFound {
            path: request.source_dir,
        }
        .into());
    }
    ensure_destination(&request.destination_dir)?;
    let destination = request.destination_dir.clone();

    if !quiet {
        OutputFormatter::info(&format!(
            "Scanning {} (cutoff {})",
            request.source_dir.display(),
            request.criteria.cutoff.format("%d/%m/%Y")
        ));
    }

    let renderer = (!quiet).then(|| render_progress(organizer.subscribe()));
    let result = organizer.spawn_load(request)?.join();
    finish_renderer(renderer);
    result?;

    Ok((organizer.snapshot()?, destination))
}

fn scan(options: &SourceOptions, json: bool) -> Result<(), OrganizerError> {
    let organizer = BackgroundOrganizer::new();
    let (records, _) = load(&organizer, options, json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    OutputFormatter::header("Files found:");
    for record in &records {
        OutputFormatter::record_line(record, None);
    }
    OutputFormatter::summary_table(&records);
    Ok(())
}

fn organize(options: &SourceOptions, dry_run: bool) -> Result<(), OrganizerError> {
    let organizer = BackgroundOrganizer::new();
    let (records, destination) = load(&organizer, options, false)?;

    if records.is_empty() {
        OutputFormatter::warning("No files found to organize.");
        return Ok(());
    }

    if dry_run {
        OutputFormatter::dry_run_notice("Files would be organized as follows:");
        for record in &records {
            OutputFormatter::record_line(record, Some(&destination));
        }
        OutputFormatter::summary_table(&records);
        OutputFormatter::success("Dry run complete. No files were modified.");
        return Ok(());
    }

    let renderer = render_progress(organizer.subscribe());
    let result = organizer.spawn_process()?.join();
    finish_renderer(Some(renderer));

    match result {
        Ok(report) => {
            OutputFormatter::summary_table(&records);
            OutputFormatter::success(&format!("Moved {} files.", report.moved));
            Ok(())
        }
        Err(e) => {
            let moved = organizer
                .snapshot()
                .map(|r| r.iter().filter(|m| m.is_processed()).count())
                .unwrap_or(0);
            OutputFormatter::warning(&format!(
                "Stopped after moving {} of {} files.",
                moved,
                records.len()
            ));
            Err(e)
        }
    }
}

/// Drives a progress bar from organizer events until the pass finishes.
fn render_progress(receiver: EventReceiver) -> JoinHandle<()> {
    thread::spawn(move || {
        let pb = OutputFormatter::create_progress_bar();
        for event in receiver.iter() {
            match event {
                Event::Progress(percent) => pb.set_position(u64::from(percent)),
                Event::Summary(summary) => pb.set_message(summary),
                Event::Moved { destination, .. } => {
                    pb.set_message(destination.display().to_string())
                }
                // Every pass, failed or not, ends by leaving the busy states.
                Event::StateChanged(OrganizerState::Loaded | OrganizerState::Idle) => break,
                _ => {}
            }
        }
        pb.finish_and_clear();
    })
}

fn finish_renderer(renderer: Option<JoinHandle<()>>) {
    if let Some(handle) = renderer {
        let _ = handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern() {
        let entry = parse_pattern(r"camera=^IMG_\d{8}").unwrap();
        assert_eq!(entry.name, "camera");
        assert_eq!(entry.regex, r"^IMG_\d{8}");

        // Only the first '=' separates name from regex.
        let entry = parse_pattern("eq=a=b").unwrap();
        assert_eq!(entry.regex, "a=b");

        assert!(parse_pattern("no-separator").is_err());
        assert!(parse_pattern("=regex").is_err());
    }

    #[test]
    fn test_cli_parses_organize_flags() {
        let cli = Cli::try_parse_from([
            "mediatidy",
            "organize",
            "--source",
            "/in",
            "--destination",
            "/out",
            "--cutoff",
            "01/01/2020",
            "-p",
            "camera=^IMG_",
            "-p",
            "video=^VID_",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Command::Organize { options, dry_run } => {
                assert!(dry_run);
                assert_eq!(options.source, Some(PathBuf::from("/in")));
                assert_eq!(options.patterns.len(), 2);
                assert_eq!(options.patterns[1].name, "video");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_source_leaves_destination_uncreated() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("empty.toml");
        fs::write(&config_path, "").unwrap();
        let destination = temp_dir.path().join("library");

        let options = SourceOptions {
            config: Some(config_path),
            source: Some(temp_dir.path().join("typo")),
            destination: Some(destination.clone()),
            ..Default::default()
        };
        let err = run_command(Command::Scan {
            options,
            json: true,
        })
        .unwrap_err();

        assert!(matches!(
            err,
            OrganizerError::Load(LoadError::SourceNotFound { .. })
        ));
        assert!(!destination.exists());
    }

    #[test]
    fn test_dry_run_uses_loaded_destination() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("empty.toml");
        fs::write(&config_path, "").unwrap();
        let source = temp_dir.path().join("inbox");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("IMG_20230615.jpg"), b"x").unwrap();
        let destination = temp_dir.path().join("library");

        let options = SourceOptions {
            config: Some(config_path),
            source: Some(source.clone()),
            destination: Some(destination.clone()),
            patterns: vec![parse_pattern("camera=^IMG_").unwrap()],
            ..Default::default()
        };
        let organizer = BackgroundOrganizer::new();
        let (records, loaded_for) = load(&organizer, &options, true).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(loaded_for, destination);

        run_command(Command::Organize {
            options,
            dry_run: true,
        })
        .unwrap();
        assert!(source.join("IMG_20230615.jpg").exists());
        assert!(!destination.join("2023").exists());
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            "source = \"/from-file\"\ndestination = \"/dest\"\n[[patterns]]\nname = \"a\"\nregex = \"x\"\n",
        )
        .unwrap();

        let options = SourceOptions {
            config: Some(config_path),
            source: Some(PathBuf::from("/from-flag")),
            ..Default::default()
        };
        let config = resolve_config(&options).unwrap();

        assert_eq!(config.source, Some(PathBuf::from("/from-flag")));
        assert_eq!(config.destination, Some(PathBuf::from("/dest")));
        assert_eq!(config.patterns.len(), 1);
    }
}

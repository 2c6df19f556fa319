//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking, and the per-month summary table.

use crate::medium::MediumRecord;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - A percentage progress bar fed by organizer events
/// - A summary table of files per destination month
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mediatidy::output::OutputFormatter;
    /// OutputFormatter::success("All files moved");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar that takes percentages (0..=100).
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints one retained record and where it will go.
    pub fn record_line(record: &MediumRecord, destination: Option<&Path>) {
        let origin = if record.used_fallback() {
            "created".yellow()
        } else {
            "name".green()
        };
        let line = format!(
            " - {} ({} bytes, {} from {})",
            record.name(),
            record.size_bytes(),
            record.date_taken().format("%Y-%m-%d"),
            origin
        );
        match destination {
            Some(dest) => println!("{}\n   → {}", line, record.target_dir(dest).display()),
            None => println!("{}", line),
        }
    }

    /// Prints a summary table with file counts per `yyyy/MM` folder.
    pub fn summary_table<'a>(records: impl IntoIterator<Item = &'a MediumRecord>) {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            let month = record.date_taken().format("%Y/%m").to_string();
            *counts.entry(month).or_insert(0) += 1;
        }
        let total: usize = counts.values().sum();

        Self::header("SUMMARY");
        println!("{:<8} | {}", "Folder".bold(), "Files".bold());
        println!("{}", "-".repeat(18));
        for (month, count) in &counts {
            println!(
                "{:<8} | {} {}",
                month,
                count.to_string().green(),
                Self::file_word(*count)
            );
        }
        println!("{}", "-".repeat(18));
        println!(
            "{:<8} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            Self::file_word(total)
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    fn file_word(count: usize) -> &'static str {
        if count == 1 { "file" } else { "files" }
    }
}

//! Batch organization: the load pass and the process pass.
//!
//! `load` walks the source tree, classifies every file and keeps the
//! eligible, non-superseded ones in an insertion-ordered result set.
//! `process` then moves each retained file into `destination/yyyy/MM`,
//! stopping at the first failure.
//!
//! ```text
//! Idle --load--> Loading --> Loaded --process--> Processing --> Loaded
//! ```
//!
//! Both passes are strictly sequential and report through an [`EventBus`].

use crate::dedup::{Admission, ResultSet};
use crate::eligibility::Criteria;
use crate::error::{LoadError, ProcessError};
use crate::events::{Event, EventBus, EventReceiver, summary_message};
use crate::medium::{FileFacts, MediumRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Lifecycle of a [`BatchOrganizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganizerState {
    Idle,
    Loading,
    Loaded,
    Processing,
}

/// Everything one load pass needs, passed explicitly.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub criteria: Criteria,
}

/// Shared flag checked between files.
///
/// Raising it stops the running pass, or the next one if none is running,
/// before its next file. The flag is lowered again when that pass returns.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Outcome of a successful load pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Files found under the source directory.
    pub examined: usize,
    /// Files eligible before duplicate resolution.
    pub eligible: usize,
    /// Files left in the result set.
    pub retained: usize,
}

/// Outcome of a successful process pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    /// Records moved during this pass.
    pub moved: usize,
    /// Records skipped because an earlier pass already moved them.
    pub already_processed: usize,
}

/// Drives classification and relocation of one source tree.
pub struct BatchOrganizer {
    state: OrganizerState,
    results: ResultSet,
    destination: Option<PathBuf>,
    events: EventBus,
    cancel: CancelFlag,
}

impl Default for BatchOrganizer {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchOrganizer {
    pub fn new() -> Self {
        Self::with_events(EventBus::new())
    }

    /// Creates an organizer reporting through an existing bus.
    pub fn with_events(events: EventBus) -> Self {
        Self {
            state: OrganizerState::Idle,
            results: ResultSet::new(),
            destination: None,
            events,
            cancel: CancelFlag::new(),
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn state(&self) -> OrganizerState {
        self.state
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// Destination of the last successful load validation.
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    fn set_state(&mut self, state: OrganizerState) {
        self.state = state;
        self.events.emit(Event::StateChanged(state));
    }

    /// Classifies every file under the source directory and rebuilds the
    /// result set.
    ///
    /// Progress is emitted after each file as `floor(seen / total * 100)`.
    /// A summary is emitted after each admission and once at the end.
    ///
    /// # Errors
    ///
    /// * `SourceNotFound` / `DestinationNotFound` if either directory is missing.
    /// * `Enumerate` if walking the tree fails.
    /// * `Metadata` if a file vanishes or cannot be read mid-pass.
    /// * `Cancelled` if the cancel flag was raised.
    ///
    /// A failed pass applies nothing: the previous result set, destination
    /// and state are restored.
    pub fn load(&mut self, request: &LoadRequest) -> Result<LoadReport, LoadError> {
        let previous = self.state;
        self.set_state(OrganizerState::Loading);
        info!(source = %request.source_dir.display(), "Loading media files");

        let files = match Self::enumerate(request) {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "Load aborted before classification");
                self.cancel.reset();
                self.set_state(previous);
                return Err(e);
            }
        };

        let kept_results = std::mem::take(&mut self.results);
        let kept_destination = self.destination.replace(request.destination_dir.clone());

        let outcome = self.classify_all(&files, &request.criteria);
        self.cancel.reset();

        match outcome {
            Ok(eligible) => {
                self.set_state(OrganizerState::Loaded);
                let retained = self.results.len();
                self.events.emit(Event::Summary(summary_message(retained)));
                self.events.emit(Event::LoadFinished { retained });
                info!(examined = files.len(), eligible, retained, "Load complete");
                Ok(LoadReport {
                    examined: files.len(),
                    eligible,
                    retained,
                })
            }
            Err(e) => {
                warn!(error = %e, discarded = self.results.len(), "Load aborted");
                self.results = kept_results;
                self.destination = kept_destination;
                self.events
                    .emit(Event::Summary(summary_message(self.results.len())));
                self.set_state(previous);
                Err(e)
            }
        }
    }

    /// Validates the request and lists every regular file below the source.
    fn enumerate(request: &LoadRequest) -> Result<Vec<PathBuf>, LoadError> {
        if !request.source_dir.is_dir() {
            return Err(LoadError::SourceNotFound {
                path: request.source_dir.clone(),
            });
        }
        if !request.destination_dir.is_dir() {
            return Err(LoadError::DestinationNotFound {
                path: request.destination_dir.clone(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&request.source_dir) {
            let entry = entry.map_err(|e| LoadError::Enumerate {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| request.source_dir.clone()),
                source: e,
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Returns the number of eligible files seen.
    fn classify_all(&mut self, files: &[PathBuf], criteria: &Criteria) -> Result<usize, LoadError> {
        let total = files.len();
        let mut eligible = 0;

        for (index, path) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(LoadError::Cancelled);
            }

            let facts = FileFacts::from_path(path).map_err(|e| LoadError::Metadata {
                path: path.clone(),
                source: e,
            })?;
            let record = MediumRecord::classify(facts, criteria);

            if record.is_eligible() {
                eligible += 1;
                self.admit(record);
            } else {
                debug!(path = %path.display(), "Skipped ineligible file");
            }

            let percent = (index + 1) * 100 / total;
            self.events.emit(Event::Progress(percent as u8));
        }

        Ok(eligible)
    }

    fn admit(&mut self, record: MediumRecord) {
        let admitted = Event::Admitted {
            name: record.name().to_string(),
            path: record.full_path().to_path_buf(),
            size_bytes: record.size_bytes(),
            date_taken: record.date_taken(),
        };

        if let Admission::Superseded(old) = self.results.admit(record) {
            debug!(path = %old.full_path().display(), "Superseded by larger duplicate");
            self.events.emit(Event::Superseded {
                name: old.name().to_string(),
                path: old.full_path().to_path_buf(),
                size_bytes: old.size_bytes(),
            });
        }

        self.events.emit(admitted);
        self.events
            .emit(Event::Summary(summary_message(self.results.len())));
    }

    /// Moves every retained record into `destination/yyyy/MM`.
    ///
    /// Records already flagged as processed are skipped, so a pass stopped by
    /// a failure can be resumed after fixing the cause.
    ///
    /// # Errors
    ///
    /// Stops at the first record whose directory cannot be created or whose
    /// move fails. Records moved before it stay moved and flagged; the rest
    /// are untouched.
    pub fn process(&mut self) -> Result<ProcessReport, ProcessError> {
        self.set_state(OrganizerState::Processing);

        let outcome = self.move_all();
        self.cancel.reset();
        self.set_state(OrganizerState::Loaded);

        match outcome {
            Ok(report) => {
                self.events.emit(Event::ProcessFinished {
                    moved: report.moved,
                });
                info!(moved = report.moved, "Processing complete");
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "Processing stopped");
                Err(e)
            }
        }
    }

    fn move_all(&mut self) -> Result<ProcessReport, ProcessError> {
        let mut report = ProcessReport {
            moved: 0,
            already_processed: 0,
        };
        let Some(destination) = self.destination.clone() else {
            return Ok(report);
        };
        let total = self.results.len();

        for index in 0..total {
            if self.cancel.is_cancelled() {
                return Err(ProcessError::Cancelled);
            }

            let Some(record) = self.results.get_mut(index) else {
                break;
            };
            if record.is_processed() {
                report.already_processed += 1;
                continue;
            }

            let target = Self::move_record(record, &destination)?;
            record.mark_processed();
            report.moved += 1;

            info!(from = %record.full_path().display(), to = %target.display(), "Moved");
            self.events.emit(Event::Moved {
                path: record.full_path().to_path_buf(),
                destination: target,
            });
            self.events
                .emit(Event::Progress(((index + 1) * 100 / total) as u8));
        }

        Ok(report)
    }

    /// Creates the record's `yyyy/MM` directory and moves the file into it.
    ///
    /// Returns the new path of the file. An existing file at the target is
    /// never overwritten.
    fn move_record(record: &MediumRecord, destination: &Path) -> Result<PathBuf, ProcessError> {
        let target_dir = record.target_dir(destination);

        fs::create_dir_all(&target_dir).map_err(|e| ProcessError::CreateDirectory {
            record: record.full_path().to_path_buf(),
            path: target_dir.clone(),
            source: e,
        })?;

        let target = target_dir.join(record.file_name());
        if target.exists() {
            return Err(ProcessError::DestinationExists {
                record: record.full_path().to_path_buf(),
                destination: target,
            });
        }

        move_file(record.full_path(), &target).map_err(|e| ProcessError::Move {
            record: record.full_path().to_path_buf(),
            destination: target.clone(),
            source: e,
        })?;

        Ok(target)
    }
}

/// Renames `from` to `to`, falling back to copy-verify-delete across devices.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            let source_size = fs::metadata(from)?.len();
            fs::copy(from, to)?;

            let copied_size = fs::metadata(to)?.len();
            if copied_size != source_size {
                let _ = fs::remove_file(to);
                return Err(io::Error::other(format!(
                    "copy verification failed: source {} bytes, destination {} bytes",
                    source_size, copied_size
                )));
            }

            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}

//! mediatidy - sort photos and videos into year/month folders
//!
//! This library classifies the files of a source tree, reads each file's
//! capture date from its name (falling back to its creation time), keeps
//! the eligible ones after a name-based duplicate check, and moves them into
//! a `destination/yyyy/MM` tree.
//!
//! - `date_extractor` - capture date from a file name
//! - `eligibility` - which files get organized
//! - `medium` - one classified file
//! - `dedup` - the result set and its duplicate rule
//! - `organizer` - the load and process passes
//! - `background` - running passes off the calling thread
//! - `events` - progress and summary updates for observers

pub mod background;
pub mod cli;
pub mod config;
pub mod date_extractor;
pub mod dedup;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod medium;
pub mod organizer;
pub mod output;

pub use background::{BackgroundOrganizer, PassHandle};
pub use config::OrganizerConfig;
pub use date_extractor::{DateExtractor, ResolvedDate};
pub use dedup::{Admission, ResultSet};
pub use eligibility::{Criteria, EligibilityFilter, PatternSet};
pub use error::{ConfigError, LoadError, OrganizerError, ProcessError, Result};
pub use events::{Event, EventBus, EventReceiver};
pub use medium::{FileFacts, MediumRecord};
pub use organizer::{
    BatchOrganizer, CancelFlag, LoadReport, LoadRequest, OrganizerState, ProcessReport,
};

/// Install the tracing subscriber used by the binary.
///
/// Reads the filter from `RUST_LOG`, defaulting to `warn`, and writes to
/// stderr so diagnostics never mix with the progress bar.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Classified media files.
//!
//! A [`MediumRecord`] is built once from a [`FileFacts`] snapshot. Its date
//! and eligibility are fixed at construction; only the processed flag
//! changes afterwards, and only from false to true.

use crate::date_extractor::DateExtractor;
use crate::eligibility::{Candidate, Criteria, EligibilityFilter};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;
use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Filesystem facts about one file, captured at classification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFacts {
    pub full_path: PathBuf,
    pub name: String,
    /// Extension with its leading dot, empty when there is none.
    pub extension: String,
    pub is_hidden: bool,
    pub size_bytes: u64,
    pub creation_time: NaiveDateTime,
}

impl FileFacts {
    /// Reads the facts for `path` from the filesystem.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self::from_metadata(path, &metadata))
    }

    /// Builds the facts from already-fetched metadata.
    ///
    /// Platforms that cannot report a creation time get the minimum date.
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let creation_time = metadata
            .created()
            .map(to_local_naive)
            .unwrap_or(NaiveDateTime::MIN);

        Self {
            full_path: path.to_path_buf(),
            is_hidden: is_hidden(&name, metadata),
            name,
            extension,
            size_bytes: metadata.len(),
            creation_time,
        }
    }
}

fn to_local_naive(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

#[cfg(windows)]
fn is_hidden(name: &str, metadata: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    name.starts_with('.') || metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
}

#[cfg(not(windows))]
fn is_hidden(name: &str, _metadata: &Metadata) -> bool {
    name.starts_with('.')
}

/// One classified file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediumRecord {
    full_path: PathBuf,
    name: String,
    extension: String,
    is_hidden: bool,
    size_bytes: u64,
    date_taken: NaiveDateTime,
    used_fallback: bool,
    is_eligible: bool,
    is_processed: bool,
}

impl MediumRecord {
    /// Classifies a file: resolves its capture date and decides eligibility.
    pub fn classify(facts: FileFacts, criteria: &Criteria) -> Self {
        let resolved = DateExtractor::resolve(&facts.name, &facts.extension, facts.creation_time);

        let candidate = Candidate {
            full_path: &facts.full_path,
            name: &facts.name,
            is_hidden: facts.is_hidden,
            date_taken: resolved.date,
            used_fallback: resolved.used_fallback,
        };
        let is_eligible = EligibilityFilter::is_eligible(&candidate, criteria);

        Self {
            full_path: facts.full_path,
            name: facts.name,
            extension: facts.extension,
            is_hidden: facts.is_hidden,
            size_bytes: facts.size_bytes,
            date_taken: resolved.date,
            used_fallback: resolved.used_fallback,
            is_eligible,
            is_processed: false,
        }
    }

    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Display form of the file name. Not valid UTF-8 bytes are replaced.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name exactly as the filesystem reports it.
    pub fn file_name(&self) -> &OsStr {
        self.full_path.file_name().unwrap_or_default()
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn date_taken(&self) -> NaiveDateTime {
        self.date_taken
    }

    /// True when `date_taken` is the creation time rather than a name-derived date.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    pub fn is_eligible(&self) -> bool {
        self.is_eligible
    }

    pub fn is_processed(&self) -> bool {
        self.is_processed
    }

    /// `yyyy/MM` directory below `destination` this record belongs in.
    pub fn target_dir(&self, destination: &Path) -> PathBuf {
        destination
            .join(self.date_taken.format("%Y").to_string())
            .join(self.date_taken.format("%m").to_string())
    }

    /// Flags the record as moved. Called once, after a successful move.
    pub(crate) fn mark_processed(&mut self) {
        self.is_processed = true;
    }
}

impl std::fmt::Display for MediumRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::eligibility::PatternSet;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    pub(crate) fn facts(name: &str, size_bytes: u64, created: NaiveDateTime) -> FileFacts {
        let full_path = PathBuf::from("/source").join(name);
        FileFacts {
            extension: full_path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
            full_path,
            name: name.to_string(),
            is_hidden: name.starts_with('.'),
            size_bytes,
            creation_time: created,
        }
    }

    pub(crate) fn criteria_2020(patterns: &[(&str, &str)]) -> Criteria {
        Criteria::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            PatternSet::compile(patterns.iter().copied()).unwrap(),
        )
    }

    fn may_2019() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_camera_file_is_eligible() {
        let record = MediumRecord::classify(
            facts("IMG_20230615_010101.jpg", 50, may_2019()),
            &criteria_2020(&[("camera", r"^IMG_\d{8}")]),
        );

        assert!(record.is_eligible());
        assert!(!record.used_fallback());
        assert!(!record.is_processed());
        assert_eq!(
            record.date_taken().date(),
            NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()
        );
        assert_eq!(
            record.target_dir(Path::new("/dest")),
            PathBuf::from("/dest/2023/06")
        );
    }

    #[test]
    fn test_undated_old_file_is_not_eligible() {
        let record = MediumRecord::classify(
            facts("photo.jpg", 10, may_2019()),
            &criteria_2020(&[("any", ".*")]),
        );

        assert!(record.used_fallback());
        assert_eq!(record.date_taken(), may_2019());
        assert!(!record.is_eligible());
    }

    #[test]
    fn test_extension_and_name_are_derived() {
        let record = MediumRecord::classify(facts("clip.MOV", 1, may_2019()), &criteria_2020(&[]));
        assert_eq!(record.name(), "clip.MOV");
        assert_eq!(record.extension(), ".MOV");
        assert_eq!(record.to_string(), "clip.MOV");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_name_keeps_raw_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"IMG_20230615_\xff.jpg");
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(raw);
        fs::write(&path, b"x").expect("Failed to write test file");

        let facts = FileFacts::from_path(&path).expect("Failed to read facts");
        let record = MediumRecord::classify(facts, &criteria_2020(&[("camera", "^IMG_")]));

        assert_eq!(record.file_name(), raw);
        assert_eq!(record.name(), "IMG_20230615_\u{FFFD}.jpg");
        assert!(record.is_eligible());
    }

    #[test]
    fn test_mark_processed_is_one_way() {
        let mut record =
            MediumRecord::classify(facts("IMG_20230615.jpg", 1, may_2019()), &criteria_2020(&[]));
        record.mark_processed();
        record.mark_processed();
        assert!(record.is_processed());
    }

    #[test]
    fn test_facts_from_real_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("IMG_20230615.jpg");
        fs::write(&path, vec![0u8; 50]).expect("Failed to write test file");

        let facts = FileFacts::from_path(&path).expect("Failed to read facts");
        assert_eq!(facts.name, "IMG_20230615.jpg");
        assert_eq!(facts.extension, ".jpg");
        assert_eq!(facts.size_bytes, 50);
        assert!(!facts.is_hidden);
    }

    #[test]
    fn test_dot_file_is_hidden() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(".IMG_20230615.jpg");
        fs::write(&path, b"x").expect("Failed to write test file");

        let facts = FileFacts::from_path(&path).expect("Failed to read facts");
        assert!(facts.is_hidden);
    }
}

//! Name-based duplicate resolution for the result set.
//!
//! Two files are duplicates when their raw file names are identical
//! (case-sensitive, directory ignored). An incoming file replaces the first
//! retained file with its name whose size is less than or equal to its own. When no such
//! file exists the incoming file is simply appended, even if a larger file
//! with the same name is already retained. Contents are never compared.

use crate::medium::MediumRecord;

/// What happened when a record was admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Appended without replacing anything.
    Added,
    /// Appended after removing the given smaller-or-equal record.
    Superseded(MediumRecord),
}

/// Insertion-ordered collection of retained records.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<MediumRecord>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits an eligible record, applying the duplicate rule.
    pub fn admit(&mut self, candidate: MediumRecord) -> Admission {
        let position = self.records.iter().position(|existing| {
            existing.file_name() == candidate.file_name()
                && existing.size_bytes() <= candidate.size_bytes()
        });

        let admission = match position {
            Some(index) => Admission::Superseded(self.records.remove(index)),
            None => Admission::Added,
        };
        self.records.push(candidate);
        admission
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediumRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[MediumRecord] {
        &self.records
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut MediumRecord> {
        self.records.get_mut(index)
    }

    /// Records sharing `name`, in retention order.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MediumRecord> + 'a {
        self.records.iter().filter(move |r| r.name() == name)
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a MediumRecord;
    type IntoIter = std::slice::Iter<'a, MediumRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::tests::{criteria_2020, facts};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn record(dir: &str, name: &str, size: u64) -> MediumRecord {
        let created = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut f = facts(name, size, created);
        f.full_path = PathBuf::from(dir).join(name);
        MediumRecord::classify(f, &criteria_2020(&[]))
    }

    #[test]
    fn test_larger_later_file_supersedes() {
        let mut set = ResultSet::new();
        assert_eq!(set.admit(record("/a", "a.jpg", 100)), Admission::Added);

        let admission = set.admit(record("/b", "a.jpg", 200));
        assert!(matches!(admission, Admission::Superseded(ref old) if old.size_bytes() == 100));

        let named: Vec<_> = set.named("a.jpg").collect();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].size_bytes(), 200);
    }

    #[test]
    fn test_smaller_later_file_is_kept_alongside() {
        // 100 does not evict 200, and is still added as a separate record.
        let mut set = ResultSet::new();
        set.admit(record("/a", "a.jpg", 200));
        assert_eq!(set.admit(record("/b", "a.jpg", 100)), Admission::Added);

        let sizes: Vec<_> = set.named("a.jpg").map(|r| r.size_bytes()).collect();
        assert_eq!(sizes, vec![200, 100]);
    }

    #[test]
    fn test_equal_size_favours_newer() {
        let mut set = ResultSet::new();
        set.admit(record("/a", "a.jpg", 100));
        set.admit(record("/b", "a.jpg", 100));

        let named: Vec<_> = set.named("a.jpg").collect();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].full_path(), PathBuf::from("/b/a.jpg"));
    }

    #[test]
    fn test_only_first_matching_record_is_removed() {
        let mut set = ResultSet::new();
        set.admit(record("/a", "a.jpg", 200));
        set.admit(record("/b", "a.jpg", 100));
        // 300 replaces the first retained record it beats (the 200 one).
        set.admit(record("/c", "a.jpg", 300));

        let sizes: Vec<_> = set.named("a.jpg").map(|r| r.size_bytes()).collect();
        assert_eq!(sizes, vec![100, 300]);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut set = ResultSet::new();
        set.admit(record("/a", "a.jpg", 100));
        assert_eq!(set.admit(record("/a", "A.jpg", 200)), Admission::Added);
        assert_eq!(set.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_names_differing_only_in_invalid_bytes_are_distinct() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let raw_record = |bytes: &[u8], size: u64| {
            let name = OsStr::from_bytes(bytes);
            let created = NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            let mut f = facts(&name.to_string_lossy(), size, created);
            f.full_path = PathBuf::from("/a").join(name);
            MediumRecord::classify(f, &criteria_2020(&[]))
        };

        // Both names display as "IMG_\u{FFFD}.jpg".

        let mut set = ResultSet::new();
        set.admit(raw_record(b"IMG_\xff.jpg", 100));
        assert_eq!(set.admit(raw_record(b"IMG_\xfe.jpg", 200)), Admission::Added);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_replacement_goes_to_the_end() {
        let mut set = ResultSet::new();
        set.admit(record("/a", "a.jpg", 1));
        set.admit(record("/a", "b.jpg", 1));
        set.admit(record("/b", "a.jpg", 2));

        let names: Vec<_> = set.iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["b.jpg", "a.jpg"]);
    }
}

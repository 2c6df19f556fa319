//! Capture-date derivation from media file names.
//!
//! Camera and phone files usually carry their capture date in the name
//! (`IMG_20230615_010101.jpg`, `VID20190101.mp4`). The extractor looks for
//! the first run of digits in the base name and reads the eight characters
//! starting there as a date. When that fails, the file's creation time is
//! used instead and the result is flagged as a fallback.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use mediatidy::date_extractor::DateExtractor;
//!
//! let created = NaiveDate::from_ymd_opt(2019, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let resolved = DateExtractor::resolve("IMG_20230615_010101.jpg", ".jpg", created);
//! assert_eq!(resolved.date.date(), NaiveDate::from_ymd_opt(2023, 6, 15).unwrap());
//! assert!(!resolved.used_fallback);
//! ```

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Number of characters read as a date once the first digit is found.
const DATE_WIDTH: usize = 8;

/// Format the positional year/month/day pieces are reassembled into.
const REASSEMBLED_FORMAT: &str = "%d%m%Y";

/// The outcome of resolving a capture date for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    /// The resolved capture date. Name-derived dates are at midnight.
    pub date: NaiveDateTime,
    /// True when the name yielded no usable date and `date` is the creation time.
    pub used_fallback: bool,
}

/// Derives capture dates from file names.
pub struct DateExtractor;

impl DateExtractor {
    /// Resolves the capture date of a file.
    ///
    /// `name` is the full file name including its extension, `extension` is the
    /// extension with its leading dot (empty when the file has none) and
    /// `creation_time` is the fallback used whenever the name carries no
    /// readable date. Never fails.
    pub fn resolve(name: &str, extension: &str, creation_time: NaiveDateTime) -> ResolvedDate {
        match Self::date_from_name(name, extension) {
            Some(date) => ResolvedDate {
                date: date.and_time(chrono::NaiveTime::MIN),
                used_fallback: false,
            },
            None => ResolvedDate {
                date: creation_time,
                used_fallback: true,
            },
        }
    }

    /// Reads the date embedded in a file name, if any.
    ///
    /// The eight characters starting at the first digit are cut positionally
    /// into year (4), month (2) and day (2), then glued back together as
    /// day-month-year and parsed with a `ddMMyyyy` pattern.
    pub fn date_from_name(name: &str, extension: &str) -> Option<NaiveDate> {
        let base = Self::base_name(name, extension);

        let start = base.find(|c: char| c.is_ascii_digit())?;
        let window: String = base[start..].chars().take(DATE_WIDTH).collect();
        if window.chars().count() < DATE_WIDTH || !window.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        // All ASCII digits from here on, byte slicing is safe.
        let year = &window[0..4];
        let month = &window[4..6];
        let day = &window[6..8];
        let reassembled = format!("{day}{month}{year}");

        // Year zero is outside the calendar range of capture dates.
        NaiveDate::parse_from_str(&reassembled, REASSEMBLED_FORMAT)
            .ok()
            .filter(|date| date.year() >= 1)
    }

    /// Cuts the name at the first occurrence of its extension.
    fn base_name<'a>(name: &'a str, extension: &str) -> &'a str {
        if extension.is_empty() {
            return name;
        }
        match name.find(extension) {
            Some(index) => &name[..index],
            None => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_camera_name_resolves_from_name() {
        let resolved = DateExtractor::resolve("IMG_20230615_010101.jpg", ".jpg", created());

        assert!(!resolved.used_fallback);
        assert_eq!(
            resolved.date,
            NaiveDate::from_ymd_opt(2023, 6, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_digits_at_start_of_name() {
        let date = DateExtractor::date_from_name("20181231.mp4", ".mp4");
        assert_eq!(date, NaiveDate::from_ymd_opt(2018, 12, 31));
    }

    #[test]
    fn test_no_digits_falls_back() {
        let resolved = DateExtractor::resolve("photo.jpg", ".jpg", created());

        assert!(resolved.used_fallback);
        assert_eq!(resolved.date, created());
    }

    #[test]
    fn test_too_few_characters_falls_back() {
        let resolved = DateExtractor::resolve("IMG_2023.jpg", ".jpg", created());
        assert!(resolved.used_fallback);
        assert_eq!(resolved.date, created());
    }

    #[test]
    fn test_extension_does_not_count_towards_width() {
        // "1234" plus ".jpeg" would be eight characters, but the extension is stripped first.
        let resolved = DateExtractor::resolve("a1234.jpeg", ".jpeg", created());
        assert!(resolved.used_fallback);
    }

    #[test]
    fn test_non_digit_inside_window_falls_back() {
        let resolved = DateExtractor::resolve("IMG_2023-06-15.jpg", ".jpg", created());
        assert!(resolved.used_fallback);
    }

    #[test]
    fn test_impossible_month_falls_back() {
        // Month 13 cannot be parsed.
        let resolved = DateExtractor::resolve("IMG_20231315.jpg", ".jpg", created());
        assert!(resolved.used_fallback);
    }

    #[test]
    fn test_year_zero_falls_back() {
        assert_eq!(DateExtractor::date_from_name("IMG_00000101.jpg", ".jpg"), None);

        let resolved = DateExtractor::resolve("IMG_00000101.jpg", ".jpg", created());
        assert!(resolved.used_fallback);
        assert_eq!(resolved.date, created());

        assert_eq!(
            DateExtractor::date_from_name("IMG_00010101.jpg", ".jpg"),
            NaiveDate::from_ymd_opt(1, 1, 1)
        );
    }

    #[test]
    fn test_impossible_day_falls_back() {
        let resolved = DateExtractor::resolve("IMG_20230230.jpg", ".jpg", created());
        assert!(resolved.used_fallback);
    }

    #[test]
    fn test_only_first_digit_run_is_considered() {
        // The first run "1" leaves "1_202306" as the window, which is not all digits.
        let resolved = DateExtractor::resolve("v1_20230615.jpg", ".jpg", created());
        assert!(resolved.used_fallback);
    }

    #[test]
    fn test_name_without_extension() {
        let date = DateExtractor::date_from_name("scan20200229", "");
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 2, 29));
    }

    #[test]
    fn test_base_name_cuts_at_first_extension_occurrence() {
        assert_eq!(DateExtractor::base_name("a.jpg.b.jpg", ".jpg"), "a");
        assert_eq!(DateExtractor::base_name("clip.mov", ".mov"), "clip");
        assert_eq!(DateExtractor::base_name("README", ""), "README");
    }

    #[test]
    fn test_non_ascii_prefix() {
        let date = DateExtractor::date_from_name("été_20210704.heic", ".heic");
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 7, 4));
    }
}

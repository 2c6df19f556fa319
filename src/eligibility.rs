//! Eligibility rules deciding which files get organized.
//!
//! A file qualifies when it is not hidden, its capture date is on or after
//! the cutoff date, and either its name matched one of the configured
//! patterns or no date could be read from the name at all.

use crate::error::ConfigError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::path::Path;

/// A configured regular expression together with its configuration key.
#[derive(Debug, Clone)]
pub struct NamedPattern {
    pub name: String,
    pub regex: Regex,
}

/// Ordered set of compiled name patterns.
///
/// Patterns are tried in configuration order and the first match wins.
/// An empty set never matches.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<NamedPattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `(name, regex)` pairs, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRegex` for the first pattern that fails to compile.
    pub fn compile<I, N, P>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: AsRef<str>,
    {
        let mut set = Self::new();
        for (name, pattern) in entries {
            let name = name.into();
            let pattern = pattern.as_ref();
            let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
                name: name.clone(),
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            set.patterns.push(NamedPattern { name, regex });
        }
        Ok(set)
    }

    /// Name of the first pattern matching `file_name`.
    pub fn first_match(&self, file_name: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(file_name))
            .map(|p| p.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedPattern> {
        self.patterns.iter()
    }
}

/// Configuration the filter is evaluated against.
#[derive(Debug, Clone)]
pub struct Criteria {
    /// Files captured before this date are skipped.
    pub cutoff: NaiveDate,
    pub patterns: PatternSet,
}

impl Criteria {
    pub fn new(cutoff: NaiveDate, patterns: PatternSet) -> Self {
        Self { cutoff, patterns }
    }

    fn cutoff_start(&self) -> NaiveDateTime {
        self.cutoff.and_time(NaiveTime::MIN)
    }
}

/// The fields of a classified file the rules look at.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub full_path: &'a Path,
    pub name: &'a str,
    pub is_hidden: bool,
    pub date_taken: NaiveDateTime,
    pub used_fallback: bool,
}

/// Applies the eligibility rules.
pub struct EligibilityFilter;

impl EligibilityFilter {
    /// Returns true when the candidate should be organized.
    ///
    /// Checks, with early termination:
    /// 1. A path was supplied
    /// 2. Not hidden
    /// 3. Captured on or after the cutoff
    /// 4. Date came from the creation time, or the name matches a pattern
    pub fn is_eligible(candidate: &Candidate<'_>, criteria: &Criteria) -> bool {
        if candidate.full_path.as_os_str().is_empty() {
            return false;
        }

        if candidate.is_hidden {
            return false;
        }

        if candidate.date_taken < criteria.cutoff_start() {
            return false;
        }

        candidate.used_fallback || criteria.patterns.first_match(candidate.name).is_some()
    }
}

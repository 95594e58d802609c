//! Category name normalization
//!
//! Display names keep their case, accents and punctuation. Equality between
//! names goes through [`comparison_key`], which is never stored or shown.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Minimum category name length (chars, after sanitize)
pub const NAME_MIN_CHARS: usize = 2;
/// Maximum category name length (chars, after sanitize)
pub const NAME_MAX_CHARS: usize = 50;

/// Trim and collapse internal whitespace runs to a single space.
pub fn sanitize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased, diacritic-free form of a sanitized name.
pub fn comparison_key(name: &str) -> String {
    sanitize(name)
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// True iff the sanitized name is 2 to 50 characters long.
pub fn is_valid_name(sanitized: &str) -> bool {
    (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&sanitized.chars().count())
}

/// Keep the first sanitized occurrence of each comparison key, in order.
///
/// Entries that sanitize to "" are dropped.
pub fn dedupe<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let clean = sanitize(name.as_ref());
        if clean.is_empty() {
            continue;
        }
        if seen.insert(comparison_key(&clean)) {
            out.push(clean);
        }
    }
    out
}

/// Partition of a category-name batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchValidation {
    /// Sanitized, valid, first occurrence per key
    pub valid: Vec<String>,
    /// Raw inputs that failed sanitize + length validation
    pub invalid: Vec<String>,
    /// Sanitized names whose key was already taken earlier in the batch
    pub duplicates: Vec<String>,
}

impl BatchValidation {
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// Split a batch into valid, invalid and duplicate names.
pub fn validate_and_sanitize_batch<I, S>(names: I) -> BatchValidation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut batch = BatchValidation::default();
    for name in names {
        let raw = name.as_ref();
        let clean = sanitize(raw);
        if !is_valid_name(&clean) {
            batch.invalid.push(raw.to_string());
        } else if seen.insert(comparison_key(&clean)) {
            batch.valid.push(clean);
        } else {
            batch.duplicates.push(clean);
        }
    }
    batch
}

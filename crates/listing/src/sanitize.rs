//! Field sanitization helpers shared by every entity constructor.
//!
//! All functions here are pure and infallible. Malformed input is either
//! passed through ([`sanitize_value`]) or treated as empty.
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::raw::RawValue;

/// Collapses whitespace runs to single spaces and trims both ends.
///
/// ```rust
/// use listing::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  Software \n\t Engineer "), "Software Engineer");
/// assert_eq!(collapse_whitespace("   "), "");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}

/// Strips control characters, then collapses whitespace.
pub(crate) fn clean_text(text: &str) -> String {
    if text.chars().any(|ch| ch.is_control() && !ch.is_whitespace()) {
        let stripped: String = text
            .chars()
            .filter(|ch| !ch.is_control() || ch.is_whitespace())
            .collect();
        collapse_whitespace(&stripped)
    } else {
        collapse_whitespace(text)
    }
}

/// Whitespace-collapses text values; every other value is returned as is.
pub fn sanitize_value(value: &RawValue) -> RawValue {
    match value {
        RawValue::Text(text) => RawValue::Text(collapse_whitespace(text)),
        other => other.clone(),
    }
}

/// Cleans each item, drops empties and removes case-insensitive duplicates.
///
/// The first occurrence wins and keeps its spelling; relative order is kept.
///
/// ```rust
/// use listing::dedupe_preserve_order;
///
/// let skills = dedupe_preserve_order(["Python", " python ", "Go", ""]);
/// assert_eq!(skills, vec!["Python", "Go"]);
/// ```
pub fn dedupe_preserve_order<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: Vec<String> = Vec::new();
    let mut kept = Vec::new();
    for item in items {
        let cleaned = clean_text(item.as_ref());
        if cleaned.is_empty() {
            continue;
        }
        let key = cleaned.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        kept.push(cleaned);
    }
    kept
}

/// Lower-cased, diacritic-free, hyphen-joined slug.
///
/// ```rust
/// use listing::to_slug;
///
/// assert_eq!(to_slug("C++ Developer"), "c-developer");
/// assert_eq!(to_slug("Data Scientist @ AI"), "data-scientist-ai");
/// assert_eq!(to_slug("Développeur Sénior"), "developpeur-senior");
/// ```
pub fn to_slug(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join("-")
}

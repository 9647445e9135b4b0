//! Label cleanup, case-insensitive de-duplication and list splitting

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static CONJUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s(and|or)\s").expect("valid regex"));

const CLAUSE_PUNCTUATION: [char; 6] = [',', ';', ':', '(', ')', '.'];

/// Collapse every run of whitespace to one space and trim the ends
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Clean one label for display.
///
/// Citation markers like `[3]` are removed, whitespace is collapsed and
/// leading punctuation stripped. A label longer than `max_len` characters is
/// cut at its first sentence boundary; if it is still too long, or blank,
/// `None` is returned.
pub fn clean_label(raw: &str, max_len: usize) -> Option<String> {
    let without_refs = BRACKETED.replace_all(raw, " ");
    let collapsed = collapse_whitespace(&without_refs);
    let label = collapsed
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end();

    if label.is_empty() {
        return None;
    }
    if label.chars().count() <= max_len {
        return Some(label.to_string());
    }

    let first_sentence = label
        .split_once(". ")
        .map(|(head, _)| head)
        .unwrap_or(label)
        .trim_end_matches('.')
        .trim();
    if !first_sentence.is_empty() && first_sentence.chars().count() <= max_len {
        Some(first_sentence.to_string())
    } else {
        None
    }
}

/// Case-insensitive de-duplication keeping the first-seen spelling and order.
/// Blank entries are dropped.
pub fn dedupe<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let value: String = value.into();
        if value.trim().is_empty() {
            continue;
        }
        if seen.insert(value.to_lowercase()) {
            out.push(value);
        }
    }
    out
}

/// Concatenate lists in priority order, then [`dedupe`]
pub fn merge_unique<I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    dedupe(lists.into_iter().flatten())
}

/// Whether a label reads as a single short concept.
///
/// Rejects conjunction phrases and anything carrying clause punctuation,
/// which in practice means scraped sentences rather than names.
pub fn is_ui_friendly(label: &str) -> bool {
    !CONJUNCTION.is_match(label) && !label.contains(CLAUSE_PUNCTUATION)
}

/// Split literals that pack several values (`"cough, wheeze; fever"`)
pub fn split_packed<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flat_map(|v| {
            v.as_ref()
                .split([',', ';'])
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

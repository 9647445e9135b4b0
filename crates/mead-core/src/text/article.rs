//! Section, list and paragraph extraction from wiki article HTML

use super::html::{clean_fragment, strip_noise, to_plain_text};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Default character budget for extracted prose
pub const DEFAULT_CHAR_BUDGET: usize = 2000;

/// Cap for items taken from `<li>` elements
pub const LIST_ITEM_CAP: usize = 140;
/// Cap for items split out of "... include a, b and c" sentences
pub const INLINE_ITEM_CAP: usize = 90;

const MIN_SECTION_TEXT: usize = 20;
const MIN_PARAGRAPH_TEXT: usize = 40;

static HEADING_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<h[23][\s>]").expect("valid regex"));
static HEADING_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</h[23]\s*>").expect("valid regex"));
static BLOCK_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:p|ul|ol|dl|div)[\s>]").expect("valid regex"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<li[^>]*>(.*?)</li>").expect("valid regex"));
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p>").expect("valid regex"));
static TRAILING_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[.;:,]+$").expect("valid regex"));
static LEADING_AND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*and\s+").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static HEADING_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h[1-6][^>]*>.*?</h[1-6]\s*>").expect("valid regex"));

const PLACEHOLDERS: [&str; 3] = [
    "there is currently no text in this page",
    "may refer to",
    "may also refer to",
];

const BOILERPLATE: [&str; 10] = [
    "mw-parser-output",
    "citation",
    "cs1-",
    "pmid",
    "doi",
    "isbn",
    "wikimedia",
    "http://",
    "https://",
    "accessed",
];

/// Whether text is an empty-page or disambiguation stub
pub fn is_placeholder(text: &str) -> bool {
    let lower = text.to_lowercase();
    PLACEHOLDERS.iter().any(|p| lower.contains(p))
}

/// Cut prose to `budget` characters.
///
/// Prefers ending after the last `". "` before the budget when that point
/// lies past half the budget; otherwise hard-cuts and appends `...`.
pub fn truncate(text: &str, budget: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= budget {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];

    if let Some(dot) = head.rfind(". ")
        && head[..dot].chars().count() > budget / 2
    {
        return head[..=dot].trim().to_string();
    }
    format!("{}...", head.trim_end())
}

/// Everything before the first `<h2`/`<h3` heading
fn introduction(html: &str) -> &str {
    match HEADING_OPEN.find(html) {
        Some(m) => &html[..m.start()],
        None => html,
    }
}

/// Byte offset of the first heading-lookup strategy that matches.
///
/// Strategies, in order: `<h2…>Name`, `<h3…>Name`, `id="Name_With_Underscores"`,
/// `>Name</span>`, `>Name</a>`. Matching is ASCII case-insensitive so
/// offsets stay valid in `html`.
fn heading_start(html: &str, heading: &str) -> Option<usize> {
    let haystack = html.to_ascii_lowercase();
    let name = heading.trim().to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }
    let anchor = name.replace(' ', "_");

    heading_tag_start(&haystack, "<h2", &name)
        .or_else(|| heading_tag_start(&haystack, "<h3", &name))
        .or_else(|| haystack.find(&format!("id=\"{}\"", anchor)))
        .or_else(|| haystack.find(&format!(">{}</span>", name)))
        .or_else(|| haystack.find(&format!(">{}</a>", name)))
}

/// First `open` tag whose content starts with `name`
fn heading_tag_start(haystack: &str, open: &str, name: &str) -> Option<usize> {
    haystack.match_indices(open).find_map(|(start, _)| {
        let content = start + haystack[start..].find('>')? + 1;
        haystack[content..].starts_with(name).then_some(start)
    })
}

/// Raw HTML body of the first matching heading, in strategy order
fn section_body<'a>(html: &'a str, heading: &str) -> Option<&'a str> {
    let start = heading_start(html, heading)?;

    let after_tag = start + html[start..].find('>')? + 1;
    let mut rest = &html[after_tag..];

    // Skip the remainder of the heading element itself so the body starts
    // with the section's content rather than its title.
    if let Some(close) = HEADING_CLOSE.find(rest) {
        let next_block = BLOCK_OPEN.find(rest).map(|m| m.start()).unwrap_or(rest.len());
        let next_heading = HEADING_OPEN.find(rest).map(|m| m.start()).unwrap_or(rest.len());
        if close.start() < next_block && close.start() < next_heading {
            rest = &rest[close.end()..];
        }
    }

    let end = HEADING_OPEN.find(rest).map(|m| m.start()).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Extract prose for a section.
///
/// An empty `synonyms` list selects the introduction. Otherwise each synonym
/// is tried in order; a body with 20 characters of text or fewer counts as
/// a miss. Placeholder pages yield `None`.
pub fn extract_section(html: &str, synonyms: &[&str], budget: usize) -> Option<String> {
    let cleaned = strip_noise(html);

    let found = if synonyms.is_empty() {
        Some(to_plain_text(introduction(&cleaned)))
    } else {
        synonyms.iter().find_map(|heading| {
            let text = to_plain_text(section_body(&cleaned, heading)?);
            (text.chars().count() > MIN_SECTION_TEXT).then_some(text)
        })
    };
    let text = found?;

    if text.is_empty() || is_placeholder(&text) {
        return None;
    }
    Some(truncate(&text, budget))
}

/// Extract a list of short items for a section.
///
/// Takes the `<li>` items of the first synonym's section that yields any;
/// when a section has no list, falls back to "... include a, b and c"
/// sentences in its paragraphs.
pub fn extract_list(html: &str, synonyms: &[&str]) -> Vec<String> {
    let cleaned = strip_noise(html);
    for heading in synonyms {
        let Some(body) = section_body(&cleaned, heading) else {
            continue;
        };
        let items = section_items(body);
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}

/// Prose of a fragment that already holds a single section, as returned by
/// `action=parse&section=N`. The section's own heading is left out.
pub fn fragment_text(fragment: &str, budget: usize) -> Option<String> {
    let cleaned = strip_noise(fragment);
    let body = HEADING_ELEMENT.replace_all(&cleaned, "");
    let text = to_plain_text(&body);
    if text.chars().count() <= MIN_SECTION_TEXT || is_placeholder(&text) {
        return None;
    }
    Some(truncate(&text, budget))
}

/// List items of a single-section fragment, with the same inline fallback
/// as [`extract_list`]
pub fn fragment_items(fragment: &str) -> Vec<String> {
    section_items(&strip_noise(fragment))
}

fn section_items(body: &str) -> Vec<String> {
    let items = list_items(body);
    if items.is_empty() {
        inline_items(body)
    } else {
        items
    }
}

/// Cleaned `<p>` paragraphs longer than 40 characters, placeholders dropped
pub fn extract_paragraphs(html: &str) -> Vec<String> {
    let cleaned = strip_noise(html);
    PARAGRAPH
        .captures_iter(&cleaned)
        .map(|caps| clean_fragment(&caps[1]))
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_TEXT && !is_placeholder(p))
        .collect()
}

fn list_items(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    LIST_ITEM
        .captures_iter(body)
        .filter_map(|caps| normalize_item(&clean_fragment(&caps[1]), LIST_ITEM_CAP))
        .filter(|item| item.chars().count() > 3 && !is_placeholder(item))
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

fn inline_items(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for caps in PARAGRAPH.captures_iter(body) {
        let paragraph = clean_fragment(&caps[1]);
        let Some(tail) = after_include(&paragraph) else {
            continue;
        };
        let tail = tail
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .trim_end_matches('.');
        for token in tail.split([',', ';']) {
            let token = LEADING_AND.replace(token, "");
            if let Some(item) = normalize_item(&token, INLINE_ITEM_CAP)
                && item.chars().count() > 2
                && seen.insert(item.to_lowercase())
            {
                items.push(item);
            }
        }
    }
    items
}

/// Text following the first `include`, `includes` or `including`
fn after_include(text: &str) -> Option<&str> {
    let lower = text.to_ascii_lowercase();
    let idx = lower.find("include")?;
    let word = ["including", "includes", "include"]
        .into_iter()
        .find(|w| lower[idx..].starts_with(w))?;
    text.get(idx + word.len()..)
}

/// Normalize one candidate list item, `None` when it is not usable.
///
/// Rejects items with digits or citation boilerplate, shortens long items
/// at a colon, sentence break or semicolon and strips trailing punctuation.
pub fn normalize_item(text: &str, cap: usize) -> Option<String> {
    let trimmed = text.trim_start_matches(|c: char| !c.is_alphanumeric()).trim();
    if trimmed.is_empty()
        || trimmed.chars().any(|c| c.is_ascii_digit())
        || is_boilerplate(trimmed)
    {
        return None;
    }

    let shortened = shorten_item(trimmed);
    let candidate = TRAILING_PUNCT.replace(shortened, "");
    let candidate = WHITESPACE.replace_all(&candidate, " ").trim().to_string();

    if candidate.is_empty() || candidate.chars().count() > cap {
        return None;
    }
    Some(candidate)
}

fn is_boilerplate(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.starts_with('\u{2191}') || BOILERPLATE.iter().any(|b| lower.contains(b))
}

fn shorten_item(text: &str) -> &str {
    let mut candidate = text;
    if candidate.chars().count() > 80
        && let Some((head, _)) = candidate.split_once(':')
    {
        candidate = head;
    }
    if candidate.chars().count() > 120 {
        candidate = match candidate.find(". ") {
            Some(i) => &candidate[..i],
            None => candidate,
        };
    }
    if candidate.chars().count() > 120
        && let Some((head, _)) = candidate.split_once(';')
    {
        candidate = head;
    }
    candidate.trim()
}

/// Build a wiki page title from a display name or id.
///
/// Underscores and hyphens become spaces, all-lowercase input is
/// title-cased, then spaces become underscores. `None` for blank input.
pub fn page_title(value: &str) -> Option<String> {
    let spaced = value.trim().replace(['_', '-'], " ");
    if spaced.trim().is_empty() {
        return None;
    }
    let titled = if spaced.chars().any(char::is_uppercase) {
        spaced
    } else {
        spaced
            .split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    };
    Some(titled.replace(' ', "_"))
}

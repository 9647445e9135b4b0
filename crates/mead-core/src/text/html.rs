//! HTML to text passes for MediaWiki article markup
//!
//! Each pass is a precompiled regex applied in a fixed order. The markup is
//! machine-generated by MediaWiki, which keeps regexes adequate here.

use regex::{Captures, Regex};
use std::sync::LazyLock;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

/// Noise blocks removed before the table of contents, in this order
static NOISE_BEFORE_TOC: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r"(?is)<style[^>]*>.*?</style>"),
        re(r"(?is)<script[^>]*>.*?</script>"),
        re(r"(?is)<table[^>]*>.*?</table>"),
        re(r#"(?is)<ol[^>]*class="[^"]*references[^"]*"[^>]*>.*?</ol>"#),
        re(r#"(?is)<div[^>]*class="[^"]*reflist[^"]*"[^>]*>.*?</div>"#),
        re(r#"(?is)<sup[^>]*class="[^"]*reference[^"]*"[^>]*>.*?</sup>"#),
    ]
});

/// Noise blocks removed after the table of contents, in this order
static NOISE_AFTER_TOC: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r#"(?is)<span[^>]*class="[^"]*mw-editsection[^"]*"[^>]*>.*?</span>"#),
        re(r"(?s)<!--.*?-->"),
    ]
});

static DIV_TAG: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<(/)?div\b([^>]*)>"));
static TOC_ID: LazyLock<Regex> = LazyLock::new(|| re(r#"(?i)\bid\s*=\s*"toc""#));
static CLASS_ATTR: LazyLock<Regex> = LazyLock::new(|| re(r#"(?i)\bclass\s*=\s*"([^"]*)""#));

static BREAK: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<br\s*/?>"));
static PARAGRAPH_END: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)</p\s*>"));
static LIST_ITEM_END: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)</li\s*>"));
static TAG: LazyLock<Regex> = LazyLock::new(|| re(r"<[^>]+>"));
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| re(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);"));
static ARTIFACT: LazyLock<Regex> = LazyLock::new(|| {
    re(r"\[(?:edit(?: \| edit source| source)?|citation needed|clarification needed|dubious[^\]]*|note \d+|\d+)\]")
});
static FURTHER_INFO: LazyLock<Regex> = LazyLock::new(|| re(r"Further information:[^\n]*"));
static HORIZONTAL_SPACE: LazyLock<Regex> = LazyLock::new(|| re(r"[ \t]+"));
static SPACE_AROUND_NEWLINE: LazyLock<Regex> = LazyLock::new(|| re(r" ?\n ?"));
static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| re(r"\n{3,}"));
static ANY_BRACKETED: LazyLock<Regex> = LazyLock::new(|| re(r"\[[^\]]*\]"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| re(r"\s+"));

/// Remove styles, scripts, tables, reference lists, reference markers,
/// table-of-contents blocks, edit links and comments
pub fn strip_noise(html: &str) -> String {
    let html = remove_all(&NOISE_BEFORE_TOC, html.to_string());
    let html = strip_toc(&html);
    remove_all(&NOISE_AFTER_TOC, html)
}

fn remove_all(patterns: &[Regex], html: String) -> String {
    patterns
        .iter()
        .fold(html, |acc, pattern| pattern.replace_all(&acc, "").into_owned())
}

/// Whether a `<div>`'s attributes mark it as a table of contents
fn is_toc_div(attrs: &str) -> bool {
    TOC_ID.is_match(attrs)
        || CLASS_ATTR.captures(attrs).is_some_and(|caps| {
            caps[1]
                .split_whitespace()
                .any(|token| token.eq_ignore_ascii_case("toc") || token.eq_ignore_ascii_case("toctitle"))
        })
}

/// Remove table-of-contents `<div>`s together with everything nested in them.
///
/// The block ends at the `</div>` that balances its opening tag. An
/// unbalanced block is left in place.
fn strip_toc(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    // (start of the open TOC block, nesting depth)
    let mut open: Option<(usize, usize)> = None;

    for caps in DIV_TAG.captures_iter(html) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        let closing = caps.get(1).is_some();

        open = match open {
            None if !closing && is_toc_div(caps.get(2).map_or("", |m| m.as_str())) => {
                out.push_str(&html[copied..tag.start()]);
                Some((tag.start(), 1))
            }
            None => None,
            Some((start, depth)) if closing => {
                if depth == 1 {
                    copied = tag.end();
                    None
                } else {
                    Some((start, depth - 1))
                }
            }
            Some((start, depth)) => Some((start, depth + 1)),
        };
    }

    match open {
        Some((start, _)) => out.push_str(&html[start..]),
        None => out.push_str(&html[copied..]),
    }
    out
}

/// Convert an HTML fragment to readable plain text.
///
/// Block ends become newlines, tags are dropped, entities decoded and wiki
/// artifacts (`[edit]`, `[12]`, `[citation needed]`, ...) removed. At most
/// one blank line survives between paragraphs.
pub fn to_plain_text(fragment: &str) -> String {
    let text = BREAK.replace_all(fragment, "\n");
    let text = PARAGRAPH_END.replace_all(&text, "\n\n");
    let text = LIST_ITEM_END.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = ARTIFACT.replace_all(&text, "");
    let text = FURTHER_INFO.replace_all(&text, "");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = SPACE_AROUND_NEWLINE.replace_all(&text, "\n");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Flatten a short fragment (a list item or paragraph) to one line.
///
/// Unlike [`to_plain_text`], every bracketed fragment is dropped along with
/// dagger marks and replacement characters.
pub fn clean_fragment(fragment: &str) -> String {
    let text = TAG.replace_all(fragment, " ");
    let text = decode_entities(&text);
    let text = ANY_BRACKETED.replace_all(&text, "");
    let text: String = text
        .chars()
        .filter(|c| !matches!(c, '\u{2020}' | '\u{2021}' | '\u{FFFD}'))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect();
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Decode named, decimal and hexadecimal character references.
/// Unknown names and invalid code points are left untouched.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(num) = body.strip_prefix('#') {
                let code = match num.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => num.parse::<u32>().ok(),
                };
                code.and_then(char::from_u32).map(String::from)
            } else {
                named_entity(body).map(String::from)
            };
            decoded.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => " ",
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" | "rsquo" => "'",
        "ldquo" | "rdquo" => "\"",
        "hellip" => "...",
        "bull" => "\u{2022}",
        "copy" => "\u{00A9}",
        "reg" => "\u{00AE}",
        "trade" => "\u{2122}",
        "deg" => "\u{00B0}",
        "plusmn" => "\u{00B1}",
        "times" => "\u{00D7}",
        "divide" => "\u{00F7}",
        "frac12" => "\u{00BD}",
        "frac14" => "\u{00BC}",
        "frac34" => "\u{00BE}",
        _ => return None,
    })
}

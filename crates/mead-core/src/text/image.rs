//! Image URL canonicalization
//!
//! Wikimedia Commons files are reachable under several URL shapes
//! (`Special:FilePath/<f>`, `/wiki/File:<f>`, bare Wikidata P18 filenames).
//! All of them collapse to one `Special:FilePath` form so the same image
//! coming from two sources de-duplicates.

use super::normalize::dedupe;

const COMMONS_HOST: &str = "commons.wikimedia.org";
const COMMONS_FILE_PATH: &str = "https://commons.wikimedia.org/wiki/Special:FilePath/";

/// Canonicalize one image reference, `None` for blank input
pub fn normalize_one(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let without_query = trimmed.split('?').next().unwrap_or(trimmed);

    if !without_query.contains("://") {
        let file = strip_prefix_ci(without_query, "File:").unwrap_or(without_query);
        return commons_url(file);
    }

    let url = force_https(without_query);
    if url.contains(COMMONS_HOST) {
        let file = if url.contains("Special:FilePath/") {
            url.rsplit('/').next()
        } else if url.contains("/wiki/File:") {
            url.rsplit(':').next()
        } else {
            None
        };
        if let Some(file) = file
            && let Some(canonical) = commons_url(file)
        {
            return Some(canonical);
        }
    }

    Some(url)
}

/// Canonicalize a list: blanks dropped, case-insensitive de-dupe, input order kept
pub fn normalize<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dedupe(urls.into_iter().filter_map(|u| normalize_one(u.as_ref())))
}

fn commons_url(file: &str) -> Option<String> {
    let decoded = urlencoding::decode(file)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| file.to_string());
    let clean = decoded.trim().replace(' ', "_");
    if clean.is_empty() {
        return None;
    }
    Some(format!("{}{}", COMMONS_FILE_PATH, urlencoding::encode(&clean)))
}

fn force_https(url: &str) -> String {
    match strip_prefix_ci(url, "http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

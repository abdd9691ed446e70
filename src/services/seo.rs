//! Slug and SEO derivation
//!
//! Derives the fields the editors never type by hand: URL slugs (with
//! Turkish transliteration, since most titles are Turkish), meta
//! descriptions, excerpts, and estimated reading time.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum slug length in characters
const MAX_SLUG_LEN: usize = 100;

/// Maximum meta description length in characters
const MAX_META_DESCRIPTION_LEN: usize = 160;

/// Maximum excerpt length in characters
const MAX_EXCERPT_LEN: usize = 200;

/// Words per minute assumed for reading time estimates
const WORDS_PER_MINUTE: usize = 200;

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Transliterate a single Turkish character to its ASCII counterpart
fn transliterate(c: char) -> Option<char> {
    match c {
        'ç' | 'Ç' => Some('c'),
        'ğ' | 'Ğ' => Some('g'),
        'ı' | 'İ' => Some('i'),
        'ö' | 'Ö' => Some('o'),
        'ş' | 'Ş' => Some('s'),
        'ü' | 'Ü' => Some('u'),
        _ => None,
    }
}

/// Create a URL-friendly slug from a title.
///
/// Turkish characters are transliterated, everything else is lowercased,
/// and any run of non-alphanumeric characters collapses to a single
/// hyphen. The result contains only `[a-z0-9-]`, never starts or ends
/// with a hyphen, and never contains consecutive hyphens.
pub fn create_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen

    for c in title.chars() {
        let mapped = transliterate(c);
        let candidates: Vec<char> = match mapped {
            Some(ascii) => vec![ascii],
            None => c.to_lowercase().collect(),
        };

        for lc in candidates {
            if lc.is_ascii_alphanumeric() {
                slug.push(lc);
                last_was_hyphen = false;
            } else if !last_was_hyphen {
                slug.push('-');
                last_was_hyphen = true;
            }
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
    }
    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Strip HTML tags and collapse whitespace, producing plain text
pub fn strip_html(html: &str) -> String {
    let no_tags = HTML_TAG_RE.replace_all(html, " ");
    let decoded = no_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#8217;", "'");
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Truncate text to at most `max_chars` characters, cutting at a word
/// boundary and appending an ellipsis when anything was removed.
fn truncate_text(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let cut: String = chars[..max_chars.saturating_sub(3)].iter().collect();
    let trimmed = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end())
}

/// Derive an SEO meta description from HTML content (at most 160 chars)
pub fn meta_description(content: &str) -> String {
    truncate_text(&strip_html(content), MAX_META_DESCRIPTION_LEN)
}

/// Derive a list-view excerpt from HTML content (at most 200 chars)
pub fn excerpt(content: &str) -> String {
    truncate_text(&strip_html(content), MAX_EXCERPT_LEN)
}

/// Estimate reading time in minutes at 200 words per minute.
///
/// Always at least 1, even for empty content.
pub fn reading_time(content: &str) -> i32 {
    let words = strip_html(content).split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE);
    minutes.max(1) as i32
}

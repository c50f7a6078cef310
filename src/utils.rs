//! Utility functions for text handling

use regex::Regex;
use std::sync::LazyLock;

/// Runs of characters that may not appear in a slug
static NON_SLUG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").ok());

/// Generate a URL-friendly slug from a title
///
/// The title is lowercased, every run of characters outside `[a-z0-9]` becomes
/// a single `-`, and leading/trailing dashes are trimmed. Titles without any
/// ASCII alphanumerics produce an empty slug; callers pick a fallback.
///
/// # Examples
///
/// ```
/// use blog_pipeline::utils::slugify;
///
/// assert_eq!(slugify("10 Tips for Better Sleep!"), "10-tips-for-better-sleep");
/// assert_eq!(slugify("  --Already--Dashed--  "), "already-dashed");
/// ```
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    match NON_SLUG.as_ref() {
        Some(re) => re.replace_all(&lower, "-").trim_matches('-').to_string(),
        None => lower
            .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-"),
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones
///
/// Order is preserved.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// The primary keyword is the first keyword, or empty when there are none
pub fn primary_keyword(keywords: &[String]) -> String {
    keywords.first().cloned().unwrap_or_default()
}

/// Truncate text for inclusion in logs and error messages
///
/// Cuts on a character boundary and marks the cut with `…`.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

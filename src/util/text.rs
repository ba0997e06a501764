// src/util/text.rs
use regex::Regex;
use std::sync::OnceLock;

use crate::constants::MAX_NAME_LEN;
use crate::domain::DomainError;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

fn like_meta_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\\%_]").expect("valid LIKE pattern"))
}

/// Normalize a free-text search term.
///
/// Collapses runs of whitespace and trims. Returns `None` for blank input so
/// callers can treat it as "no search".
///
/// # Examples
///
/// ```
/// use conveyor_filters::util::text::normalize_search;
///
/// assert_eq!(normalize_search("  iron   ore "), Some("iron ore".to_string()));
/// assert_eq!(normalize_search(" \t "), None);
/// ```
pub fn normalize_search(raw: &str) -> Option<String> {
    let collapsed = whitespace_re().replace_all(raw.trim(), " ").into_owned();
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Escape `\`, `%` and `_` so the term matches literally in a
/// `LIKE ... ESCAPE '\'` clause.
pub fn escape_like(term: &str) -> String {
    like_meta_re().replace_all(term, r"\$0").into_owned()
}

/// Trim a user-supplied name and check it is non-empty and not overly long.
pub fn validate_name(kind: &str, raw: &str) -> Result<String, DomainError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::Validation(format!("{kind} name is empty")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "{kind} name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// First line of a free-text field, for one-line listings.
pub fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

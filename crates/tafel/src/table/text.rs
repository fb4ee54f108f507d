use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\s\xa0\u{2000}-\u{200b}\u{2028}\u{2029}\u{3000}]+")
        .expect("Whitespace run regex pattern is valid and should compile")
});

/// Collapse whitespace runs (tabs, newlines, NBSP, unicode spaces) into one
/// ASCII space and trim both ends. Borrows when nothing changes.
pub fn normalize_fragment_text(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\u{200b}');

    if WHITESPACE_RUN.find_iter(trimmed).any(|m| m.as_str() != " ") {
        Cow::Owned(WHITESPACE_RUN.replace_all(trimmed, " ").into_owned())
    } else {
        Cow::Borrowed(trimmed)
    }
}

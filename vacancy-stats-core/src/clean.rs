//! Field cleanup applied to raw CSV values before they become a [`Vacancy`](crate::vacancy::Vacancy).

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("Invalid tag regex"));

/// Strips HTML tags and collapses whitespace in a single line.
pub fn clean_line(line: &str) -> String {
    let without_tags = TAG_REGEX.replace_all(line, "");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleans every line of a possibly multi-line value, keeping the line breaks.
pub fn clean_value(value: &str) -> String {
    value.split('\n').map(clean_line).collect::<Vec<_>>().join("\n")
}

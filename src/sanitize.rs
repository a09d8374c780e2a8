//! Cleaning of imported cell values before they reach the store

use once_cell::sync::Lazy;
use regex::Regex;

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([A-Fa-f0-9]{3}){1,2}$").expect("valid color regex"));

/// Single-line text: markup removed, whitespace runs collapsed, trimmed.
pub fn text_field(value: &str) -> String {
    let stripped = TAGS.replace_all(value, "");
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

/// Multi-line text: markup removed and trimmed, line breaks kept.
pub fn textarea_field(value: &str) -> String {
    let stripped = TAGS.replace_all(value, "");
    stripped
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// URL-safe slug: lowercase alphanumerics, `_` and single dashes.
pub fn slug(value: &str) -> String {
    let stripped = TAGS.replace_all(value, "");
    let mut out = String::with_capacity(stripped.len());
    let mut pending_dash = false;

    for ch in stripped.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() || ch == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }

    out
}

/// `#rgb` or `#rrggbb`; anything else is dropped.
pub fn hex_color(value: &str) -> Option<String> {
    let value = value.trim();
    HEX_COLOR.is_match(value).then(|| value.to_string())
}

//! Script detection and Malayalam text wrapping
//!
//! Malayalam and Latin text do not share a glyph set, so every fragment
//! holding Malayalam characters is wrapped in a `malayalam-text` span that the
//! stylesheet renders with Noto Sans Malayalam and a taller line-height.
//!
//! All functions here take raw user text and return HTML: the input is
//! trimmed and escaped before any markup is added.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// CSS class applied to Malayalam fragments
pub const MALAYALAM_CLASS: &str = "malayalam-text";

/// Runs of Malayalam characters and whitespace, as used by the mixed formatter
static MALAYALAM_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{0D00}-\u{0D7F}\s]+").unwrap());

static LATIN_OR_DIGIT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z0-9]").unwrap());

/// True for characters in the Malayalam block (U+0D00..=U+0D7F)
pub fn is_malayalam_char(c: char) -> bool {
    ('\u{0D00}'..='\u{0D7F}').contains(&c)
}

/// True when `text` contains at least one Malayalam character
pub fn contains_malayalam(text: &str) -> bool {
    text.chars().any(is_malayalam_char)
}

/// Trim and HTML-escape raw text
pub fn escape(text: &str) -> String {
    html_escape::encode_text(text.trim()).into_owned()
}

fn span(inner: &str) -> String {
    format!("<span class=\"{MALAYALAM_CLASS}\">{inner}</span>")
}

/// Wrap text unconditionally as Malayalam
///
/// Used for values rendered in the Malayalam slot, including English
/// fallbacks shown in Malayalam-only mode. Empty text stays empty.
pub fn wrap_malayalam(text: &str) -> String {
    let escaped = escape(text);
    if escaped.is_empty() {
        return escaped;
    }
    span(&escaped)
}

/// Wrap text only when it contains Malayalam
pub fn smart_format(text: &str) -> String {
    let escaped = escape(text);
    if contains_malayalam(&escaped) {
        span(&escaped)
    } else {
        escaped
    }
}

/// Wrap each Malayalam run separately when the text mixes scripts
///
/// Intended for house numbers such as `12 കിഴക്ക്` where a numeral is
/// followed by a Malayalam qualifier. A purely Malayalam value is wrapped
/// whole, and text without Malayalam is returned escaped.
pub fn smart_format_mixed(text: &str) -> String {
    let escaped = escape(text);
    if !contains_malayalam(&escaped) {
        return escaped;
    }

    if !LATIN_OR_DIGIT_REGEX.is_match(&escaped) {
        return span(&escaped);
    }

    MALAYALAM_RUN_REGEX
        .replace_all(&escaped, |caps: &Captures| {
            let run = &caps[0];
            if contains_malayalam(run) {
                span(run)
            } else {
                run.to_string()
            }
        })
        .into_owned()
}

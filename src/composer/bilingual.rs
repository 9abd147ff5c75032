//! Bilingual field selection
//!
//! Every bilingual field (name, relationship, occupation, address) follows
//! the same policy:
//!
//! | Mode      | Output                                                        |
//! |-----------|---------------------------------------------------------------|
//! | English   | English value only                                            |
//! | Malayalam | Malayalam value, or the English value when Malayalam is blank |
//! | Both      | English value, plus Malayalam on a new line when present and different |

use crate::models::Language;

use super::script::{smart_format, wrap_malayalam};

/// Returns the Malayalam value when it should be shown next to `en` in
/// combined mode
fn distinct_malayalam<'a>(en: &str, ml: &'a str) -> Option<&'a str> {
    let ml = ml.trim();
    if ml.is_empty() || ml == en.trim() {
        None
    } else {
        Some(ml)
    }
}

fn malayalam_or_fallback<'a>(en: &'a str, ml: &'a str) -> &'a str {
    if ml.trim().is_empty() {
        en
    } else {
        ml
    }
}

/// Render a table cell value
pub fn cell(language: Language, en: &str, ml: &str) -> String {
    match language {
        Language::English => smart_format(en),
        Language::Malayalam => wrap_malayalam(malayalam_or_fallback(en, ml)),
        Language::Both => {
            let mut content = smart_format(en);
            if let Some(ml) = distinct_malayalam(en, ml) {
                content.push_str("<br>");
                content.push_str(&wrap_malayalam(ml));
            }
            content
        }
    }
}

/// Render the address block of a household card
pub fn address(language: Language, en: &str, ml: &str) -> String {
    let english = || format!("<div class=\"address\">{}</div>", smart_format(en));
    let malayalam = |text: &str| {
        format!(
            "<div class=\"address-malayalam\">{}</div>",
            wrap_malayalam(text)
        )
    };

    match language {
        Language::English => english(),
        Language::Malayalam => malayalam(malayalam_or_fallback(en, ml)),
        Language::Both => {
            let mut content = english();
            if let Some(ml) = distinct_malayalam(en, ml) {
                content.push_str(&malayalam(ml));
            }
            content
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPAN: &str = "<span class=\"malayalam-text\">";

    #[test]
    fn test_english_ignores_malayalam() {
        assert_eq!(cell(Language::English, "Joseph", "ജോസഫ്"), "Joseph");
    }

    #[test]
    fn test_malayalam_fallback_to_english() {
        assert_eq!(
            cell(Language::Malayalam, "Joseph", ""),
            format!("{SPAN}Joseph</span>")
        );
        assert_eq!(
            cell(Language::Malayalam, "Joseph", "ജോസഫ്"),
            format!("{SPAN}ജോസഫ്</span>")
        );
    }

    #[test]
    fn test_both_appends_distinct_malayalam() {
        assert_eq!(
            cell(Language::Both, "Joseph", "ജോസഫ്"),
            format!("Joseph<br>{SPAN}ജോസഫ്</span>")
        );
    }

    #[test]
    fn test_both_skips_identical_or_empty() {
        assert_eq!(cell(Language::Both, "Joseph", "Joseph"), "Joseph");
        assert_eq!(cell(Language::Both, "Joseph", " "), "Joseph");
    }

    #[test]
    fn test_address_dedup_in_both() {
        let rendered = address(Language::Both, "Church Road", "Church Road");
        assert_eq!(rendered, "<div class=\"address\">Church Road</div>");
    }

    #[test]
    fn test_address_both_two_lines() {
        let rendered = address(Language::Both, "Church Road", "പള്ളി റോഡ്");
        assert!(rendered.starts_with("<div class=\"address\">Church Road</div>"));
        assert!(rendered.contains("<div class=\"address-malayalam\">"));
    }
}

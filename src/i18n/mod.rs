//! Internationalization (i18n) support
//!
//! Labels used in the composed directory document and user-facing error
//! descriptions live in `locales/en.yml` and `locales/ml.yml`.
//!
//! # Environment Variables
//!
//! - `KUDUMBAM_LANG`: preferred language for messages (en, ml). Defaults to English.
//!
//! # Usage
//!
//! ```rust,ignore
//! use kudumbam::i18n::{t, set_locale};
//!
//! set_locale("ml");
//! let msg = t!("errors.render.failed");
//!
//! // Composer labels always name their locale explicitly
//! let title = t!("directory.title", locale = "ml");
//! ```

// Note: rust_i18n::i18n! macro is declared in lib.rs (crate root)

/// Locales shipped with the crate
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "ml"];

/// Set the current locale for translations
///
/// # Arguments
///
/// * `locale` - Language code (en, ml) or a common alias
pub fn set_locale(locale: &str) {
    let normalized = normalize_locale(locale);
    rust_i18n::set_locale(normalized);
}

/// Get the current locale
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// Initialize i18n from environment variables
///
/// Reads `KUDUMBAM_LANG`. Falls back to English if not set or unknown.
pub fn init_from_env() {
    let locale = std::env::var("KUDUMBAM_LANG").unwrap_or_else(|_| "en".to_string());
    set_locale(&locale);
}

/// Normalize locale code to supported format
///
/// - ml-IN, ml_IN, malayalam, മലയാളം -> ml
/// - anything else -> en
pub fn normalize_locale(locale: &str) -> &'static str {
    let lower = locale.trim().to_lowercase();

    if lower.starts_with("ml") || lower == "malayalam" || lower == "മലയാളം" {
        "ml"
    } else {
        "en"
    }
}

/// Translate a key with optional parameters
///
/// Re-export of `rust_i18n::t!`.
#[doc(inline)]
pub use rust_i18n::t;

//! Unified error handling for the kudumbam crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`DirectoryErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use kudumbam::error::{Error, ErrorCategory, DirectoryErrorTrait};
//!
//! fn report(err: &Error) {
//!     tracing::error!(category = ?err.category(), "{}", err.localized_desc());
//! }
//! ```

use std::io;
use thiserror::Error;

use crate::i18n::t;

// Re-export domain-specific errors for convenience
pub use crate::composer::ComposeError;
pub use crate::lookup::LookupError;
pub use crate::render::RenderError;
pub use crate::storage::StorageError;
pub use crate::validation::ValidationError;

/// Common trait for all kudumbam error types
pub trait DirectoryErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get localized description for user-facing messages
    fn localized_desc(&self) -> String;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad input from the caller
    Validation,
    /// Browser launch, load or capture failures
    Render,
    /// Database and file errors
    Storage,
    /// Directory template errors
    Template,
}

impl ErrorCategory {
    /// Get localized description for the category
    pub fn localized_desc(&self) -> String {
        match self {
            Self::Validation => t!("errors.category.validation").to_string(),
            Self::Render => t!("errors.category.render").to_string(),
            Self::Storage => t!("errors.category.storage").to_string(),
            Self::Template => t!("errors.category.template").to_string(),
        }
    }
}

/// Unified error type for the kudumbam crate
#[derive(Error, Debug)]
pub enum Error {
    /// PDF rendering errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Directory composition errors
    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),

    /// Repository errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Form validation errors
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Lookup list errors
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DirectoryErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Render(e) => e.is_recoverable(),
            Self::Storage(e) => e.is_recoverable(),
            Self::Lookup(LookupError::Source(_)) => true,
            Self::Io(_) => true,
            Self::Compose(_) | Self::Validation(_) | Self::Lookup(_) => false,
        }
    }

    fn localized_desc(&self) -> String {
        match self {
            Self::Render(RenderError::MissingContent) => {
                t!("errors.render.missing_content").to_string()
            }
            Self::Render(_) => t!("errors.render.failed").to_string(),
            Self::Compose(e) => format!("{}: {e}", t!("errors.template.error")),
            Self::Storage(e) if e.is_not_found() => t!("errors.storage.not_found").to_string(),
            Self::Storage(e) => format!("{}: {e}", t!("errors.storage.error")),
            Self::Validation(_) => t!("errors.validation.error").to_string(),
            Self::Lookup(e) => format!("{}: {e}", t!("errors.lookup.error")),
            Self::Io(e) => format!("{}: {e}", t!("errors.io.error")),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Render(RenderError::MissingContent) | Self::Validation(_) => {
                ErrorCategory::Validation
            }
            Self::Lookup(LookupError::UnknownList(_)) => ErrorCategory::Validation,
            Self::Render(_) => ErrorCategory::Render,
            Self::Compose(_) => ErrorCategory::Template,
            Self::Storage(_) | Self::Io(_) | Self::Lookup(_) => ErrorCategory::Storage,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

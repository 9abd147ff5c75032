//! kudumbam - Bilingual family directory
//!
//! Households and their members in English and Malayalam, with a printable
//! directory export rendered to PDF through a headless browser.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`] - Households, members and language modes
//! - [`composer`] - Directory HTML composition (pure)
//! - [`render`] - HTML to PDF through Chromium
//! - [`storage`] - Household repository (SQLite)
//! - [`validation`] - Household form rules
//! - [`lookup`] - Bilingual option lists and their cache
//! - [`server`] - HTTP API
//! - [`config`] - Configuration management and settings
//!
//! # Example
//!
//! ```no_run
//! use kudumbam::composer::{compose_directory, ComposeOptions};
//! use kudumbam::models::{Household, Language, Member};
//!
//! let mut household = Household::new("12", "Church Road");
//! household.members.push(Member::head("Joseph"));
//!
//! let html = compose_directory(&[household], Language::Both, &ComposeOptions::today())?;
//! # Ok::<(), kudumbam::composer::ComposeError>(())
//! ```

// Initialize rust-i18n at crate root level
rust_i18n::i18n!("locales", fallback = "en");

pub mod composer;
pub mod config;
pub mod error;
pub mod i18n;
pub mod lookup;
pub mod metrics;
pub mod models;
pub mod render;
pub mod server;
pub mod storage;
pub mod validation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::composer::{compose_directory, ComposeOptions, DirectoryComposer};
    pub use crate::config::Config;
    pub use crate::error::{DirectoryErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::{Household, Language, Member};
    pub use crate::render::{RenderRequest, RenderService};
    pub use crate::server::{AppState, DirectoryServer};
    pub use crate::storage::{DirectoryRepository, SqliteDirectoryRepository};
}

// Direct re-exports for convenience
pub use error::{Error, Result};
pub use models::{Household, Language, Member};

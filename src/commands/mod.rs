pub mod export;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use kudumbam::config::Config;

// Re-export command functions for convenience
pub use export::{export, ExportParams};
pub use serve::{serve, ServeParams};

/// Configuration from `path` when given, otherwise from the environment
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env().context("Failed to read configuration from environment"),
    }
}

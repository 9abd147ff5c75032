//! Configuration management for the directory service
//!
//! Configuration comes from a TOML file, from `KUDUMBAM_*` environment
//! variables, or from defaults. Every section may be omitted from the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::render::BrowserEnvironment;
use crate::server::ServerConfig;

/// Marker set by the serverless hosting platform
pub const SERVERLESS_MARKER_VAR: &str = "VERCEL_ENV";

/// Where bundled Chromium is unpacked on serverless hosts
pub const DEFAULT_SERVERLESS_CHROMIUM: &str = "/tmp/chromium";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Browser and PDF rendering configuration
    pub render: RenderConfig,

    /// Database configuration
    pub storage: StorageConfig,

    /// Lookup list cache configuration
    pub lookup: LookupConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Browser and PDF rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Browser acquisition strategy
    pub environment: BrowserEnvironment,

    /// Chrome/Chromium binary; required for serverless
    pub executable_path: Option<PathBuf>,

    /// Upper bound on load and capture, in seconds (0 disables)
    pub timeout_secs: u64,

    /// Extra wait after web fonts report ready, in milliseconds
    pub settle_delay_ms: u64,

    /// Additional browser flags
    pub extra_args: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            environment: BrowserEnvironment::Local,
            executable_path: None,
            timeout_secs: 60,
            settle_delay_ms: 0,
            extra_args: Vec::new(),
        }
    }
}

impl RenderConfig {
    /// Render timeout, `None` when disabled
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/directory.db"),
        }
    }
}

/// Lookup list cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// How long a fetched list stays fresh, in seconds
    pub ttl_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

impl LookupConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// The browser environment is `KUDUMBAM_BROWSER_ENV` when set, otherwise
    /// serverless if `VERCEL_ENV` is present, otherwise local.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment-shaped)
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = var("KUDUMBAM_BIND_ADDRESS") {
            config.server.bind_address = addr
                .parse()
                .with_context(|| format!("Invalid KUDUMBAM_BIND_ADDRESS: {addr}"))?;
        }
        if let Some(cors) = var("KUDUMBAM_ENABLE_CORS").and_then(|v| parse_bool(&v)) {
            config.server.enable_cors = cors;
        }

        config.render.environment = match var("KUDUMBAM_BROWSER_ENV") {
            Some(env) => env
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid KUDUMBAM_BROWSER_ENV")?,
            None if var(SERVERLESS_MARKER_VAR).is_some() => BrowserEnvironment::Serverless,
            None => BrowserEnvironment::Local,
        };

        config.render.executable_path = var("KUDUMBAM_CHROME_PATH").map(PathBuf::from);
        if config.render.environment == BrowserEnvironment::Serverless
            && config.render.executable_path.is_none()
        {
            config.render.executable_path = Some(PathBuf::from(DEFAULT_SERVERLESS_CHROMIUM));
        }

        if let Some(secs) = var("KUDUMBAM_RENDER_TIMEOUT").and_then(|v| v.parse().ok()) {
            config.render.timeout_secs = secs;
        }
        if let Some(ms) = var("KUDUMBAM_SETTLE_DELAY_MS").and_then(|v| v.parse().ok()) {
            config.render.settle_delay_ms = ms;
        }
        if let Some(args) = var("KUDUMBAM_CHROME_ARGS") {
            config.render.extra_args = args.split_whitespace().map(str::to_string).collect();
        }

        if let Some(path) = var("KUDUMBAM_SQLITE_PATH") {
            config.storage.sqlite_path = PathBuf::from(path);
        }
        if let Some(ttl) = var("KUDUMBAM_LOOKUP_TTL").and_then(|v| v.parse().ok()) {
            config.lookup.ttl_secs = ttl;
        }

        if let Some(level) = var("KUDUMBAM_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = var("KUDUMBAM_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;

        if self.render.environment == BrowserEnvironment::Serverless
            && self.render.executable_path.is_none()
        {
            anyhow::bail!("render.executable_path is required for the serverless environment");
        }

        if !matches!(self.logging.format.as_str(), "text" | "pretty" | "json") {
            anyhow::bail!(
                "logging.format must be one of text, pretty, json (got '{}')",
                self.logging.format
            );
        }

        if self.storage.sqlite_path.as_os_str().is_empty() {
            anyhow::bail!("storage.sqlite_path must not be empty");
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

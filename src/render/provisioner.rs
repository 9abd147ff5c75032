//! Browser acquisition strategy
//!
//! Implement [`BrowserProvisioner`] to plug another browser source into the
//! render service. Tests use an in-memory provisioner that counts sessions.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RenderResult;
use super::PdfOptions;

/// Where the browser binary comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEnvironment {
    /// Full headless Chrome or Chromium installed on the host
    #[default]
    Local,
    /// Minimal bundled Chromium at a configured executable path
    Serverless,
}

impl BrowserEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Serverless => "serverless",
        }
    }
}

impl fmt::Display for BrowserEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "serverless" | "lambda" => Ok(Self::Serverless),
            other => Err(format!("unknown browser environment: {other}")),
        }
    }
}

/// One live browser, good for a single render
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `html`, wait for it to settle, and print it to PDF
    async fn render_pdf(&mut self, html: &str, options: &PdfOptions) -> RenderResult<Vec<u8>>;

    /// Release the browser process
    async fn close(self: Box<Self>) -> RenderResult<()>;
}

/// Source of browser sessions
#[async_trait]
pub trait BrowserProvisioner: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Start a fresh browser session
    async fn acquire(&self) -> RenderResult<Box<dyn BrowserSession>>;
}

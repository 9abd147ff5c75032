//! Error types for the render module

use std::fmt;

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Render-specific errors
#[derive(Debug)]
pub enum RenderError {
    /// Request carried no usable HTML
    MissingContent,

    /// Browser could not be started
    LaunchFailed {
        provisioner: String,
        reason: String,
    },

    /// Document could not be loaded into the page
    LoadFailed {
        reason: String,
    },

    /// PDF capture failed or produced nothing
    CaptureFailed {
        reason: String,
    },

    /// Render did not finish in time
    Timeout {
        secs: u64,
    },

    /// Browser session could not be released cleanly
    CloseFailed {
        reason: String,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingContent => write!(f, "HTML content is required"),
            Self::LaunchFailed {
                provisioner,
                reason,
            } => {
                write!(f, "Failed to launch browser via '{}': {}", provisioner, reason)
            }
            Self::LoadFailed { reason } => {
                write!(f, "Failed to load document: {}", reason)
            }
            Self::CaptureFailed { reason } => {
                write!(f, "Failed to capture PDF: {}", reason)
            }
            Self::Timeout { secs } => {
                write!(f, "Render timed out after {}s", secs)
            }
            Self::CloseFailed { reason } => {
                write!(f, "Failed to close browser: {}", reason)
            }
        }
    }
}

impl std::error::Error for RenderError {}

impl RenderError {
    /// Create a launch error
    pub fn launch(provisioner: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::LaunchFailed {
            provisioner: provisioner.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a load error
    pub fn load(reason: impl fmt::Display) -> Self {
        Self::LoadFailed {
            reason: reason.to_string(),
        }
    }

    /// Create a capture error
    pub fn capture(reason: impl fmt::Display) -> Self {
        Self::CaptureFailed {
            reason: reason.to_string(),
        }
    }

    /// Create a close error
    pub fn close(reason: impl fmt::Display) -> Self {
        Self::CloseFailed {
            reason: reason.to_string(),
        }
    }

    /// True when the caller sent a bad request rather than the render failing
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingContent)
    }

    /// Check if retrying the same request may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::LaunchFailed { .. } | Self::Timeout { .. } | Self::CloseFailed { .. }
        )
    }

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingContent => "missing_content",
            Self::LaunchFailed { .. } => "launch",
            Self::LoadFailed { .. } => "load",
            Self::CaptureFailed { .. } => "capture",
            Self::Timeout { .. } => "timeout",
            Self::CloseFailed { .. } => "close",
        }
    }
}

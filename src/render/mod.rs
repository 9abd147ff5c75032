//! PDF rendering through a headless browser
//!
//! The browser itself is a black box behind [`BrowserProvisioner`]. One
//! session is acquired per request and released on every exit path by
//! [`RenderService`].
//!
//! # Architecture
//!
//! ```text
//! RenderRequest ──► RenderService ──► BrowserProvisioner::acquire
//!                        │                     │
//!                        │                     ▼
//!                        │             BrowserSession::render_pdf
//!                        │                     │
//!                        └──── close() ◄───────┘
//! ```

pub mod chromium;
pub mod error;
pub mod provisioner;
pub mod service;

pub use chromium::{ChromiumSession, LocalChromium, ServerlessChromium};
pub use error::{RenderError, RenderResult};
pub use provisioner::{BrowserEnvironment, BrowserProvisioner, BrowserSession};
pub use service::RenderService;

use serde::Deserialize;

/// Filename used when the request names none
pub const DEFAULT_FILENAME: &str = "document.pdf";

/// A4 width in inches
pub const A4_WIDTH_IN: f64 = 8.27;

/// A4 height in inches
pub const A4_HEIGHT_IN: f64 = 11.69;

/// Page setup handed to the browser's print-to-PDF
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfOptions {
    pub paper_width_in: f64,
    pub paper_height_in: f64,
    pub margin_in: f64,
    pub print_background: bool,
    pub prefer_css_page_size: bool,
}

impl Default for PdfOptions {
    /// A4, zero margins, backgrounds printed, CSS page size preferred
    fn default() -> Self {
        Self {
            paper_width_in: A4_WIDTH_IN,
            paper_height_in: A4_HEIGHT_IN,
            margin_in: 0.0,
            print_background: true,
            prefer_css_page_size: true,
        }
    }
}

/// Body of `POST /api/generate-pdf`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl RenderRequest {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Finished PDF ready to be sent as a download
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl RenderedPdf {
    /// `Content-Disposition` header value
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Make a requested filename safe for a `Content-Disposition` header
///
/// Drops quotes, backslashes, control characters and anything up to the last
/// path separator. Falls back to [`DEFAULT_FILENAME`] when nothing is left.
pub fn sanitize_filename(requested: Option<&str>) -> String {
    let raw = requested.unwrap_or_default();
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pdf_options_are_a4() {
        let opts = PdfOptions::default();
        assert_eq!(opts.paper_width_in, 8.27);
        assert_eq!(opts.paper_height_in, 11.69);
        assert_eq!(opts.margin_in, 0.0);
        assert!(opts.print_background);
        assert!(opts.prefer_css_page_size);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename(None), "document.pdf");
        assert_eq!(sanitize_filename(Some("  ")), "document.pdf");
        assert_eq!(sanitize_filename(Some("dir.pdf")), "dir.pdf");
        assert_eq!(sanitize_filename(Some("../../etc/passwd")), "passwd");
        assert_eq!(sanitize_filename(Some("a\"b\r\n.pdf")), "ab.pdf");
        assert_eq!(sanitize_filename(Some("C:\\tmp\\out.pdf")), "out.pdf");
        assert_eq!(sanitize_filename(Some("dir/")), "document.pdf");
    }

    #[test]
    fn test_content_disposition() {
        let pdf = RenderedPdf {
            bytes: vec![],
            filename: "x.pdf".to_string(),
        };
        assert_eq!(pdf.content_disposition(), "attachment; filename=\"x.pdf\"");
    }

    #[test]
    fn test_request_deserialize_optional_fields() {
        let req: RenderRequest = serde_json::from_str("{}").unwrap();
        assert!(req.html.is_none());
        let req: RenderRequest =
            serde_json::from_str(r#"{"html":"<p>x</p>","filename":"a.pdf"}"#).unwrap();
        assert_eq!(req.filename.as_deref(), Some("a.pdf"));
    }
}

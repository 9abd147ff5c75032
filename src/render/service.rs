//! Render service: request validation, scoped browser use and error collapsing

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::metrics;

use super::error::{RenderError, RenderResult};
use super::provisioner::{BrowserProvisioner, BrowserSession};
use super::{sanitize_filename, PdfOptions, RenderRequest, RenderedPdf};

/// Turns HTML into PDF bytes with one browser session per call
///
/// The session acquired for a request is closed on every path out of
/// [`RenderService::render`], including capture failures and timeouts. A
/// caller that drops the render future early still gets the session closed.
#[derive(Clone)]
pub struct RenderService {
    provisioner: Arc<dyn BrowserProvisioner>,
    options: PdfOptions,
    timeout: Option<Duration>,
    open_sessions: Arc<AtomicUsize>,
}

impl RenderService {
    /// Create a service around a provisioner, with A4 defaults and no timeout
    pub fn new(provisioner: Arc<dyn BrowserProvisioner>) -> Self {
        Self {
            provisioner,
            options: PdfOptions::default(),
            timeout: None,
            open_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bound the load-and-capture phase of each render
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_options(mut self, options: PdfOptions) -> Self {
        self.options = options;
        self
    }

    /// Name of the underlying provisioner
    pub fn provisioner_name(&self) -> &str {
        self.provisioner.name()
    }

    /// Sessions acquired and not yet released
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Render a request into a downloadable PDF
    ///
    /// Blank or missing HTML is rejected before any browser is started.
    pub async fn render(&self, request: RenderRequest) -> RenderResult<RenderedPdf> {
        let html = match request.html {
            Some(html) if !html.trim().is_empty() => html,
            _ => {
                metrics::record_render(RenderError::MissingContent.kind());
                return Err(RenderError::MissingContent);
            }
        };
        let filename = sanitize_filename(request.filename.as_deref());

        let started = Instant::now();
        let _timer = metrics::start_render_timer();

        let result = self.render_html(&html).await;

        match &result {
            Ok(bytes) => {
                metrics::record_render("success");
                tracing::info!(
                    provisioner = self.provisioner.name(),
                    filename = %filename,
                    bytes = bytes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "PDF rendered"
                );
            }
            Err(e) => {
                metrics::record_render(e.kind());
                tracing::error!(
                    provisioner = self.provisioner.name(),
                    error = %e,
                    kind = e.kind(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "PDF render failed"
                );
            }
        }

        result.map(|bytes| RenderedPdf { bytes, filename })
    }

    async fn render_html(&self, html: &str) -> RenderResult<Vec<u8>> {
        let session = self.provisioner.acquire().await?;
        let mut guard = SessionGuard::new(session, self.open_sessions.clone());

        let rendered = match self.timeout {
            Some(limit) => {
                let render = guard.render_pdf(html, &self.options);
                match tokio::time::timeout(limit, render).await {
                    Ok(result) => result,
                    Err(_) => Err(RenderError::Timeout {
                        secs: limit.as_secs(),
                    }),
                }
            }
            None => guard.render_pdf(html, &self.options).await,
        };

        let closed = guard.release().await;

        match (rendered, closed) {
            (Ok(bytes), Ok(())) => Ok(bytes),
            (Ok(bytes), Err(e)) => {
                tracing::warn!(error = %e, "Browser release reported an error after a complete render");
                Ok(bytes)
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::warn!(error = %close_err, "Browser release failed after render error");
                Err(e)
            }
        }
    }
}

// ============================================================================
// Session Guard
// ============================================================================

/// Owns an acquired session and counts it as open until dropped
///
/// If the render future is cancelled before [`SessionGuard::release`] runs,
/// the session is closed on a background task instead.
struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
    open_sessions: Arc<AtomicUsize>,
}

impl SessionGuard {
    fn new(session: Box<dyn BrowserSession>, open_sessions: Arc<AtomicUsize>) -> Self {
        let now = open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_open_sessions(now);
        Self {
            session: Some(session),
            open_sessions,
        }
    }

    async fn render_pdf(&mut self, html: &str, options: &PdfOptions) -> RenderResult<Vec<u8>> {
        match self.session.as_mut() {
            Some(session) => session.render_pdf(html, options).await,
            None => Err(RenderError::capture("browser session already released")),
        }
    }

    /// Close the session and stop counting it
    async fn release(mut self) -> RenderResult<()> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    tracing::debug!("Render cancelled, releasing browser in the background");
                    handle.spawn(async move {
                        if let Err(e) = session.close().await {
                            tracing::warn!(error = %e, "Background browser release failed");
                        }
                    });
                }
                Err(_) => tracing::warn!("Render cancelled outside a runtime, browser not released"),
            }
        }

        let now = self
            .open_sessions
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        metrics::set_open_sessions(now);
    }
}

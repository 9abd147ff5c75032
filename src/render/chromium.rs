//! Chromium provisioners built on the DevTools protocol
//!
//! [`LocalChromium`] launches the Chrome or Chromium found on the host (or an
//! explicit executable). [`ServerlessChromium`] launches a minimal bundled
//! build from a fixed path with the reduced flag set such builds need.
//!
//! Each session gets its own browser process and profile directory, so
//! concurrent renders never share state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::config::RenderConfig;

use super::error::{RenderError, RenderResult};
use super::provisioner::{BrowserEnvironment, BrowserProvisioner, BrowserSession};
use super::PdfOptions;

/// Viewport used while laying out the document
const VIEWPORT: (u32, u32) = (1280, 720);

/// Flags for a full Chrome inside a container
const LOCAL_ARGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--single-process",
    "--disable-gpu",
];

/// Flags for a stripped-down bundled Chromium
const SERVERLESS_ARGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--single-process",
    "--no-zygote",
    "--hide-scrollbars",
    "--mute-audio",
    "--disable-extensions",
    "--font-render-hinting=none",
];

/// Resolves once web fonts and every pending image have settled
const READY_SCRIPT: &str = r#"Promise.all([
    document.fonts.ready,
    ...Array.from(document.images)
        .filter((img) => !img.complete)
        .map((img) => new Promise((resolve) => { img.onload = img.onerror = resolve; })),
]).then(() => document.fonts.status)"#;

static PROFILE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn profile_dir() -> PathBuf {
    let n = PROFILE_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("kudumbam-chromium-{}-{}", std::process::id(), n))
}

async fn remove_profile(profile: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(profile).await {
        tracing::trace!(error = %e, profile = %profile.display(), "Profile cleanup skipped");
    }
}

// ============================================================================
// Launch Settings
// ============================================================================

/// Launch settings shared by both provisioners
#[derive(Debug, Clone)]
struct LaunchSettings {
    executable: Option<PathBuf>,
    args: Vec<String>,
    settle_delay: Duration,
    request_timeout: Duration,
}

impl LaunchSettings {
    fn new(base_args: &[&str], executable: Option<PathBuf>) -> Self {
        Self {
            executable,
            args: base_args.iter().map(|a| a.to_string()).collect(),
            settle_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(30),
        }
    }

    async fn launch(&self, provisioner: &str) -> RenderResult<ChromiumSession> {
        self.launch_in(provisioner, profile_dir()).await
    }

    /// Launch with `profile` as the user data dir, removing it if launch fails
    async fn launch_in(
        &self,
        provisioner: &str,
        profile: PathBuf,
    ) -> RenderResult<ChromiumSession> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(VIEWPORT.0, VIEWPORT.1)
            .request_timeout(self.request_timeout)
            .user_data_dir(&profile)
            .args(self.args.iter().map(String::as_str));

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        let launched = match builder.build() {
            Ok(config) => Browser::launch(config).await.map_err(|e| e.to_string()),
            Err(e) => Err(e),
        };
        let (browser, mut handler) = match launched {
            Ok(pair) => pair,
            Err(e) => {
                remove_profile(&profile).await;
                return Err(RenderError::launch(provisioner, e));
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "Browser handler stopped");
                    break;
                }
            }
        });

        tracing::debug!(provisioner, profile = %profile.display(), "Browser launched");

        Ok(ChromiumSession {
            browser,
            handler,
            settle_delay: self.settle_delay,
            profile,
        })
    }
}

// ============================================================================
// Provisioners
// ============================================================================

/// Host-installed headless Chrome
#[derive(Debug, Clone)]
pub struct LocalChromium {
    settings: LaunchSettings,
}

impl LocalChromium {
    /// Use the browser found on `PATH` unless `executable` is given
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self {
            settings: LaunchSettings::new(LOCAL_ARGS, executable),
        }
    }

    /// Extra wait after fonts are ready
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settings.settle_delay = delay;
        self
    }

    /// Append launch flags
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.settings.args.extend(args);
        self
    }
}

#[async_trait]
impl BrowserProvisioner for LocalChromium {
    fn name(&self) -> &str {
        "local"
    }

    async fn acquire(&self) -> RenderResult<Box<dyn BrowserSession>> {
        let session = self.settings.launch(self.name()).await?;
        Ok(Box::new(session))
    }
}

/// Bundled Chromium for serverless hosts
#[derive(Debug, Clone)]
pub struct ServerlessChromium {
    settings: LaunchSettings,
}

impl ServerlessChromium {
    /// `executable` is required since such hosts have no system browser
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            settings: LaunchSettings::new(SERVERLESS_ARGS, Some(executable.into())),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settings.settle_delay = delay;
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.settings.args.extend(args);
        self
    }
}

#[async_trait]
impl BrowserProvisioner for ServerlessChromium {
    fn name(&self) -> &str {
        "serverless"
    }

    async fn acquire(&self) -> RenderResult<Box<dyn BrowserSession>> {
        let session = self.settings.launch(self.name()).await?;
        Ok(Box::new(session))
    }
}

/// Build the provisioner selected by configuration
pub fn provisioner_for(config: &RenderConfig) -> RenderResult<Arc<dyn BrowserProvisioner>> {
    let settle = Duration::from_millis(config.settle_delay_ms);
    let extra = config.extra_args.clone();

    let provisioner: Arc<dyn BrowserProvisioner> = match config.environment {
        BrowserEnvironment::Local => Arc::new(
            LocalChromium::new(config.executable_path.clone())
                .with_settle_delay(settle)
                .with_args(extra),
        ),
        BrowserEnvironment::Serverless => {
            let path = config.executable_path.clone().ok_or_else(|| {
                RenderError::launch("serverless", "no Chromium executable path configured")
            })?;
            Arc::new(
                ServerlessChromium::new(path)
                    .with_settle_delay(settle)
                    .with_args(extra),
            )
        }
    };

    tracing::info!(environment = %config.environment, "Browser provisioner selected");
    Ok(provisioner)
}

// ============================================================================
// Session
// ============================================================================

/// A running Chromium process with its event handler task
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    settle_delay: Duration,
    profile: PathBuf,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn render_pdf(&mut self, html: &str, options: &PdfOptions) -> RenderResult<Vec<u8>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(RenderError::load)?;

        page.set_content(html).await.map_err(RenderError::load)?;

        let ready = EvaluateParams::builder()
            .expression(READY_SCRIPT)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(RenderError::load)?;
        let status = page
            .evaluate_expression(ready)
            .await
            .map_err(RenderError::load)?;
        tracing::debug!(fonts = ?status.value(), "Document ready");

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let params = PrintToPdfParams {
            paper_width: Some(options.paper_width_in),
            paper_height: Some(options.paper_height_in),
            margin_top: Some(options.margin_in),
            margin_bottom: Some(options.margin_in),
            margin_left: Some(options.margin_in),
            margin_right: Some(options.margin_in),
            print_background: Some(options.print_background),
            prefer_css_page_size: Some(options.prefer_css_page_size),
            ..Default::default()
        };

        let bytes = page.pdf(params).await.map_err(RenderError::capture)?;
        if bytes.is_empty() {
            return Err(RenderError::capture("browser returned an empty document"));
        }
        Ok(bytes)
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        let ChromiumSession {
            mut browser,
            handler,
            profile,
            ..
        } = *self;

        let result = match browser.close().await {
            Ok(_) => browser.wait().await.map(|_| ()).map_err(RenderError::close),
            Err(e) => {
                tracing::warn!(error = %e, "Graceful browser close failed, killing process");
                if let Some(Err(kill_err)) = browser.kill().await {
                    tracing::warn!(error = %kill_err, "Failed to kill browser process");
                }
                Err(RenderError::close(e))
            }
        };

        handler.abort();
        remove_profile(&profile).await;
        result
    }
}

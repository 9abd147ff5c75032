//! Prometheus metrics for the directory service
//!
//! This module provides metrics tracking for:
//! - HTTP API: requests by endpoint and status, request duration
//! - Export pipeline: documents composed, PDF renders, render duration, live browser sessions
//! - Lookup cache: hits and misses per list
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_histogram_vec,
    CounterVec, Encoder, Gauge, Histogram, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for HTTP API metrics
struct ApiMetrics {
    requests: CounterVec,
    duration: HistogramVec,
}

/// Container for export pipeline metrics
struct ExportMetrics {
    documents_composed: CounterVec,
    renders: CounterVec,
    render_duration: Histogram,
    open_sessions: Gauge,
    lookup_cache: CounterVec,
}

static API_METRICS: OnceLock<ApiMetrics> = OnceLock::new();

static EXPORT_METRICS: OnceLock<ExportMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Call once at startup. If registration fails, the error is returned and
/// every recording function below becomes a no-op.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = kudumbam::metrics::init_metrics() {
///     tracing::warn!("Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let api = ApiMetrics {
        requests: register_counter_vec!(
            "kudumbam_api_requests_total",
            "Total API requests by endpoint and status",
            &["endpoint", "status"]
        )?,
        duration: register_histogram_vec!(
            "kudumbam_api_request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
    };

    let export = ExportMetrics {
        documents_composed: register_counter_vec!(
            "kudumbam_documents_composed_total",
            "Directory documents composed by language mode",
            &["language"]
        )?,
        renders: register_counter_vec!(
            "kudumbam_pdf_renders_total",
            "PDF renders by outcome",
            &["outcome"]
        )?,
        render_duration: register_histogram!(
            "kudumbam_pdf_render_duration_seconds",
            "Time from browser acquisition to release in seconds",
            vec![0.5, 1.0, 2.0, 3.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]
        )?,
        open_sessions: register_gauge!(
            "kudumbam_browser_sessions_open",
            "Browser sessions currently acquired and not yet released"
        )?,
        lookup_cache: register_counter_vec!(
            "kudumbam_lookup_cache_total",
            "Lookup cache reads by list and result",
            &["list", "result"]
        )?,
    };

    API_METRICS.set(api).ok();
    EXPORT_METRICS.set(export).ok();

    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

/// Check if metrics are initialized
pub fn metrics_initialized() -> bool {
    API_METRICS.get().is_some() && EXPORT_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record API request
pub fn record_api_request(endpoint: &str, status: u16, duration_secs: f64) {
    let Some(m) = API_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.requests
        .with_label_values(&[endpoint, &status_str])
        .inc();
    m.duration
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

/// Record a composed directory document
pub fn record_document_composed(language: &str) {
    if let Some(m) = EXPORT_METRICS.get() {
        m.documents_composed.with_label_values(&[language]).inc();
    }
}

/// Record a finished render; `outcome` is `success` or an error kind
pub fn record_render(outcome: &str) {
    if let Some(m) = EXPORT_METRICS.get() {
        m.renders.with_label_values(&[outcome]).inc();
    }
}

/// Update the number of live browser sessions
pub fn set_open_sessions(count: usize) {
    if let Some(m) = EXPORT_METRICS.get() {
        m.open_sessions.set(count as f64);
    }
}

/// Record a lookup cache read
pub fn record_lookup_cache(list: &str, hit: bool) {
    if let Some(m) = EXPORT_METRICS.get() {
        let result = if hit { "hit" } else { "miss" };
        m.lookup_cache.with_label_values(&[list, result]).inc();
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a render timer (records when dropped)
pub fn start_render_timer() -> MetricsTimer {
    match EXPORT_METRICS.get() {
        Some(m) => MetricsTimer::new(m.render_duration.start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Directory server implementation
//!
//! Wires the repository, composer, lookup cache and render service into one
//! shared [`AppState`] and serves the API over axum.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::composer::{ComposeError, DirectoryComposer};
use crate::config::Config;
use crate::lookup::LookupCache;
use crate::render::chromium::provisioner_for;
use crate::render::RenderService;
use crate::storage::{create_sqlite_repository, SharedDirectoryRepository};

use super::api::create_router;
use super::config::ServerConfig;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Household storage
    pub repository: SharedDirectoryRepository,

    /// HTML to PDF rendering
    pub renderer: RenderService,

    /// Cached lookup lists
    pub lookups: Arc<LookupCache>,

    /// Directory HTML composer
    pub composer: Arc<DirectoryComposer>,

    /// Server start time
    pub start_time: Instant,

    /// Configuration
    pub config: ServerConfig,
}

impl AppState {
    /// State with the built-in composer, static lookups and default server settings
    pub fn new(
        repository: SharedDirectoryRepository,
        renderer: RenderService,
    ) -> Result<Self, ComposeError> {
        Ok(Self {
            repository,
            renderer,
            lookups: Arc::new(LookupCache::with_static(
                crate::config::LookupConfig::default().ttl(),
            )),
            composer: Arc::new(DirectoryComposer::new()?),
            start_time: Instant::now(),
            config: ServerConfig::default(),
        })
    }

    /// Replace the lookup cache
    pub fn with_lookups(mut self, lookups: Arc<LookupCache>) -> Self {
        self.lookups = lookups;
        self
    }
}

// ============================================================================
// Directory Server
// ============================================================================

/// Main directory server
pub struct DirectoryServer {
    config: ServerConfig,
    state: AppState,
}

impl DirectoryServer {
    /// Create a server from full configuration, opening the database and
    /// selecting the browser provisioner
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        let repository = create_sqlite_repository(&config.storage.sqlite_path)
            .map_err(|e| ServerError::InitError(e.to_string()))?;

        let provisioner =
            provisioner_for(&config.render).map_err(|e| ServerError::InitError(e.to_string()))?;
        let mut renderer = RenderService::new(provisioner);
        if let Some(timeout) = config.render.timeout() {
            renderer = renderer.with_timeout(timeout);
        }

        let composer =
            DirectoryComposer::new().map_err(|e| ServerError::InitError(e.to_string()))?;

        let state = AppState {
            repository,
            renderer,
            lookups: Arc::new(LookupCache::with_static(config.lookup.ttl())),
            composer: Arc::new(composer),
            start_time: Instant::now(),
            config: config.server.clone(),
        };

        Ok(Self {
            config: config.server,
            state,
        })
    }

    /// Create a server around prepared state
    pub fn with_state(config: ServerConfig, mut state: AppState) -> Self {
        state.config = config.clone();
        Self { config, state }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes));

        // Add CORS layer if enabled
        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        // Add tracing layer if enabled
        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!(
            provisioner = self.state.renderer.provisioner_name(),
            "Starting directory server on {}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        Ok(())
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!(
            provisioner = self.state.renderer.provisioner_name(),
            "Starting directory server on {} (with graceful shutdown)",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Directory server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            provisioner: self.state.renderer.provisioner_name().to_string(),
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub provisioner: String,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Directory Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Browser: {}\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.provisioner,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    ConfigError(String),

    /// Initialization error
    InitError(String),

    /// Failed to bind to address
    BindError(String),

    /// Server error
    ServeError(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::InitError(msg) => write!(f, "Initialization error: {}", msg),
            Self::BindError(msg) => write!(f, "Failed to bind: {}", msg),
            Self::ServeError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

// ============================================================================
// Tests
// ============================================================================

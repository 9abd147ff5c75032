use std::path::PathBuf;

use anyhow::{Context, Result};

use kudumbam::config::Config;
use kudumbam::server::DirectoryServer;

/// Command-line overrides for `serve`
#[derive(Debug)]
pub struct ServeParams {
    pub bind: Option<String>,
    pub db: Option<PathBuf>,
    pub enable_cors: bool,
}

/// Run the directory API until Ctrl+C
pub async fn serve(mut config: Config, params: ServeParams) -> Result<()> {
    let ServeParams {
        bind,
        db,
        enable_cors,
    } = params;

    if let Some(bind) = bind {
        config.server.bind_address = bind.parse().context("Invalid bind address")?;
    }
    if let Some(db) = db {
        config.storage.sqlite_path = db;
    }
    config.server.enable_cors = config.server.enable_cors && enable_cors;

    config.validate()?;

    println!("Starting Directory Server");
    println!("=========================");
    println!("  Database: {}", config.storage.sqlite_path.display());
    println!("  Browser: {}", config.render.environment);
    if let Some(path) = &config.render.executable_path {
        println!("  Chromium: {}", path.display());
    }
    println!("  Render Timeout: {}s", config.render.timeout_secs);
    println!("  Lookup TTL: {}s", config.lookup.ttl_secs);
    println!();

    let bind_address = config.server.bind_address;
    let server = DirectoryServer::new(config).context("Failed to create directory server")?;

    println!("{}", server.info().display());
    println!();
    println!("API Endpoints:");
    println!("  POST   /api/generate-pdf     - Render posted HTML to PDF");
    println!("  GET    /api/health           - Health check");
    println!("  GET    /metrics              - Prometheus metrics endpoint");
    println!("  GET    /api/families         - Search households");
    println!("  POST   /api/families         - Create household");
    println!("  GET    /api/families/{{id}}    - Get household");
    println!("  PUT    /api/families/{{id}}    - Update household");
    println!("  DELETE /api/families/{{id}}    - Delete household");
    println!("  GET    /api/lookups/{{kind}}   - Relationship, occupation and blood group lists");
    println!("  GET    /api/directory/html   - Directory preview");
    println!("  GET    /api/directory/pdf    - Directory PDF");
    println!();
    println!("Directory server listening on http://{bind_address}");
    println!("Press Ctrl+C to stop.\n");

    // Start with graceful shutdown
    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    println!("Directory server stopped.");
    Ok(())
}

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{ExportParams, ServeParams};

#[derive(Parser)]
#[command(
    name = "kudumbam",
    version,
    about = "Bilingual family directory with HTML composition and PDF export",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Bind address, e.g. 0.0.0.0:8080
        #[arg(short, long)]
        bind: Option<String>,

        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// Disable CORS headers
        #[arg(long, default_value = "false")]
        no_cors: bool,
    },

    /// Export the directory to PDF (or HTML)
    Export {
        /// Language mode (english, malayalam, both)
        #[arg(short, long, default_value = "both")]
        language: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the composed HTML instead of rendering a PDF
        #[arg(long, default_value = "false")]
        html: bool,

        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    kudumbam::i18n::init_from_env();
    if let Err(e) = kudumbam::metrics::init_metrics() {
        tracing::warn!("Metrics initialization failed: {}", e);
    }

    tracing::info!("kudumbam starting");

    match cli.command {
        Commands::Serve { bind, db, no_cors } => {
            tracing::info!(
                bind = ?bind,
                db = ?db,
                no_cors = %no_cors,
                "Starting serve command"
            );
            commands::serve(
                config,
                ServeParams {
                    bind,
                    db,
                    enable_cors: !no_cors,
                },
            )
            .await?;
        }

        Commands::Export {
            language,
            output,
            html,
            db,
        } => {
            tracing::info!(
                language = %language,
                output = ?output,
                html = %html,
                "Starting export command"
            );
            commands::export(
                config,
                ExportParams {
                    language,
                    output,
                    html_only: html,
                    db,
                },
            )
            .await?;
        }
    }

    tracing::info!("kudumbam completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("kudumbam=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("kudumbam={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

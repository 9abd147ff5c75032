use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use kudumbam::composer::{directory_filename, ComposeOptions, DirectoryComposer};
use kudumbam::config::Config;
use kudumbam::models::Language;
use kudumbam::render::chromium::provisioner_for;
use kudumbam::render::{RenderRequest, RenderService};
use kudumbam::storage::{DirectoryRepository, SqliteDirectoryRepository};

/// Arguments for `export`
#[derive(Debug)]
pub struct ExportParams {
    pub language: String,
    pub output: Option<PathBuf>,
    pub html_only: bool,
    pub db: Option<PathBuf>,
}

/// Compose the stored directory and write it as PDF or HTML
pub async fn export(mut config: Config, params: ExportParams) -> Result<()> {
    let language: Language = params
        .language
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    if let Some(db) = params.db {
        config.storage.sqlite_path = db;
    }
    config.validate()?;

    let today = Local::now().date_naive();
    let output = params.output.unwrap_or_else(|| {
        let name = PathBuf::from(directory_filename(language, today));
        if params.html_only {
            name.with_extension("html")
        } else {
            name
        }
    });

    let repository = SqliteDirectoryRepository::new(&config.storage.sqlite_path)
        .context("Failed to open directory database")?;
    let households = repository
        .snapshot()
        .context("Failed to read households")?;

    println!("Exporting family directory...");
    println!("  Database: {}", config.storage.sqlite_path.display());
    println!("  Households: {}", households.len());
    println!("  Language: {language}");

    let composer = DirectoryComposer::new().context("Failed to load directory templates")?;
    let html = composer
        .compose(&households, language, &ComposeOptions::new(today))
        .context("Failed to compose directory")?;
    kudumbam::metrics::record_document_composed(language.as_str());

    if params.html_only {
        write_output(&output, html.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("  Wrote HTML: {}", output.display());
        return Ok(());
    }

    let provisioner =
        provisioner_for(&config.render).context("Failed to configure browser")?;
    let mut renderer = RenderService::new(provisioner);
    if let Some(timeout) = config.render.timeout() {
        renderer = renderer.with_timeout(timeout);
    }

    let filename = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    let mut request = RenderRequest::new(html);
    request.filename = filename;

    let pdf = renderer.render(request).await.context("Failed to render PDF")?;
    write_output(&output, &pdf.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("  Wrote PDF: {} ({} bytes)", output.display(), pdf.bytes.len());
    Ok(())
}

async fn write_output(path: &Path, bytes: &[u8]) -> kudumbam::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

//! Tests for config module

use std::io::Write;
use std::path::{Path, PathBuf};

use kudumbam::config::Config;
use kudumbam::render::BrowserEnvironment;
use serial_test::serial;

const ENV_VARS: &[&str] = &[
    "VERCEL_ENV",
    "KUDUMBAM_BROWSER_ENV",
    "KUDUMBAM_CHROME_PATH",
    "KUDUMBAM_RENDER_TIMEOUT",
    "KUDUMBAM_SQLITE_PATH",
    "KUDUMBAM_BIND_ADDRESS",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn test_config_file_exists() {
    let config_path = Path::new("config.toml");
    assert!(
        config_path.exists(),
        "config.toml should exist in project root"
    );
}

#[test]
fn test_repository_config_loads_and_validates() {
    let config = Config::from_file(Path::new("config.toml")).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.render.environment, BrowserEnvironment::Local);
    assert_eq!(config.render.timeout_secs, 60);
    assert_eq!(config.storage.sqlite_path, PathBuf::from("data/directory.db"));
}

#[test]
fn test_from_file_reports_parse_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[render]\ntimeout_secs = \"soon\"").unwrap();

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML config file"));
}

#[test]
fn test_from_file_missing() {
    assert!(Config::from_file(Path::new("does/not/exist.toml")).is_err());
}

#[test]
#[serial]
fn test_env_defaults_to_local() {
    clear_env();
    let config = Config::from_env().unwrap();
    assert_eq!(config.render.environment, BrowserEnvironment::Local);
    assert!(config.render.executable_path.is_none());
}

#[test]
#[serial]
fn test_env_vercel_selects_serverless() {
    clear_env();
    std::env::set_var("VERCEL_ENV", "production");
    std::env::set_var("KUDUMBAM_CHROME_PATH", "/opt/chromium/chrome");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.render.environment, BrowserEnvironment::Serverless);
    assert_eq!(
        config.render.executable_path,
        Some(PathBuf::from("/opt/chromium/chrome"))
    );
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var("KUDUMBAM_RENDER_TIMEOUT", "15");
    std::env::set_var("KUDUMBAM_SQLITE_PATH", "/var/lib/kudumbam/dir.db");
    std::env::set_var("KUDUMBAM_BIND_ADDRESS", "127.0.0.1:3000");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.render.timeout_secs, 15);
    assert_eq!(
        config.storage.sqlite_path,
        PathBuf::from("/var/lib/kudumbam/dir.db")
    );
    assert_eq!(config.server.bind_address.port(), 3000);
}

//! HTTP server for the family directory
//!
//! # Routes
//!
//! ```text
//! POST   /api/generate-pdf          HTML → PDF attachment
//! GET    /api/health
//! GET    /api/families              search / sort / paginate
//! POST   /api/families
//! GET    /api/families/{id}
//! PUT    /api/families/{id}
//! DELETE /api/families/{id}
//! GET    /api/lookups/{kind}        relationships | occupations | blood-groups
//! GET    /api/directory/html        ?language=english|malayalam|both
//! GET    /api/directory/pdf         ?language=english|malayalam|both
//! GET    /metrics
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use kudumbam::config::Config;
//! use kudumbam::server::DirectoryServer;
//!
//! let server = DirectoryServer::new(Config::from_env()?)?;
//! server.start().await?;
//! ```

pub mod api;
pub mod config;
pub mod server;

// Re-export main types
pub use api::{create_router, ApiResponse};
pub use config::{ConfigError, ServerConfig};
pub use server::{AppState, DirectoryServer, ServerError};

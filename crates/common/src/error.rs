//! Error types for sitecheck

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the sitecheck Error
pub type Result<T> = std::result::Result<T, Error>;

/// sitecheck error types
///
/// Setup and load errors (`PortUnavailable`, `EngineLaunch`, `UnknownTarget`,
/// `CatalogParse`) are fatal for the whole run. Assertion failures and
/// per-check timeouts are never surfaced here; they are recorded as
/// `CheckResult`s and only decide the exit code at report time.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Port {port} is already in use")]
    PortUnavailable { port: u16 },

    #[error("Browser engine failed to launch: {0}")]
    EngineLaunch(String),

    #[error("Check '{check_id}' targets unknown page '{page}'")]
    UnknownTarget { check_id: String, page: String },

    #[error("Check catalog error in {path}: {reason}")]
    CatalogParse { path: PathBuf, reason: String },

    #[error("Invalid check '{check_id}': {reason}")]
    InvalidCheck { check_id: String, reason: String },

    #[error("Site root not found: {0}")]
    SiteRootNotFound(PathBuf),

    #[error("No pages discovered under {0}")]
    NoPages(PathBuf),

    #[error("Checks directory not found: {0}")]
    ChecksDirNotFound(PathBuf),

    #[error("No checks loaded from {0}")]
    NoChecks(PathBuf),

    #[error("Fixture server failed to become ready within {0:?}")]
    ServerNotReady(std::time::Duration),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

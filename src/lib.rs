//! Veilcrawl: an anonymized, paced web crawler base
//!
//! This crate provides the shared machinery for page crawlers: sessions routed
//! through an anonymizing SOCKS proxy with a rotating user agent, identity
//! renewal over the proxy's control port, and a sequential crawl loop that
//! hands every page to a pluggable [`Crawler`] for parsing and extraction.

pub mod config;
pub mod crawler;
pub mod output;
pub mod session;

use thiserror::Error;

/// Main error type for Veilcrawl operations
#[derive(Debug, Error)]
pub enum VeilError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Control port rejected credential: {0}")]
    Authentication(String),

    #[error("Control channel error: {0}")]
    ControlChannel(String),

    #[error("Failed to build HTTP session: {0}")]
    Session(#[from] reqwest::Error),

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Parse failed for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VeilError {
    /// Short machine-friendly name of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            VeilError::Config(_) => "config",
            VeilError::Authentication(_) => "authentication",
            VeilError::ControlChannel(_) => "control-channel",
            VeilError::Session(_) => "session",
            VeilError::Fetch { .. } => "fetch",
            VeilError::Parse { .. } => "parse",
            VeilError::Extraction { .. } => "extraction",
            VeilError::Json(_) => "json",
            VeilError::Io(_) => "io",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Veilcrawl operations
pub type Result<T> = std::result::Result<T, VeilError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlLoop, CrawlReport, Crawler, ScrapeResult};
pub use session::{IdentityPool, Session, SessionProvisioner};

//! wp-harvest: a WordPress news collector
//!
//! This crate pulls recently published posts from WordPress sites through their
//! `wp-json` REST API, one page at a time through a single browser session, and
//! normalizes the captured posts into one canonical article record per URL.

pub mod config;
pub mod crawler;
pub mod normalize;
pub mod output;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

pub use crawler::{ExtractionError, FetchError};
pub use normalize::NormalizationError;

/// Main error type for wp-harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Failed to read domains file '{}': {source}", path.display())]
    DomainsFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Source directory '{}' not found", path.display())]
    SourceMissing { path: PathBuf },

    #[error("'_collection_summary.json' not found in '{}'", dir.display())]
    SummaryMissing { dir: PathBuf },

    #[error("Malformed input in {file}: {message}")]
    MalformedInput { file: String, message: String },

    #[error("Unexpected response shape for {url}: {message}")]
    UnexpectedShape { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{url}': {source}")]
    Parse {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Empty domain entry")]
    EmptyDomain,
}

/// Result type alias for wp-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{collect, CollectionOutcome, Collector};
pub use normalize::{normalize_post, process_directory, NormalizationStats, NormalizedArticle};
pub use state::{DomainState, DomainStatus};

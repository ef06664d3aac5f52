//! Normalization of collected posts into canonical articles
//!
//! Raw WordPress posts are converted one by one into [`NormalizedArticle`]
//! records (Markdown body, resolved source domain, UTC timestamps) and stored
//! content-addressed by the MD5 of their URL.

mod article;
mod batch;
mod markdown;
mod normalizer;

pub use article::{ArticleMetadata, NormalizedArticle, RawPost, RenderedText};
pub use batch::{article_path, process_directory, read_collection_timestamp, url_hash};
pub use markdown::{html_to_markdown, normalize_whitespace};
pub use normalizer::{article_identifier, normalize_post};

pub use crate::output::NormalizationStats;

use thiserror::Error;

/// Why a single post could not be normalized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("Missing required field '{field}' for article: {article}")]
    MissingField { field: &'static str, article: String },

    #[error("Error processing required fields for article {article}: {message}")]
    InvalidShape { article: String, message: String },
}

//! Configuration module for wp-harvest
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, plus reading the plain-text domains list.
//!
//! # Example
//!
//! ```no_run
//! use wp_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Collector will fetch at most {} pages per domain", config.collector.max_pages);
//! ```

mod domains;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrowserBackend, BrowserConfig, CollectorConfig, Config, OutputConfig};

// Re-export parser functions
pub use domains::{load_domains, parse_domains};
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for wp-harvest
///
/// Every section and key has a default, so an empty (or absent) config file
/// yields the stock collector behaviour.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Collection and pagination behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Posts requested per page (WordPress caps this at 100)
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Maximum pages fetched per domain in one run
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Posts requested by the diagnostic probe
    #[serde(rename = "probe-page-size")]
    pub probe_page_size: u32,

    /// Pause after navigation to let the page render (milliseconds)
    #[serde(rename = "wait-after-load-ms")]
    pub wait_after_load_ms: u64,

    /// CSS selector used as the content-ready probe
    #[serde(rename = "probe-selector")]
    pub probe_selector: String,

    /// How long the content-ready probe may wait (milliseconds)
    #[serde(rename = "probe-timeout-ms")]
    pub probe_timeout_ms: u64,

    /// Lower bound of the random pause between requests (milliseconds)
    #[serde(rename = "delay-min-ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the random pause between requests (milliseconds)
    #[serde(rename = "delay-max-ms")]
    pub delay_max_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 20,
            probe_page_size: 10,
            wait_after_load_ms: 3000,
            probe_selector: "body".to_string(),
            probe_timeout_ms: 10_000,
            delay_min_ms: 0,
            delay_max_ms: 1000,
        }
    }
}

impl CollectorConfig {
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Which rendering backend drives the browsing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserBackend {
    /// Plain HTTP fetches (no JavaScript)
    #[default]
    Http,
    /// A Browserless instance rendering pages in headless Chrome
    Browserless,
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub backend: BrowserBackend,

    /// Base URL of the Browserless service (required for the browserless backend)
    #[serde(rename = "browserless-url")]
    pub browserless_url: Option<String>,

    /// Browserless API token
    #[serde(rename = "browserless-token")]
    pub browserless_token: Option<String>,

    /// User agent sent by the HTTP backend
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            backend: BrowserBackend::Http,
            browserless_url: None,
            browserless_token: None,
            user_agent: format!("wp-harvest/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the raw collection tree
    #[serde(rename = "posts-dir")]
    pub posts_dir: String,

    /// Where captured page text is saved for inspection
    #[serde(rename = "debug-dir")]
    pub debug_dir: String,

    /// Default root for normalized articles
    #[serde(rename = "normalized-dir")]
    pub normalized_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            posts_dir: "wordpress_posts".to_string(),
            debug_dir: "debug_pages".to_string(),
            normalized_dir: "../normalized_news".to_string(),
        }
    }
}

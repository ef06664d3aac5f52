//! Browser sessions used to load API pages
//!
//! Pages are loaded through a [`BrowserSession`], one tab per URL. Two
//! backends are provided:
//! - [`HttpSession`]: plain HTTP GET through reqwest, for sites that serve
//!   their REST API without a JavaScript challenge
//! - [`BrowserlessSession`]: a remote headless Chrome reached through the
//!   Browserless `/content` endpoint, which renders the page and returns the
//!   resulting HTML

use crate::config::BrowserConfig;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Failure while loading a page through a browser session
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Timed out after {timeout_ms}ms waiting for '{selector}'")]
    ProbeTimeout { selector: String, timeout_ms: u64 },

    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),

    #[error("Browser backend error: {0}")]
    Backend(String),
}

/// A long-lived browser that opens one tab per page
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    type Tab: BrowserTab;

    /// Opens a new tab navigated to `url`
    async fn open_tab(&mut self, url: &str) -> Result<Self::Tab, FetchError>;

    /// Shuts the browser down; called once at the end of a run
    async fn stop(&mut self) -> Result<(), FetchError>;
}

/// One open page
#[allow(async_fn_in_trait)]
pub trait BrowserTab {
    /// Gives the page time to finish rendering
    async fn settle(&mut self, wait: Duration) {
        tokio::time::sleep(wait).await;
    }

    /// Waits until an element matching `selector` is present
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), FetchError>;

    /// Returns the full page content as rendered
    async fn content(&mut self) -> Result<String, FetchError>;

    /// Releases the tab
    async fn close(self) -> Result<(), FetchError>;
}

/// Builds the HTTP client shared by both backends
///
/// # Arguments
///
/// * `config` - The browser configuration (user agent and timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &BrowserConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Turns a reqwest failure into a navigation error with a short reason
fn navigation_error(url: &str, e: reqwest::Error) -> FetchError {
    let message = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    };

    FetchError::Navigation {
        url: url.to_string(),
        message,
    }
}

/// Returns true if `html` contains an element matching `selector`
///
/// Documents are parsed leniently, so even a bare JSON body gets the implied
/// `html`, `head` and `body` elements a browser would create.
pub fn document_matches(html: &str, selector: &str) -> Result<bool, FetchError> {
    let parsed = Selector::parse(selector)
        .map_err(|_| FetchError::InvalidSelector(selector.to_string()))?;
    let document = Html::parse_document(html);
    let found = document.select(&parsed).next().is_some();
    Ok(found)
}

fn probe_static(html: &str, selector: &str, timeout: Duration) -> Result<(), FetchError> {
    if document_matches(html, selector)? {
        Ok(())
    } else {
        Err(FetchError::ProbeTimeout {
            selector: selector.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }
}

/// Session that loads pages with plain HTTP requests
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    pub fn new(config: &BrowserConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config)
            .map_err(|e| FetchError::Backend(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

/// A page fetched over HTTP; the body is complete once the tab is open
#[derive(Debug)]
pub struct HttpTab {
    url: String,
    status: StatusCode,
    body: String,
}

impl BrowserSession for HttpSession {
    type Tab = HttpTab;

    async fn open_tab(&mut self, url: &str) -> Result<HttpTab, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| navigation_error(url, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| navigation_error(url, e))?;

        Ok(HttpTab {
            url: url.to_string(),
            status,
            body,
        })
    }

    async fn stop(&mut self) -> Result<(), FetchError> {
        Ok(())
    }
}

impl BrowserTab for HttpTab {
    // A static response has nothing left to render.
    async fn settle(&mut self, _wait: Duration) {}

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), FetchError> {
        probe_static(&self.body, selector, timeout)
    }

    async fn content(&mut self) -> Result<String, FetchError> {
        if !self.status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: self.status.as_u16(),
            });
        }
        Ok(self.body.clone())
    }

    async fn close(self) -> Result<(), FetchError> {
        Ok(())
    }
}

/// Session backed by a Browserless instance
///
/// Every tab is one call to `POST {base}/content`, which navigates a headless
/// Chrome to the URL, waits, and returns the rendered HTML.
#[derive(Debug, Clone)]
pub struct BrowserlessSession {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessSession {
    pub fn new(config: &BrowserConfig) -> Result<Self, FetchError> {
        let base_url = config
            .browserless_url
            .as_deref()
            .ok_or_else(|| FetchError::Backend("browserless-url is not configured".to_string()))?;
        let client = build_http_client(config)
            .map_err(|e| FetchError::Backend(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: config.browserless_token.clone(),
        })
    }

    fn content_endpoint(&self) -> String {
        match &self.token {
            Some(token) => format!("{}/content?token={}", self.base_url, token),
            None => format!("{}/content", self.base_url),
        }
    }
}

/// A page rendered by Browserless; loaded lazily on first probe or read
#[derive(Debug)]
pub struct BrowserlessTab {
    client: Client,
    endpoint: String,
    url: String,
    wait: Duration,
    loaded: Option<Result<String, FetchError>>,
}

impl BrowserlessTab {
    /// Renders the page once; later calls replay the first outcome
    async fn load(&mut self) -> Result<&str, FetchError> {
        if self.loaded.is_none() {
            self.loaded = Some(self.render().await);
        }

        match &self.loaded {
            Some(Ok(html)) => Ok(html),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(""),
        }
    }

    async fn render(&self) -> Result<String, FetchError> {
        let body = json!({
            "url": self.url,
            "waitForTimeout": self.wait.as_millis() as u64,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| navigation_error(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FetchError::Backend(format!(
                "Browserless returned {} for {}: {}",
                status.as_u16(),
                self.url,
                detail.trim()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| navigation_error(&self.url, e))
    }
}

impl BrowserSession for BrowserlessSession {
    type Tab = BrowserlessTab;

    async fn open_tab(&mut self, url: &str) -> Result<BrowserlessTab, FetchError> {
        Ok(BrowserlessTab {
            client: self.client.clone(),
            endpoint: self.content_endpoint(),
            url: url.to_string(),
            wait: Duration::ZERO,
            loaded: None,
        })
    }

    async fn stop(&mut self) -> Result<(), FetchError> {
        Ok(())
    }
}

impl BrowserTab for BrowserlessTab {
    // Rendering happens remotely, so the wait is handed to Browserless.
    async fn settle(&mut self, wait: Duration) {
        self.wait = wait;
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), FetchError> {
        let html = self.load().await?;
        probe_static(html, selector, timeout)
    }

    async fn content(&mut self) -> Result<String, FetchError> {
        self.load().await.map(str::to_string)
    }

    async fn close(self) -> Result<(), FetchError> {
        Ok(())
    }
}

//! Sequential fetch driver
//!
//! The driver walks a growing worklist of API URLs through one browser
//! session. Each item is loaded in its own tab, its content is run through
//! [`extract_json`], and the outcome is handed to a callback. Whatever work the
//! callback returns (the next page of a domain, typically) is appended to the
//! worklist, so the walk ends only when the list is exhausted.
//!
//! Requests are strictly one at a time with a randomized pause between them.

use crate::config::Config;
use crate::crawler::fetcher::{BrowserSession, BrowserTab};
use crate::crawler::parser::extract_json;
use crate::url::sanitize_filename;
use crate::HarvestError;
use rand::Rng;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One URL to load, tagged with the domain and page it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: String,
    pub domain: String,
    pub page_number: u32,
}

impl WorkItem {
    pub fn new(url: impl Into<String>, domain: impl Into<String>, page_number: u32) -> Self {
        Self {
            url: url.into(),
            domain: domain.into(),
            page_number,
        }
    }
}

/// FIFO worklist that may grow while it is being consumed
#[derive(Debug, Default)]
pub struct Worklist {
    pending: VecDeque<WorkItem>,
    dispatched: usize,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: WorkItem) {
        self.pending.push_back(item);
    }

    /// Takes the next item together with its zero-based processing index
    pub fn next_item(&mut self) -> Option<(usize, WorkItem)> {
        let item = self.pending.pop_front()?;
        let index = self.dispatched;
        self.dispatched += 1;
        Some((index, item))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Items still waiting
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Items handed out so far
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }
}

impl Extend<WorkItem> for Worklist {
    fn extend<I: IntoIterator<Item = WorkItem>>(&mut self, iter: I) {
        self.pending.extend(iter);
    }
}

impl FromIterator<WorkItem> for Worklist {
    fn from_iter<I: IntoIterator<Item = WorkItem>>(iter: I) -> Self {
        Self {
            pending: iter.into_iter().collect(),
            dispatched: 0,
        }
    }
}

/// Outcome of loading one work item
#[derive(Debug)]
pub enum FetchEvent {
    /// The page loaded and its content parsed as JSON
    Success {
        index: usize,
        item: WorkItem,
        data: Value,
    },
    /// Loading or extraction failed; `content` holds the page if it was read
    Error {
        index: usize,
        item: WorkItem,
        error: HarvestError,
        content: Option<String>,
    },
}

impl FetchEvent {
    pub fn item(&self) -> &WorkItem {
        match self {
            Self::Success { item, .. } | Self::Error { item, .. } => item,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Success { index, .. } | Self::Error { index, .. } => *index,
        }
    }
}

/// Inclusive range the pause between requests is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// No pause at all
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

/// Tunables of the fetch driver
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Pause after navigation so the page can finish rendering
    pub wait_after_load: Duration,
    /// Element that signals the page has content
    pub probe_selector: String,
    pub probe_timeout: Duration,
    pub delay: DelayRange,
    /// Where page content is saved for inspection; `None` disables saving
    pub debug_dir: Option<PathBuf>,
    /// Save every page, not just failures
    pub debug_mode: bool,
}

impl DriverSettings {
    pub fn from_config(config: &Config, debug_mode: bool) -> Self {
        let collector = &config.collector;
        Self {
            wait_after_load: collector.wait_after_load(),
            probe_selector: collector.probe_selector.clone(),
            probe_timeout: collector.probe_timeout(),
            delay: DelayRange::new(
                Duration::from_millis(collector.delay_min_ms),
                Duration::from_millis(collector.delay_max_ms),
            ),
            debug_dir: Some(PathBuf::from(&config.output.debug_dir)),
            debug_mode,
        }
    }
}

/// Drives work items through a browser session one at a time
#[derive(Debug, Clone)]
pub struct FetchDriver {
    settings: DriverSettings,
}

impl FetchDriver {
    pub fn new(settings: DriverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    /// Processes the worklist until it is empty
    ///
    /// Every item produces exactly one event, delivered in processing order.
    /// Items returned by `on_event` are appended to the worklist before the
    /// next item is taken.
    ///
    /// # Returns
    ///
    /// The number of items processed
    pub async fn run<S, F>(&self, session: &mut S, worklist: &mut Worklist, mut on_event: F) -> usize
    where
        S: BrowserSession,
        F: FnMut(FetchEvent) -> Vec<WorkItem>,
    {
        let mut processed = 0;

        while let Some((index, item)) = worklist.next_item() {
            let event = self.fetch_item(session, index, item).await;
            let follow_up = on_event(event);
            worklist.extend(follow_up);
            processed += 1;

            if !worklist.is_empty() {
                let pause = self.settings.delay.sample();
                tracing::debug!("Waiting {:?} before next request", pause);
                tokio::time::sleep(pause).await;
            }
        }

        processed
    }

    async fn fetch_item<S: BrowserSession>(
        &self,
        session: &mut S,
        index: usize,
        item: WorkItem,
    ) -> FetchEvent {
        tracing::info!("[{}] Fetching {}", index, item.url);

        let mut captured = None;
        let result = match session.open_tab(&item.url).await {
            Ok(mut tab) => {
                let result = self.read_tab(&mut tab, &mut captured).await;
                if let Err(e) = tab.close().await {
                    tracing::debug!("Ignoring tab close failure for {}: {}", item.url, e);
                }
                result
            }
            Err(e) => Err(HarvestError::from(e)),
        };

        match result {
            Ok(data) => {
                if self.settings.debug_mode {
                    if let Some(content) = &captured {
                        self.save_debug_page(&item.url, "success", content);
                    }
                }
                FetchEvent::Success { index, item, data }
            }
            Err(error) => {
                tracing::warn!("[{}] Failed to fetch {}: {}", index, item.url, error);
                if let Some(content) = &captured {
                    self.save_debug_page(&item.url, "error", content);
                }
                FetchEvent::Error {
                    index,
                    item,
                    error,
                    content: captured,
                }
            }
        }
    }

    async fn read_tab<T: BrowserTab>(
        &self,
        tab: &mut T,
        captured: &mut Option<String>,
    ) -> Result<Value, HarvestError> {
        tab.settle(self.settings.wait_after_load).await;

        // A missing probe element is not fatal; the content is read anyway.
        if let Err(e) = tab
            .wait_for(&self.settings.probe_selector, self.settings.probe_timeout)
            .await
        {
            tracing::debug!("Content probe did not succeed: {}", e);
        }

        let content = tab.content().await?;
        let parsed = extract_json(&content);
        *captured = Some(content);
        Ok(parsed?)
    }

    fn save_debug_page(&self, url: &str, outcome: &str, content: &str) {
        let Some(dir) = &self.settings.debug_dir else {
            return;
        };
        match save_debug_page(dir, url, outcome, content) {
            Ok(path) => tracing::debug!("Saved page content to {}", path.display()),
            Err(e) => tracing::warn!("Failed to save debug page for {}: {}", url, e),
        }
    }
}

/// Writes page content to `{dir}/{sanitized url}_{outcome}.html`
pub fn save_debug_page(
    dir: &Path,
    url: &str,
    outcome: &str,
    content: &str,
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_{}.html", sanitize_filename(url), outcome));
    std::fs::write(&path, content)?;
    Ok(path)
}

//! Collection orchestration
//!
//! A collection run walks every domain's windowed posts listing, page by page,
//! through one browser session:
//! - Initial work is page 1 of every domain
//! - Each absorbed page is deduplicated and the domain's posts file rewritten
//! - A full page of new posts schedules the next page
//! - Domains that finish with no posts and no error get an unfiltered
//!   diagnostic probe so the run can tell "quiet site" from "no API"
//! - The run closes with a summary file and, if any, the site notes

use crate::config::{load_domains, BrowserBackend, CollectorConfig, Config};
use crate::crawler::fetcher::{BrowserSession, BrowserlessSession, HttpSession};
use crate::crawler::scheduler::{DriverSettings, FetchDriver, FetchEvent, WorkItem, Worklist};
use crate::output::{
    write_json_atomic, CollectionSummary, DomainResult, RunLayout, SiteNote, SiteNotes,
};
use crate::state::{DomainState, DomainStatus};
use crate::url::{build_posts_url, format_after, PostsQuery};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const NO_ARTICLES_MESSAGE: &str = "No articles found in timeframe";

/// Everything a finished collection run produced
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub summary: CollectionSummary,
    pub site_notes: SiteNotes,
    pub run_dir: PathBuf,
    /// Pages loaded across both passes
    pub pages_processed: usize,
}

/// Collects recent posts from WordPress sites through a browser session
pub struct Collector<S: BrowserSession> {
    config: Config,
    session: S,
}

impl<S: BrowserSession> Collector<S> {
    /// Creates a new collector
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `session` - The browser session every page is loaded through
    pub fn new(config: Config, session: S) -> Self {
        Self { config, session }
    }

    /// Runs one collection over `domains`
    ///
    /// The browser session is stopped when the run ends, whether it succeeded
    /// or not.
    ///
    /// # Arguments
    ///
    /// * `domains` - Domains in the order they should be reported
    /// * `hours_ago` - Width of the lookback window
    /// * `debug` - Save the content of every page, not just failures
    ///
    /// # Returns
    ///
    /// * `Ok(CollectionOutcome)` - The run completed; per-domain failures are in the summary
    /// * `Err(HarvestError)` - The run directory or summary could not be written
    pub async fn collect(
        &mut self,
        domains: &[String],
        hours_ago: u32,
        debug: bool,
    ) -> Result<CollectionOutcome, HarvestError> {
        let result = self.collect_at(domains, hours_ago, debug, Utc::now()).await;

        if let Err(e) = self.session.stop().await {
            tracing::warn!("Failed to stop browser session: {}", e);
        }

        result
    }

    async fn collect_at(
        &mut self,
        domains: &[String],
        hours_ago: u32,
        debug: bool,
        now: DateTime<Utc>,
    ) -> Result<CollectionOutcome, HarvestError> {
        let layout = RunLayout::create(Path::new(&self.config.output.posts_dir), now)?;
        let after = format_after(now, hours_ago);
        let driver = FetchDriver::new(DriverSettings::from_config(&self.config, debug));

        tracing::info!(
            "Collecting posts after {} from {} domains into {}",
            after,
            domains.len(),
            layout.run_dir.display()
        );
        if debug {
            tracing::info!(
                "Debug mode: saving every page to {}",
                self.config.output.debug_dir
            );
        }

        let collector_config = self.config.collector.clone();
        let mut run = CollectionRun::new(domains, &collector_config, after, &layout);
        let mut worklist = run.initial_worklist();
        let mut pages_processed = driver
            .run(&mut self.session, &mut worklist, |event| run.handle_event(event))
            .await;

        let candidates = run.domains_needing_diagnosis();
        let site_notes = if candidates.is_empty() {
            SiteNotes::new()
        } else {
            let (notes, probed) = self.diagnose(&driver, &candidates, hours_ago).await;
            pages_processed += probed;
            notes
        };

        let summary = run.summary(&layout, hours_ago);
        if !site_notes.is_empty() {
            write_json_atomic(&layout.site_notes_path(), &site_notes)?;
        }
        write_json_atomic(&layout.summary_path(), &summary)?;

        tracing::info!(
            "Collection complete: {} articles from {} domains",
            summary.total_articles(),
            summary.results.len()
        );

        Ok(CollectionOutcome {
            summary,
            site_notes,
            run_dir: layout.run_dir,
            pages_processed,
        })
    }

    /// Probes the latest posts of each candidate without a time window
    async fn diagnose(
        &mut self,
        driver: &FetchDriver,
        candidates: &[String],
        hours_ago: u32,
    ) -> (SiteNotes, usize) {
        tracing::info!(
            "Testing {} sites with unfiltered JSON requests",
            candidates.len()
        );

        let query = PostsQuery::latest(self.config.collector.probe_page_size);
        let mut observed = SiteNotes::new();
        let mut probes = Worklist::new();
        for domain in candidates {
            match build_posts_url(domain, &query) {
                Ok(url) => probes.push(WorkItem::new(url, domain.clone(), 1)),
                Err(e) => {
                    observed.insert(domain.clone(), SiteNote::failed(e.to_string()));
                }
            }
        }

        let probed = driver
            .run(&mut self.session, &mut probes, |event| {
                let note = match &event {
                    FetchEvent::Success { data, .. } => SiteNote::answered(data, hours_ago),
                    FetchEvent::Error { error, .. } => SiteNote::failed(error.to_string()),
                };
                observed.insert(event.item().domain.clone(), note);
                Vec::new()
            })
            .await;

        let notes = candidates
            .iter()
            .map(|domain| {
                let note = observed
                    .remove(domain)
                    .unwrap_or_else(SiteNote::incomplete);
                (domain.clone(), note)
            })
            .collect();

        (notes, probed)
    }
}

/// Mutable state of the paginated collection pass
struct CollectionRun<'a> {
    order: Vec<String>,
    states: HashMap<String, DomainState>,
    collector: &'a CollectorConfig,
    after: String,
    layout: &'a RunLayout,
}

impl<'a> CollectionRun<'a> {
    fn new(
        domains: &[String],
        collector: &'a CollectorConfig,
        after: String,
        layout: &'a RunLayout,
    ) -> Self {
        let states = domains
            .iter()
            .map(|d| (d.clone(), DomainState::new()))
            .collect();

        Self {
            order: domains.to_vec(),
            states,
            collector,
            after,
            layout,
        }
    }

    fn page_item(&self, domain: &str, page: u32) -> Result<WorkItem, HarvestError> {
        let query = PostsQuery::window(&self.after, page, self.collector.page_size);
        let url = build_posts_url(domain, &query)?;
        Ok(WorkItem::new(url, domain, page))
    }

    /// Page 1 of every domain, in order
    fn initial_worklist(&mut self) -> Worklist {
        let mut worklist = Worklist::new();
        for domain in self.order.clone() {
            match self.page_item(&domain, 1) {
                Ok(item) => worklist.push(item),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", domain, e);
                    self.mark_error(&domain, e.to_string());
                }
            }
        }
        worklist
    }

    fn handle_event(&mut self, event: FetchEvent) -> Vec<WorkItem> {
        match event {
            FetchEvent::Success { item, data, .. } => self.on_page(item, data),
            FetchEvent::Error { item, error, .. } => {
                tracing::warn!(
                    "Error fetching {} (page {}): {}",
                    item.domain,
                    item.page_number,
                    error
                );
                self.mark_error(&item.domain, error.to_string());
                Vec::new()
            }
        }
    }

    fn on_page(&mut self, item: WorkItem, data: Value) -> Vec<WorkItem> {
        let posts = match data {
            Value::Array(posts) => posts,
            other => {
                let error = HarvestError::UnexpectedShape {
                    url: item.url.clone(),
                    message: format!("expected an array of posts, got {}", json_kind(&other)),
                };
                tracing::warn!("{}", error);
                self.mark_error(&item.domain, error.to_string());
                return Vec::new();
            }
        };

        if let Some(stray) = posts.iter().find(|post| !post.is_object()) {
            let error = HarvestError::UnexpectedShape {
                url: item.url.clone(),
                message: format!("expected post objects, got {}", json_kind(stray)),
            };
            tracing::warn!("{}", error);
            self.mark_error(&item.domain, error.to_string());
            return Vec::new();
        }

        let Some(state) = self.states.get_mut(&item.domain) else {
            tracing::warn!("Ignoring page for unknown domain {}", item.domain);
            return Vec::new();
        };

        let outcome = state.absorb_page(item.page_number, posts);
        tracing::info!(
            "{} page {}: {} new, {} duplicate, {} total",
            item.domain,
            item.page_number,
            outcome.new_count,
            outcome.duplicate_count,
            state.article_count()
        );
        if outcome.unidentified_count > 0 {
            tracing::debug!(
                "{} page {}: dropped {} posts without an id",
                item.domain,
                item.page_number,
                outcome.unidentified_count
            );
        }

        if !state.posts.is_empty() {
            let path = self.layout.domain_file(&item.domain);
            if let Err(e) = write_json_atomic(&path, &state.posts) {
                tracing::warn!("Failed to save posts for {}: {}", item.domain, e);
                state.mark_error(e.to_string());
                return Vec::new();
            }
        }

        if !outcome.warrants_next_page(self.collector.page_size, self.collector.max_pages) {
            return Vec::new();
        }

        match self.page_item(&item.domain, item.page_number + 1) {
            Ok(next) => {
                tracing::debug!("Queueing page {} of {}", next.page_number, next.domain);
                vec![next]
            }
            Err(e) => {
                self.mark_error(&item.domain, e.to_string());
                Vec::new()
            }
        }
    }

    fn mark_error(&mut self, domain: &str, message: String) {
        self.states
            .entry(domain.to_string())
            .or_default()
            .mark_error(message);
    }

    fn domains_needing_diagnosis(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|d| self.states.get(*d).map_or(false, DomainState::needs_diagnosis))
            .cloned()
            .collect()
    }

    fn summary(&self, layout: &RunLayout, hours_ago: u32) -> CollectionSummary {
        let results = self
            .order
            .iter()
            .map(|domain| {
                let state = self.states.get(domain).cloned().unwrap_or_default();
                domain_result(domain, &state, layout)
            })
            .collect();

        CollectionSummary {
            collection_timestamp: layout.timestamp.to_string(),
            collection_date: layout.date.clone(),
            hours_ago,
            after: self.after.clone(),
            results,
        }
    }
}

fn domain_result(domain: &str, state: &DomainState, layout: &RunLayout) -> DomainResult {
    if state.posts.is_empty() {
        return DomainResult {
            domain: domain.to_string(),
            status: state.status,
            article_count: 0,
            pages_fetched: state.pages_fetched,
            error_message: Some(
                state
                    .error_message
                    .clone()
                    .unwrap_or_else(|| NO_ARTICLES_MESSAGE.to_string()),
            ),
            file_path: None,
        };
    }

    let path = layout.domain_file(domain);
    DomainResult {
        domain: domain.to_string(),
        status: DomainStatus::Success,
        article_count: state.article_count(),
        pages_fetched: state.pages_fetched,
        error_message: state.error_message.clone(),
        file_path: path.exists().then(|| path.display().to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Loads the domains file and runs one collection with the configured backend
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `domains_file` - Newline-separated list of domains
/// * `hours_ago` - Width of the lookback window
/// * `debug` - Save the content of every page
pub async fn collect(
    config: Config,
    domains_file: &Path,
    hours_ago: u32,
    debug: bool,
) -> Result<CollectionOutcome, HarvestError> {
    let domains = load_domains(domains_file)?;

    match config.browser.backend {
        BrowserBackend::Http => {
            let session = HttpSession::new(&config.browser)?;
            let mut collector = Collector::new(config, session);
            collector.collect(&domains, hours_ago, debug).await
        }
        BrowserBackend::Browserless => {
            let session = BrowserlessSession::new(&config.browser)?;
            let mut collector = Collector::new(config, session);
            collector.collect(&domains, hours_ago, debug).await
        }
    }
}

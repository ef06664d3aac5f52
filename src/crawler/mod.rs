//! Crawler module for collecting posts from WordPress sites
//!
//! This module contains the core collection logic, including:
//! - Browser sessions that load API pages (plain HTTP or Browserless)
//! - Extraction of JSON payloads from rendered page content
//! - The sequential fetch driver with its growing worklist
//! - Orchestration of pagination, deduplication and the diagnostic pass

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{collect, CollectionOutcome, Collector};
pub use fetcher::{
    build_http_client, document_matches, BrowserSession, BrowserTab, BrowserlessSession,
    BrowserlessTab, FetchError, HttpSession, HttpTab,
};
pub use parser::{extract_json, ExtractionError};
pub use scheduler::{
    save_debug_page, DelayRange, DriverSettings, FetchDriver, FetchEvent, WorkItem, Worklist,
};

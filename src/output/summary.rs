//! Records written alongside collected and normalized data

use crate::state::DomainStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the per-run collection summary
pub const COLLECTION_SUMMARY_FILE: &str = "_collection_summary.json";

/// File name of the normalization summary
pub const NORMALIZATION_SUMMARY_FILE: &str = "_normalization_summary.json";

/// File name of the diagnostic notes for domains that produced no posts
pub const SITE_NOTES_FILE: &str = "wordpress-site-notes.json";

/// Source tag recorded on every normalized article
pub const SOURCE_NAME: &str = "wordpress";

/// Summary of one collection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Unix seconds at run start, as a decimal string
    pub collection_timestamp: String,

    /// Local date of the run, `YYYY-MM-DD`
    pub collection_date: String,

    /// Width of the lookback window
    pub hours_ago: u32,

    /// The `after` bound sent with every windowed query
    pub after: String,

    /// One entry per domain, in domains-file order
    pub results: Vec<DomainResult>,
}

impl CollectionSummary {
    pub fn total_articles(&self) -> usize {
        self.results.iter().map(|r| r.article_count).sum()
    }

    pub fn successful_domains(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == DomainStatus::Success)
            .count()
    }
}

/// Collection result for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainResult {
    pub domain: String,
    pub status: DomainStatus,
    pub article_count: usize,
    pub pages_fetched: u32,
    pub error_message: Option<String>,
    /// Per-domain posts file, present when posts were stored
    pub file_path: Option<String>,
}

/// Diagnostic finding for a domain that returned nothing in the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteNote {
    /// `None` when the probe never ran
    pub has_json_api: Option<bool>,
    pub articles_found: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub note: String,
}

impl SiteNote {
    /// The unfiltered probe answered; `payload` is what it returned
    pub fn answered(payload: &serde_json::Value, hours_ago: u32) -> Self {
        Self {
            has_json_api: Some(true),
            articles_found: payload.as_array().map_or(0, Vec::len),
            error: None,
            note: format!(
                "Site has JSON API but returned no articles in the {}h timeframe",
                hours_ago
            ),
        }
    }

    /// The unfiltered probe failed
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            has_json_api: Some(false),
            articles_found: 0,
            error: Some(error.into()),
            note: "Site does not provide JSON API or has access restrictions".to_string(),
        }
    }

    /// No probe result was recorded
    pub fn incomplete() -> Self {
        Self {
            has_json_api: None,
            articles_found: 0,
            error: None,
            note: "Test was not completed".to_string(),
        }
    }
}

/// Site notes keyed by domain
pub type SiteNotes = BTreeMap<String, SiteNote>;

/// Counters of one normalization pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub files_processed: usize,
    pub articles_new: usize,
    pub articles_skipped: usize,
    pub errors: usize,
    pub error_messages: Vec<String>,
}

impl NormalizationStats {
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors += 1;
        self.error_messages.push(message.into());
    }
}

/// Summary file written after a normalization pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationSummary {
    /// UTC ISO-8601 time the pass finished
    pub timestamp: String,
    pub source: String,
    pub statistics: NormalizationStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_site_note_answered() {
        let note = SiteNote::answered(&json!([{"id": 1}, {"id": 2}]), 48);
        assert_eq!(note.has_json_api, Some(true));
        assert_eq!(note.articles_found, 2);
        assert!(note.note.contains("48h"));

        let object = SiteNote::answered(&json!({"code": "rest_forbidden"}), 24);
        assert_eq!(object.articles_found, 0);
    }

    #[test]
    fn test_site_note_serialization() {
        let failed = serde_json::to_value(SiteNote::failed("HTTP 403")).unwrap();
        assert_eq!(failed["has_json_api"], json!(false));
        assert_eq!(failed["error"], json!("HTTP 403"));

        let incomplete = serde_json::to_value(SiteNote::incomplete()).unwrap();
        assert_eq!(incomplete["has_json_api"], json!(null));
        assert!(incomplete.get("error").is_none());
    }

    #[test]
    fn test_domain_result_serialization() {
        let result = DomainResult {
            domain: "example.com".to_string(),
            status: DomainStatus::Error,
            article_count: 0,
            pages_fetched: 0,
            error_message: Some("Connection refused".to_string()),
            file_path: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], json!("error"));
        assert_eq!(value["file_path"], json!(null));
    }

    #[test]
    fn test_summary_totals() {
        let result = |status, count| DomainResult {
            domain: "d".to_string(),
            status,
            article_count: count,
            pages_fetched: 1,
            error_message: None,
            file_path: None,
        };
        let summary = CollectionSummary {
            collection_timestamp: "1714740000".to_string(),
            collection_date: "2024-05-03".to_string(),
            hours_ago: 48,
            after: "2024-05-01T12:40:00Z".to_string(),
            results: vec![
                result(DomainStatus::Success, 5),
                result(DomainStatus::Error, 0),
                result(DomainStatus::Success, 2),
            ],
        };
        assert_eq!(summary.total_articles(), 7);
        assert_eq!(summary.successful_domains(), 2);
    }
}

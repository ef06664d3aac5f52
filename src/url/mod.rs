//! URL handling module for wp-harvest
//!
//! This module builds WordPress REST API query URLs, derives filesystem-safe
//! names from domains and URLs, and extracts the network location of article links.

mod domain;

use crate::{UrlError, UrlResult};
use chrono::{DateTime, Duration, Utc};
use url::Url;

pub use domain::extract_domain;

/// Path of the posts collection below a WordPress site root
pub const POSTS_ENDPOINT: &str = "wp-json/wp/v2/posts";

/// Sort direction for the `order` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Query parameters for one request against the posts endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsQuery {
    /// Only posts published after this ISO-8601 instant
    pub after: Option<String>,
    pub page: u32,
    pub per_page: u32,
    pub order: SortOrder,
}

impl PostsQuery {
    /// A windowed query, oldest first, as used by the collection pass
    pub fn window(after: &str, page: u32, per_page: u32) -> Self {
        Self {
            after: Some(after.to_string()),
            page,
            per_page,
            order: SortOrder::Asc,
        }
    }

    /// An unfiltered query for the most recent posts, as used by the diagnostic probe
    pub fn latest(per_page: u32) -> Self {
        Self {
            after: None,
            page: 1,
            per_page,
            order: SortOrder::Desc,
        }
    }
}

/// Returns the site root for a domains-file entry
///
/// Bare hosts are served over HTTPS. Entries that already carry an
/// `http://` or `https://` scheme are kept as given, which also covers
/// WordPress installs living under a subdirectory.
pub fn site_base_url(domain: &str) -> UrlResult<String> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(UrlError::EmptyDomain);
    }

    let base = if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    };

    Ok(base.trim_end_matches('/').to_string())
}

/// Builds the full posts URL for a domain and query
///
/// # Examples
///
/// ```
/// use wp_harvest::url::{build_posts_url, PostsQuery};
///
/// let url = build_posts_url("example.com", &PostsQuery::latest(10)).unwrap();
/// assert_eq!(
///     url,
///     "https://example.com/wp-json/wp/v2/posts?page=1&per_page=10&orderby=date&order=desc"
/// );
/// ```
pub fn build_posts_url(domain: &str, query: &PostsQuery) -> UrlResult<String> {
    let endpoint = format!("{}/{}", site_base_url(domain)?, POSTS_ENDPOINT);
    let mut url = Url::parse(&endpoint).map_err(|source| UrlError::Parse {
        url: endpoint.clone(),
        source,
    })?;

    {
        let mut pairs = url.query_pairs_mut();
        if let Some(after) = &query.after {
            pairs.append_pair("after", after);
        }
        pairs
            .append_pair("page", &query.page.to_string())
            .append_pair("per_page", &query.per_page.to_string())
            .append_pair("orderby", "date")
            .append_pair("order", query.order.as_str());
    }

    Ok(url.to_string())
}

/// Formats the `after` bound: `now - hours_ago`, UTC, seconds precision, `Z` suffix
pub fn format_after(now: DateTime<Utc>, hours_ago: u32) -> String {
    (now - Duration::hours(i64::from(hours_ago)))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

/// Replaces `.`, `/` and `:` with `_` to derive a filesystem-safe name
pub fn sanitize_filename(text: &str) -> String {
    text.replace(['.', '/', ':'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_query_url() {
        let query = PostsQuery::window("2024-05-01T12:00:00Z", 3, 100);
        let url = build_posts_url("news.example.com", &query).unwrap();
        assert_eq!(
            url,
            "https://news.example.com/wp-json/wp/v2/posts?after=2024-05-01T12%3A00%3A00Z&page=3&per_page=100&orderby=date&order=asc"
        );
    }

    #[test]
    fn test_latest_query_has_no_after() {
        let url = build_posts_url("example.com", &PostsQuery::latest(10)).unwrap();
        assert!(!url.contains("after="));
        assert!(url.contains("order=desc"));
        assert!(url.contains("per_page=10"));
    }

    #[test]
    fn test_site_base_url_variants() {
        assert_eq!(site_base_url("example.com").unwrap(), "https://example.com");
        assert_eq!(site_base_url("  example.com/ ").unwrap(), "https://example.com");
        assert_eq!(
            site_base_url("http://127.0.0.1:8080/blog/").unwrap(),
            "http://127.0.0.1:8080/blog"
        );
        assert!(matches!(site_base_url("   "), Err(UrlError::EmptyDomain)));
    }

    #[test]
    fn test_subdirectory_install() {
        let url = build_posts_url("https://example.com/news", &PostsQuery::latest(5)).unwrap();
        assert!(url.starts_with("https://example.com/news/wp-json/wp/v2/posts?"));
    }

    #[test]
    fn test_format_after() {
        let now = Utc.with_ymd_and_hms(2024, 5, 3, 12, 30, 45).unwrap();
        assert_eq!(format_after(now, 48), "2024-05-01T12:30:45Z");
        assert_eq!(format_after(now, 0), "2024-05-03T12:30:45Z");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("news.example.com"), "news_example_com");
        assert_eq!(
            sanitize_filename("https://a.com/x?y=1"),
            "https___a_com_x?y=1"
        );
        assert_eq!(sanitize_filename("plain"), "plain");
    }

    #[test]
    fn test_sort_order_strings() {
        assert_eq!(SortOrder::Asc.as_str(), "asc");
        assert_eq!(SortOrder::Desc.as_str(), "desc");
    }
}

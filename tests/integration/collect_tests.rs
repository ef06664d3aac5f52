//! End-to-end collection runs against mock WordPress sites

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wp_harvest::config::Config;
use wp_harvest::crawler::{Collector, HttpSession};
use wp_harvest::DomainStatus;

const POSTS_PATH: &str = "/wp-json/wp/v2/posts";

/// Creates a test configuration writing below `root`, with no pauses
pub fn create_test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.collector.wait_after_load_ms = 0;
    config.collector.delay_min_ms = 0;
    config.collector.delay_max_ms = 0;
    config.browser.request_timeout_secs = 5;
    config.output.posts_dir = root.join("wordpress_posts").display().to_string();
    config.output.debug_dir = root.join("debug_pages").display().to_string();
    config.output.normalized_dir = root.join("normalized").display().to_string();
    config
}

pub fn make_posts(host: &str, ids: std::ops::RangeInclusive<u64>) -> Value {
    let posts: Vec<Value> = ids
        .map(|id| {
            json!({
                "id": id,
                "date_gmt": "2024-05-02T08:30:00",
                "link": format!("https://{}/posts/{}/", host, id),
                "type": "post",
                "title": {"rendered": format!("Story {}", id)},
                "content": {"rendered": format!("<h2>Lead</h2><p>Body of story {}.</p>", id)},
                "excerpt": {"rendered": "<p>Summary</p>"},
            })
        })
        .collect();
    Value::Array(posts)
}

/// Mounts a busy site: 100 posts on page 1, 40 on page 2
pub async fn mount_busy_site(server: &MockServer, host: &str) {
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("order", "asc"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(make_posts(host, 1..=100)))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("order", "asc"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(make_posts(host, 101..=140)))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(server)
        .await;
}

/// Mounts a quiet site: nothing in the window, three posts when unfiltered
pub async fn mount_quiet_site(server: &MockServer, host: &str) {
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("order", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("order", "desc"))
        .and(query_param("per_page", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(make_posts(host, 900..=902)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_collect_two_domains() {
    let dir = TempDir::new().unwrap();
    let busy = MockServer::start().await;
    let quiet = MockServer::start().await;
    mount_busy_site(&busy, "busy.example").await;
    mount_quiet_site(&quiet, "quiet.example").await;

    let config = create_test_config(dir.path());
    let session = HttpSession::new(&config.browser).unwrap();
    let domains = vec![busy.uri(), quiet.uri()];

    let outcome = Collector::new(config, session)
        .collect(&domains, 48, false)
        .await
        .unwrap();

    let results = &outcome.summary.results;
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].domain, busy.uri());
    assert_eq!(results[0].status, DomainStatus::Success);
    assert_eq!(results[0].article_count, 140);
    assert_eq!(results[0].pages_fetched, 2);
    assert!(results[0].error_message.is_none());

    assert_eq!(results[1].domain, quiet.uri());
    assert_eq!(results[1].article_count, 0);
    assert_eq!(
        results[1].error_message.as_deref(),
        Some("No articles found in timeframe")
    );

    let note = &outcome.site_notes[&quiet.uri()];
    assert_eq!(note.has_json_api, Some(true));
    assert_eq!(note.articles_found, 3);
    assert!(note.note.contains("48h"));

    // Posts are stored in arrival order, exactly as received.
    let file = results[0].file_path.as_ref().unwrap();
    let stored: Vec<Value> = serde_json::from_str(&fs::read_to_string(file).unwrap()).unwrap();
    assert_eq!(stored.len(), 140);
    assert_eq!(stored[0]["id"], 1);
    assert_eq!(stored[139]["id"], 140);
    assert_eq!(stored[0]["title"]["rendered"], "Story 1");

    let summary: Value = serde_json::from_str(
        &fs::read_to_string(outcome.run_dir.join("_collection_summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["hours_ago"], 48);
    assert!(summary["collection_timestamp"].is_string());

    let notes: Value = serde_json::from_str(
        &fs::read_to_string(outcome.run_dir.join("wordpress-site-notes.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(notes[quiet.uri()]["has_json_api"], true);
}

#[tokio::test]
async fn test_collect_from_domains_file() {
    let dir = TempDir::new().unwrap();
    let blocked = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(
            ResponseTemplate::new(403).set_body_string("<html><body>Forbidden</body></html>"),
        )
        .mount(&blocked)
        .await;

    let domains_file = dir.path().join("wordpress.txt");
    fs::write(
        &domains_file,
        format!("# sites\n{}\n\n{}\n", blocked.uri(), blocked.uri()),
    )
    .unwrap();

    let outcome = wp_harvest::collect(create_test_config(dir.path()), &domains_file, 24, false)
        .await
        .unwrap();

    let results = &outcome.summary.results;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, DomainStatus::Error);
    assert!(results[0].error_message.as_deref().unwrap().contains("403"));
    assert!(outcome.site_notes.is_empty());
    assert_eq!(outcome.summary.after.len(), "2024-05-01T12:00:00Z".len());
}

#[tokio::test]
async fn test_missing_domains_file() {
    let dir = TempDir::new().unwrap();
    let result = wp_harvest::collect(
        create_test_config(dir.path()),
        &dir.path().join("absent.txt"),
        48,
        false,
    )
    .await;

    assert!(matches!(
        result,
        Err(wp_harvest::HarvestError::DomainsFile { .. })
    ));
}

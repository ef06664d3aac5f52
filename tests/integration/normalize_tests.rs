//! Collection followed by normalization

use crate::collect_tests::{create_test_config, mount_busy_site, mount_quiet_site};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::MockServer;
use wp_harvest::crawler::{Collector, HttpSession};
use wp_harvest::normalize::url_hash;
use wp_harvest::output::find_latest_collection_dir;

#[tokio::test]
async fn test_collect_then_normalize_twice() {
    let dir = TempDir::new().unwrap();
    let busy = MockServer::start().await;
    let quiet = MockServer::start().await;
    mount_busy_site(&busy, "busy.example").await;
    mount_quiet_site(&quiet, "quiet.example").await;

    let config = create_test_config(dir.path());
    let posts_dir = config.output.posts_dir.clone();
    let output_dir = dir.path().join("normalized");
    let session = HttpSession::new(&config.browser).unwrap();

    let outcome = Collector::new(config, session)
        .collect(&[busy.uri(), quiet.uri()], 48, false)
        .await
        .unwrap();

    let latest = find_latest_collection_dir(Path::new(&posts_dir)).unwrap().unwrap();
    assert_eq!(latest, outcome.run_dir);

    let first = wp_harvest::process_directory(&latest, &output_dir).unwrap();
    assert_eq!(first.files_processed, 1);
    assert_eq!(first.articles_new, 140);
    assert_eq!(first.articles_skipped, 0);
    assert_eq!(first.errors, 0);

    let article_file = output_dir
        .join("busy.example")
        .join(format!("{}.json", url_hash("https://busy.example/posts/7/")));
    let before = fs::read_to_string(&article_file).unwrap();
    let article: Value = serde_json::from_str(&before).unwrap();
    assert_eq!(article["title"], "Story 7");
    assert_eq!(article["source_domain"], "busy.example");
    assert_eq!(article["publication_date"], "2024-05-02T08:30:00Z");
    assert_eq!(article["metadata"]["source_post_id"], 7);
    assert_eq!(
        article["first_seen_timestamp_gmt"].as_i64().unwrap().to_string(),
        outcome.summary.collection_timestamp
    );
    assert!(article["article_text"]
        .as_str()
        .unwrap()
        .starts_with("## Lead"));

    let second = wp_harvest::process_directory(&latest, &output_dir).unwrap();
    assert_eq!(second.articles_new, 0);
    assert_eq!(second.articles_skipped, first.articles_new);
    assert_eq!(fs::read_to_string(&article_file).unwrap(), before);

    let summary: Value = serde_json::from_str(
        &fs::read_to_string(latest.join("_normalization_summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["source"], "wordpress");
    assert_eq!(summary["statistics"]["articles_skipped"], 140);
}

//! Normalization of a whole collection run directory

use crate::normalize::normalizer::normalize_post;
use crate::normalize::NormalizedArticle;
use crate::output::{
    to_pretty_json, write_json_atomic, NormalizationStats, NormalizationSummary,
    COLLECTION_SUMMARY_FILE, NORMALIZATION_SUMMARY_FILE, SITE_NOTES_FILE, SOURCE_NAME,
};
use crate::HarvestError;
use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Files in a run directory that are not per-domain posts
const RESERVED_FILES: [&str; 3] = [
    COLLECTION_SUMMARY_FILE,
    NORMALIZATION_SUMMARY_FILE,
    SITE_NOTES_FILE,
];

/// Where a normalized article is written
#[derive(Debug, PartialEq, Eq)]
enum WriteOutcome {
    Created,
    AlreadyPresent,
}

/// Hex MD5 of a URL, the identity of a normalized article
pub fn url_hash(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// Path of an article: `{output_dir}/{source_domain}/{md5(url)}.json`
pub fn article_path(output_dir: &Path, article: &NormalizedArticle) -> PathBuf {
    output_dir
        .join(&article.source_domain)
        .join(format!("{}.json", url_hash(&article.url)))
}

/// Reads `collection_timestamp` from a run's summary file
///
/// The collector writes it as a decimal string; a bare number is accepted too.
pub fn read_collection_timestamp(source_dir: &Path) -> Result<i64, HarvestError> {
    let path = source_dir.join(COLLECTION_SUMMARY_FILE);
    if !path.is_file() {
        return Err(HarvestError::SummaryMissing {
            dir: source_dir.to_path_buf(),
        });
    }

    let summary: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let malformed = |message: &str| HarvestError::MalformedInput {
        file: COLLECTION_SUMMARY_FILE.to_string(),
        message: message.to_string(),
    };

    match summary.get("collection_timestamp") {
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| malformed("collection_timestamp is not an integer")),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| malformed("collection_timestamp is not an integer")),
        _ => Err(malformed("collection_timestamp is missing")),
    }
}

/// Lists the per-domain posts files of a run directory, sorted by name
fn posts_files(source_dir: &Path) -> Result<Vec<PathBuf>, HarvestError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(source_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.ends_with(".json") && !RESERVED_FILES.contains(&name) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Writes an article unless a file for its URL already exists
fn write_article(output_dir: &Path, article: &NormalizedArticle) -> Result<WriteOutcome, HarvestError> {
    let path = article_path(output_dir, article);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let bytes = to_pretty_json(article)?;
    Ok(publish_new(&path, &bytes)?)
}

/// Publishes `bytes` at `path` only if nothing is there yet
///
/// The content is written in full to a sibling temp file and then hard-linked
/// into place, so `path` either holds the whole article or does not exist.
fn publish_new(path: &Path, bytes: &[u8]) -> io::Result<WriteOutcome> {
    if path.exists() {
        return Ok(WriteOutcome::AlreadyPresent);
    }

    let tmp_path = path.with_extension("json.tmp");
    let linked = fs::write(&tmp_path, bytes).and_then(|()| fs::hard_link(&tmp_path, path));
    let _ = fs::remove_file(&tmp_path);

    match linked {
        Ok(()) => Ok(WriteOutcome::Created),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(WriteOutcome::AlreadyPresent),
        Err(e) => Err(e),
    }
}

/// Normalizes every posts file of one collection run
///
/// Articles land in `output_dir` keyed by URL hash; an article that already
/// has a file is counted as skipped and left untouched, so re-running over
/// the same directory is harmless. Per-file and per-article problems are
/// recorded in the returned statistics and do not stop the pass. The
/// statistics are also written to `_normalization_summary.json` in
/// `source_dir`.
///
/// # Arguments
///
/// * `source_dir` - A run directory produced by the collector
/// * `output_dir` - Root of the normalized article store
///
/// # Returns
///
/// * `Ok(NormalizationStats)` - The pass ran
/// * `Err(HarvestError)` - The source directory or its summary is missing
pub fn process_directory(
    source_dir: &Path,
    output_dir: &Path,
) -> Result<NormalizationStats, HarvestError> {
    if !source_dir.is_dir() {
        return Err(HarvestError::SourceMissing {
            path: source_dir.to_path_buf(),
        });
    }
    let collection_timestamp = read_collection_timestamp(source_dir)?;
    fs::create_dir_all(output_dir)?;

    let mut stats = NormalizationStats::default();

    for path in posts_files(source_dir)? {
        stats.files_processed += 1;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let posts = match load_posts(&path, &file_name) {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!("{}", e);
                stats.record_error(e.to_string());
                continue;
            }
        };
        tracing::debug!("Normalizing {} posts from {}", posts.len(), file_name);

        for raw in &posts {
            if !raw.is_object() {
                let preview: String = raw.to_string().chars().take(150).collect();
                let error = HarvestError::MalformedInput {
                    file: file_name.clone(),
                    message: format!("item is not an object: {}", preview),
                };
                stats.record_error(error.to_string());
                continue;
            }

            let article = match normalize_post(raw, collection_timestamp) {
                Ok(article) => article,
                Err(e) => {
                    tracing::debug!("{}", e);
                    stats.record_error(e.to_string());
                    continue;
                }
            };

            match write_article(output_dir, &article) {
                Ok(WriteOutcome::Created) => stats.articles_new += 1,
                Ok(WriteOutcome::AlreadyPresent) => stats.articles_skipped += 1,
                Err(e) => stats.record_error(format!(
                    "Error writing file for article {}: {}",
                    article.url, e
                )),
            }
        }
    }

    let summary = NormalizationSummary {
        timestamp: Utc::now().to_rfc3339(),
        source: SOURCE_NAME.to_string(),
        statistics: stats.clone(),
    };
    write_json_atomic(&source_dir.join(NORMALIZATION_SUMMARY_FILE), &summary)?;

    tracing::info!(
        "Normalization complete: {} new, {} skipped, {} errors",
        stats.articles_new,
        stats.articles_skipped,
        stats.errors
    );

    Ok(stats)
}

fn load_posts(path: &Path, file_name: &str) -> Result<Vec<Value>, HarvestError> {
    let malformed = |message: String| HarvestError::MalformedInput {
        file: file_name.to_string(),
        message,
    };

    let text = fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(posts)) => Ok(posts),
        Ok(_) => Err(malformed("JSON root is not a list of articles".to_string())),
        Err(e) => Err(malformed(format!("invalid JSON: {}", e))),
    }
}

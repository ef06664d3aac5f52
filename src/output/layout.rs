use crate::output::summary::{COLLECTION_SUMMARY_FILE, SITE_NOTES_FILE};
use crate::url::sanitize_filename;
use chrono::{DateTime, Local, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory layout of one collection run
///
/// Runs live under `{posts_dir}/{YYYY-MM-DD}/{unix_timestamp}/`, the date
/// being local time at run start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub run_dir: PathBuf,
    pub date: String,
    pub timestamp: i64,
}

impl RunLayout {
    /// Computes the layout for a run starting at `now` without touching disk
    pub fn plan(posts_dir: &Path, now: DateTime<Utc>) -> Self {
        let date = now.with_timezone(&Local).format("%Y-%m-%d").to_string();
        let timestamp = now.timestamp();
        let run_dir = posts_dir.join(&date).join(timestamp.to_string());
        Self {
            run_dir,
            date,
            timestamp,
        }
    }

    /// Computes the layout and creates the run directory
    ///
    /// Fails with `AlreadyExists` if a run with the same timestamp already
    /// owns the directory.
    pub fn create(posts_dir: &Path, now: DateTime<Utc>) -> io::Result<Self> {
        let layout = Self::plan(posts_dir, now);
        if let Some(date_dir) = layout.run_dir.parent() {
            fs::create_dir_all(date_dir)?;
        }
        fs::create_dir(&layout.run_dir)?;
        Ok(layout)
    }

    /// Posts file of a domain: `{sanitized domain}.json`
    pub fn domain_file(&self, domain: &str) -> PathBuf {
        self.run_dir.join(format!("{}.json", sanitize_filename(domain)))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.run_dir.join(COLLECTION_SUMMARY_FILE)
    }

    pub fn site_notes_path(&self) -> PathBuf {
        self.run_dir.join(SITE_NOTES_FILE)
    }
}

/// Finds the most recent run directory below `posts_dir`
///
/// Picks the greatest date directory, then the greatest timestamp directory
/// inside it. Returns `None` if either level is empty.
pub fn find_latest_collection_dir(posts_dir: &Path) -> io::Result<Option<PathBuf>> {
    if !posts_dir.is_dir() {
        return Ok(None);
    }

    let Some(date_dir) = latest_subdir(posts_dir)? else {
        return Ok(None);
    };
    latest_subdir(&date_dir)
}

fn latest_subdir(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut latest: Option<PathBuf> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if latest.as_ref().map_or(true, |best| path.file_name() > best.file_name()) {
            latest = Some(path);
        }
    }
    Ok(latest)
}

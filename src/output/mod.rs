//! Output module for collected posts, summaries and reports
//!
//! This module handles:
//! - The on-disk layout of collection runs
//! - Summary and diagnostic records written next to the data
//! - Writing JSON files (pretty-printed, UTF-8, written atomically)
//! - Printing run statistics to the console

mod layout;
pub mod stats;
mod summary;

pub use layout::{find_latest_collection_dir, RunLayout};
pub use stats::{print_collection_summary, print_normalization_stats};
pub use summary::{
    CollectionSummary, DomainResult, NormalizationStats, NormalizationSummary, SiteNote,
    SiteNotes, COLLECTION_SUMMARY_FILE, NORMALIZATION_SUMMARY_FILE, SITE_NOTES_FILE, SOURCE_NAME,
};

use crate::HarvestError;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes `value` as pretty-printed JSON with two-space indentation
///
/// Non-ASCII characters are written as-is rather than escaped.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HarvestError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Writes `value` to `path`, replacing any previous file in one step
///
/// The JSON goes to a sibling `.tmp` file first and is then renamed over the
/// target, so readers never observe a half-written file.
///
/// # Arguments
///
/// * `path` - Destination file
/// * `value` - Anything serializable
///
/// # Returns
///
/// * `Ok(())` - The file is in place
/// * `Err(HarvestError)` - Serialization or IO failed
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), HarvestError> {
    let bytes = to_pretty_json(value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    fs::write(tmp_path, &bytes)?;
    if let Err(e) = fs::rename(tmp_path, path) {
        let _ = fs::remove_file(tmp_path);
        return Err(e.into());
    }

    Ok(())
}

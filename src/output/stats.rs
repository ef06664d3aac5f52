//! Console reports for collection and normalization runs

use crate::output::summary::{CollectionSummary, NormalizationStats, SiteNotes};
use crate::state::DomainStatus;
use std::path::Path;

/// Prints the outcome of a collection run to stdout
///
/// # Arguments
///
/// * `summary` - The run summary
/// * `site_notes` - Diagnostic notes for domains that returned nothing
/// * `run_dir` - Where the run was written
pub fn print_collection_summary(summary: &CollectionSummary, site_notes: &SiteNotes, run_dir: &Path) {
    println!("=== Collection Summary ===\n");

    println!("Overview:");
    println!("  Window: posts after {} ({}h)", summary.after, summary.hours_ago);
    println!("  Domains: {}", summary.results.len());
    println!("  Successful domains: {}", summary.successful_domains());
    println!("  Total articles: {}", summary.total_articles());
    println!("  Output: {}", run_dir.display());
    println!();

    println!("Domains:");
    for result in &summary.results {
        match (&result.status, &result.error_message) {
            (DomainStatus::Success, None) => println!(
                "  {}: {} articles ({} pages)",
                result.domain, result.article_count, result.pages_fetched
            ),
            (_, Some(message)) => println!(
                "  {}: {} articles [{}] {}",
                result.domain, result.article_count, result.status, message
            ),
            (status, None) => println!(
                "  {}: {} articles [{}]",
                result.domain, result.article_count, status
            ),
        }
    }
    println!();

    if !site_notes.is_empty() {
        println!("Site Notes ({}):", site_notes.len());
        for (domain, note) in site_notes {
            println!("  - {}: {}", domain, note.note);
        }
        println!();
    }
}

/// Prints the counters of a normalization pass to stdout
pub fn print_normalization_stats(stats: &NormalizationStats) {
    println!("=== Normalization Statistics ===\n");

    println!("  Files processed: {}", stats.files_processed);
    println!("  New articles: {}", stats.articles_new);
    println!("  Skipped (already normalized): {}", stats.articles_skipped);
    println!("  Errors: {}", stats.errors);

    if !stats.error_messages.is_empty() {
        println!();
        println!("Errors:");
        for message in &stats.error_messages {
            println!("  - {}", message);
        }
    }
}

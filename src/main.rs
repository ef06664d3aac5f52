//! wp-harvest main entry point
//!
//! This is the command-line interface for collecting and normalizing
//! WordPress posts.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wp_harvest::config::{load_config_with_hash, load_domains, Config};
use wp_harvest::output::{
    find_latest_collection_dir, print_collection_summary, print_normalization_stats,
};
use wp_harvest::url::{build_posts_url, format_after, PostsQuery};

/// wp-harvest: collect recent WordPress posts and normalize them
///
/// Posts are pulled from each site's `wp-json` REST API, one page at a time,
/// and stored per run. The normalize step turns a run into one canonical
/// article file per URL.
#[derive(Parser, Debug)]
#[command(name = "wp-harvest")]
#[command(version)]
#[command(about = "A WordPress news collector and normalizer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Browserless API token (overrides the config file)
    #[arg(long, env = "BROWSERLESS_TOKEN", hide_env_values = true, global = true)]
    browserless_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect recent posts from every domain in the domains file
    Collect {
        /// Newline-separated list of WordPress domains
        #[arg(long, default_value = "wordpress.txt")]
        domains_file: PathBuf,

        /// Lookback window in hours
        #[arg(long, default_value_t = 48)]
        hours: u32,

        /// Save the content of every fetched page for inspection
        #[arg(long)]
        debug: bool,

        /// Show what would be requested without fetching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Normalize a collection run into canonical article files
    Normalize {
        /// Run directory to normalize (defaults to the most recent run)
        #[arg(short, long)]
        source_directory: Option<PathBuf>,

        /// Root directory of normalized articles
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_configuration(cli.config.as_deref())?;
    if let Some(token) = cli.browserless_token {
        config.browser.browserless_token = Some(token);
    }

    match cli.command {
        Command::Collect {
            domains_file,
            hours,
            debug,
            dry_run,
        } => {
            if dry_run {
                handle_dry_run(&config, &domains_file, hours)?;
            } else {
                handle_collect(config, &domains_file, hours, debug).await?;
            }
        }
        Command::Normalize {
            source_directory,
            output_dir,
        } => handle_normalize(&config, source_directory, output_dir)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wp_harvest=info,warn"),
            1 => EnvFilter::new("wp_harvest=debug,info"),
            2 => EnvFilter::new("wp_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given, otherwise the defaults
fn load_configuration(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Handles `collect --dry-run`: shows the first request per domain
fn handle_dry_run(
    config: &Config,
    domains_file: &Path,
    hours: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let domains = load_domains(domains_file)?;
    let after = format_after(chrono::Utc::now(), hours);

    println!("=== wp-harvest Dry Run ===\n");

    println!("Collector Configuration:");
    println!("  Page size: {}", config.collector.page_size);
    println!("  Max pages per domain: {}", config.collector.max_pages);
    println!(
        "  Delay between requests: {}-{}ms",
        config.collector.delay_min_ms, config.collector.delay_max_ms
    );
    println!("  Browser backend: {:?}", config.browser.backend);
    println!("  Window: posts after {} ({}h)", after, hours);

    println!("\nOutput:");
    println!("  Posts: {}", config.output.posts_dir);
    println!("  Debug pages: {}", config.output.debug_dir);

    println!("\nDomains ({}):", domains.len());
    for domain in &domains {
        match build_posts_url(domain, &PostsQuery::window(&after, 1, config.collector.page_size)) {
            Ok(url) => println!("  - {}\n    {}", domain, url),
            Err(e) => println!("  - {} (invalid: {})", domain, e),
        }
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main collection run
async fn handle_collect(
    config: Config,
    domains_file: &Path,
    hours: u32,
    debug: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting collection from {} (last {}h, backend {:?})",
        domains_file.display(),
        hours,
        config.browser.backend
    );

    match wp_harvest::collect(config, domains_file, hours, debug).await {
        Ok(outcome) => {
            print_collection_summary(&outcome.summary, &outcome.site_notes, &outcome.run_dir);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Collection failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the normalize subcommand
fn handle_normalize(
    config: &Config,
    source_directory: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let source_dir = match source_directory {
        Some(dir) => dir,
        None => {
            tracing::info!("Source directory not provided, looking for the latest run");
            let posts_dir = Path::new(&config.output.posts_dir);
            match find_latest_collection_dir(posts_dir)? {
                Some(dir) => {
                    println!("Found latest collection directory: {}", dir.display());
                    dir
                }
                None => {
                    let message = format!(
                        "No collection directory found under '{}'; specify one with -s",
                        posts_dir.display()
                    );
                    tracing::error!("{}", message);
                    return Err(message.into());
                }
            }
        }
    };
    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.output.normalized_dir));

    match wp_harvest::process_directory(&source_dir, &output_dir) {
        Ok(stats) => {
            print_normalization_stats(&stats);
            println!(
                "\nSummary written to {}",
                source_dir
                    .join(wp_harvest::output::NORMALIZATION_SUMMARY_FILE)
                    .display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Normalization failed: {}", e);
            Err(e.into())
        }
    }
}

use crate::config::types::{BrowserBackend, BrowserConfig, CollectorConfig, Config, OutputConfig};
use crate::ConfigError;
use url::Url;

/// WordPress rejects `per_page` values above this
const WP_MAX_PER_PAGE: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_collector_config(&config.collector)?;
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("page_size", config.page_size),
        ("probe_page_size", config.probe_page_size),
    ] {
        if !(1..=WP_MAX_PER_PAGE).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and {}, got {}",
                name, WP_MAX_PER_PAGE, value
            )));
        }
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.delay_min_ms > config.delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "delay_min_ms ({}) must not exceed delay_max_ms ({})",
            config.delay_min_ms, config.delay_max_ms
        )));
    }

    if config.probe_selector.trim().is_empty() {
        return Err(ConfigError::Validation(
            "probe_selector cannot be empty".to_string(),
        ));
    }

    if scraper::Selector::parse(&config.probe_selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "probe_selector '{}' is not a valid CSS selector",
            config.probe_selector
        )));
    }

    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.backend == BrowserBackend::Browserless {
        let base = config.browserless_url.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "browserless_url is required when backend = \"browserless\"".to_string(),
            )
        })?;
        let url = Url::parse(base)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid browserless_url: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "browserless_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("posts_dir", &config.posts_dir),
        ("debug_dir", &config.debug_dir),
        ("normalized_dir", &config.normalized_dir),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

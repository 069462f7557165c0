// src/pipeline/validate.rs

use std::path::Path;

use crate::error::Result;
use crate::models::Config;
use crate::services::check_calendar;

/// Load and validate a configuration file, logging what it describes.
pub fn run_validate(config_path: &Path) -> Result<Config> {
    log::info!("Validating configuration: {}", config_path.display());

    let config = Config::load(config_path)?;
    match config.validate() {
        Ok(()) => {
            log::info!("Configuration is valid");
            log::info!("  base_url: {}", config.site.base_url);
            for page in &config.site.pages {
                log::info!("  page {}: {} ({:?})", page.kind, page.path(), page.layout());
            }
            log::info!("  timezone: {}", config.calendar.timezone);
            log::info!("  output: {}", config.calendar.output_path);
            log::info!(
                "  retries: {} (delay {}ms, x{})",
                config.fetcher.retry_count,
                config.fetcher.retry_delay_ms,
                config.fetcher.backoff_multiplier
            );
            Ok(config)
        }
        Err(e) => {
            log::error!("Configuration is invalid: {}", e);
            Err(e)
        }
    }
}

/// Check an existing calendar file and return its event count.
pub async fn run_check(path: &Path) -> Result<usize> {
    let text = tokio::fs::read_to_string(path).await?;
    let events = check_calendar(&text)?;
    log::info!("{} is well formed with {} event(s)", path.display(), events);
    Ok(events)
}

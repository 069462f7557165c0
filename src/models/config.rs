//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::PageConfig;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source site and the pages to scrape
    #[serde(default)]
    pub site: SiteConfig,

    /// Calendar output settings
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// HTTP fetching behavior
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.site.base_url()?;
        if self.site.pages.is_empty() {
            return Err(AppError::validation("No pages defined"));
        }
        let mut seen = HashSet::new();
        for page in &self.site.pages {
            if !seen.insert(page.kind) {
                return Err(AppError::validation(format!(
                    "Page kind '{}' is listed more than once",
                    page.kind
                )));
            }
        }

        self.calendar.timezone()?;
        self.calendar.default_start_time()?;
        if self.calendar.output_path.trim().is_empty() {
            return Err(AppError::validation("calendar.output_path is empty"));
        }
        if self.calendar.default_duration_hours == 0 {
            return Err(AppError::validation(
                "calendar.default_duration_hours must be > 0",
            ));
        }
        if self.calendar.prodid.trim().is_empty() {
            return Err(AppError::validation("calendar.prodid is empty"));
        }

        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        let multiplier = self.fetcher.backoff_multiplier;
        if multiplier.is_nan() || multiplier < 1.0 {
            return Err(AppError::validation(
                "fetcher.backoff_multiplier must be >= 1.0",
            ));
        }
        Ok(())
    }
}

/// Source site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Root for relative page paths and document links
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Pages to scrape, processed in this order
    #[serde(default = "defaults::pages")]
    pub pages: Vec<PageConfig>,
}

impl SiteConfig {
    /// Parsed base URL.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)?;
        if url.host_str().is_none() {
            return Err(AppError::validation(format!(
                "site.base_url has no host: {}",
                self.base_url
            )));
        }
        Ok(url)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            pages: defaults::pages(),
        }
    }
}

/// Calendar output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Where the `.ics` document is written
    #[serde(default = "defaults::output_path")]
    pub output_path: String,

    /// IANA timezone the source publishes times in
    #[serde(default = "defaults::timezone")]
    pub timezone: String,

    /// Calendar display name (`X-WR-CALNAME`)
    #[serde(default = "defaults::calendar_name")]
    pub name: String,

    /// Product identifier (`PRODID`)
    #[serde(default = "defaults::prodid")]
    pub prodid: String,

    /// Prefix for page-derived meeting titles
    #[serde(default = "defaults::title_prefix")]
    pub title_prefix: String,

    /// Length of a meeting when the page gives only a start time
    #[serde(default = "defaults::default_duration_hours")]
    pub default_duration_hours: u32,

    /// Start time (`HH:MM`) used when the page gives no time at all
    #[serde(default = "defaults::default_start_time")]
    pub default_start_time: String,

    /// Location attached to events whose page does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Write a calendar even when no upcoming events were found
    #[serde(default)]
    pub allow_empty: bool,
}

impl CalendarConfig {
    /// Parsed timezone.
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| AppError::config(format!("Unknown timezone '{}': {e}", self.timezone)))
    }

    /// Parsed fallback start time.
    pub fn default_start_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.default_start_time.trim(), "%H:%M").map_err(|e| {
            AppError::config(format!(
                "Invalid calendar.default_start_time '{}': {e}",
                self.default_start_time
            ))
        })
    }

    /// Default meeting duration.
    pub fn default_duration(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.default_duration_hours))
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            output_path: defaults::output_path(),
            timezone: defaults::timezone(),
            name: defaults::calendar_name(),
            prodid: defaults::prodid(),
            title_prefix: defaults::title_prefix(),
            default_duration_hours: defaults::default_duration_hours(),
            default_start_time: defaults::default_start_time(),
            location: None,
            allow_empty: false,
        }
    }
}

/// HTTP client and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Retries after the first failed attempt
    #[serde(default = "defaults::retry_count")]
    pub retry_count: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,

    /// Factor applied to the delay after each retry
    #[serde(default = "defaults::backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl FetcherConfig {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(retry as i32);
        Duration::from_millis((self.retry_delay_ms as f64 * factor).round() as u64)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            retry_count: defaults::retry_count(),
            retry_delay_ms: defaults::retry_delay(),
            backoff_multiplier: defaults::backoff_multiplier(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use crate::models::{PageConfig, PageKind};

    // Site defaults
    pub fn base_url() -> String {
        "https://www.stmewanparishcouncil.gov.uk".into()
    }
    pub fn pages() -> Vec<PageConfig> {
        PageKind::ALL.into_iter().map(PageConfig::new).collect()
    }

    // Calendar defaults
    pub fn output_path() -> String {
        "stmewan.ics".into()
    }
    pub fn timezone() -> String {
        "Europe/London".into()
    }
    pub fn calendar_name() -> String {
        "St Mewan Parish Council".into()
    }
    pub fn prodid() -> String {
        "-//St Mewan Parish Council//EN".into()
    }
    pub fn title_prefix() -> String {
        "St Mewan Parish - ".into()
    }
    pub fn default_duration_hours() -> u32 {
        1
    }
    pub fn default_start_time() -> String {
        "09:00".into()
    }

    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; parish-calendar/0.1)".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn retry_count() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        1000
    }
    pub fn backoff_multiplier() -> f64 {
        2.0
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}

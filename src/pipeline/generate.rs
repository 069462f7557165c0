// src/pipeline/generate.rs

//! Calendar generation pipeline.
//!
//! Pages are fetched one at a time in configured order. A page that cannot be
//! fetched, or a record that cannot be read, is logged and skipped; only
//! run-level failures abort the run.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CalendarDocument, Config, NormalizedEvent, PageConfig, RawMeetingRecord};
use crate::pipeline::filter::upcoming;
use crate::services::{
    CalendarSerializer, DateTimeNormalizer, EventBuilder, PageFetcher, ParsedPage,
    check_calendar, reference_year,
};
use crate::storage::{CalendarStorage, WriteOutcome};
use crate::utils::get_domain;

/// Counters for a generation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateStats {
    pub pages_total: usize,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub records_seen: usize,
    pub records_skipped: usize,
    pub past_events: usize,
    pub duplicates: usize,
    pub events: usize,
}

/// A rendered calendar and how it was produced.
#[derive(Debug)]
pub struct GenerateOutcome {
    pub document: CalendarDocument,
    pub text: String,
    pub stats: GenerateStats,
}

/// Per-run state shared by every page.
struct PageProcessor<'a> {
    config: &'a Config,
    base_url: Url,
    normalizer: DateTimeNormalizer,
    builder: EventBuilder,
}

impl<'a> PageProcessor<'a> {
    fn new(config: &'a Config, now: DateTime<Utc>) -> Result<Self> {
        let base_url = config.site.base_url()?;
        let domain = get_domain(&base_url).ok_or_else(|| {
            AppError::validation(format!("site.base_url has no host: {base_url}"))
        })?;
        let timezone = config.calendar.timezone()?;
        let normalizer =
            DateTimeNormalizer::from_config(&config.calendar, reference_year(now, timezone))?;

        Ok(Self {
            config,
            base_url,
            normalizer,
            builder: EventBuilder::new(domain),
        })
    }

    fn page_url(&self, page: &PageConfig) -> Result<Url> {
        Ok(self.base_url.join(page.path())?)
    }

    /// Extract and build every event on a page, counting skipped records.
    fn events(
        &self,
        page: &PageConfig,
        html: &str,
        stats: &mut GenerateStats,
    ) -> Result<Vec<NormalizedEvent>> {
        let parsed = ParsedPage::parse(
            html,
            page,
            &self.base_url,
            &self.config.calendar.title_prefix,
            self.config.calendar.location.as_deref(),
        );
        if !parsed.has_listing() {
            log::warn!("No meeting listing found on the {} page", page.kind);
        }

        let mut events = Vec::new();
        for record in parsed.records() {
            stats.records_seen += 1;
            match self.build(record) {
                Ok(event) => events.push(event),
                Err(error) if error.is_recoverable() => {
                    stats.records_skipped += 1;
                    log::warn!("Skipping {} record: {}", page.kind, error);
                }
                Err(error) => return Err(error),
            }
        }
        Ok(events)
    }

    fn build(&self, record: RawMeetingRecord) -> Result<NormalizedEvent> {
        let (start, end) = self
            .normalizer
            .normalize(&record.date_text, &record.time_text)?;
        self.builder.build(
            record.kind,
            &record.title,
            start,
            end,
            record.location.as_deref(),
            record.links,
        )
    }
}

/// Fetch every configured page and render the upcoming meetings.
pub async fn generate_calendar(
    config: &Config,
    fetcher: &dyn PageFetcher,
    now: DateTime<Utc>,
) -> Result<GenerateOutcome> {
    let processor = PageProcessor::new(config, now)?;
    let mut stats = GenerateStats {
        pages_total: config.site.pages.len(),
        ..GenerateStats::default()
    };

    let mut seen = HashSet::new();
    let mut events = Vec::new();

    for page in &config.site.pages {
        let url = processor.page_url(page)?;
        log::info!("Fetching {} page: {}", page.kind, url);

        let html = match fetcher.fetch(url.as_str()).await {
            Ok(html) => html,
            Err(error) => {
                stats.pages_failed += 1;
                log::warn!("Failed to fetch {} page: {}", page.kind, error);
                continue;
            }
        };
        stats.pages_fetched += 1;

        let built = processor.events(page, &html, &mut stats)?;
        let built_count = built.len();
        let kept = upcoming(built, now);
        stats.past_events += built_count - kept.len();
        log::info!(
            "{} page: {} upcoming of {} meeting(s)",
            page.kind,
            kept.len(),
            built_count
        );

        for event in kept {
            if seen.insert(event.uid.clone()) {
                events.push(event);
            } else {
                stats.duplicates += 1;
                log::info!("Dropping duplicate meeting '{}' ({})", event.title, event.uid);
            }
        }
    }

    if stats.pages_fetched == 0 {
        return Err(AppError::NoPagesFetched {
            failed: stats.pages_failed,
        });
    }
    if events.is_empty() && !config.calendar.allow_empty {
        return Err(AppError::EmptyCalendar {
            pages: stats.pages_fetched,
        });
    }

    stats.events = events.len();
    let document = CalendarDocument::new(now, events);
    let text = CalendarSerializer::from_config(&config.calendar).render(&document)?;

    let checked = check_calendar(&text)?;
    if checked != document.len() {
        return Err(AppError::malformed(format!(
            "rendered {} event(s) but the document holds {}",
            document.len(),
            checked
        )));
    }

    Ok(GenerateOutcome {
        document,
        text,
        stats,
    })
}

/// Generate the calendar and store it.
pub async fn run_generate(
    config: &Config,
    fetcher: &dyn PageFetcher,
    storage: &dyn CalendarStorage,
    now: DateTime<Utc>,
) -> Result<(GenerateStats, WriteOutcome)> {
    log::info!("Generating calendar for {}", config.site.base_url);

    let outcome = generate_calendar(config, fetcher, now).await?;
    let stats = outcome.stats;
    log::info!(
        "Pages fetched: {}/{}, records skipped: {}, past: {}, duplicates: {}, events: {}",
        stats.pages_fetched,
        stats.pages_total,
        stats.records_skipped,
        stats.past_events,
        stats.duplicates,
        stats.events
    );

    let written = storage.write_calendar(&outcome.text).await?;
    Ok((stats, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use tempfile::TempDir;

    use crate::models::{PageKind, PageLayout};
    use crate::storage::LocalStorage;

    const BASE: &str = "https://council.example.com/";

    const COUNCIL_PAGE: &str = r#"
        <div class="minutes">
          <h4>12 March 2025</h4>
          <p>19:00</p>
          <a href="/docs/a.pdf">Agenda</a>
        </div>
        <div class="minutes">
          <h4>TBC</h4>
          <p>19:00</p>
        </div>
    "#;

    const PLANNING_PAGE: &str = r#"
        <div class="minutes">
          <h4>20 March 2025</h4>
          <p>18:30-20:00</p>
        </div>
        <div class="minutes">
          <h4>20 March 2025</h4>
          <p>18:30-20:00</p>
        </div>
        <div class="minutes">
          <h4>3 February 2025</h4>
          <p>19:00</p>
        </div>
    "#;

    struct StubFetcher {
        pages: HashMap<String, String>,
    }

    impl StubFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(path, html)| (format!("{BASE}{path}"), html.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::fetch(url, 1, "404 Not Found"))
        }
    }

    fn page(kind: PageKind, path: &str) -> PageConfig {
        PageConfig {
            path: Some(path.to_string()),
            ..PageConfig::new(kind)
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.site.base_url = BASE.to_string();
        config.site.pages = vec![
            page(PageKind::FullCouncil, "council"),
            page(PageKind::Planning, "planning"),
        ];
        config.calendar.title_prefix = String::new();
        config
    }

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_upcoming_council_meeting() {
        let mut config = config();
        config.site.pages.truncate(1);
        let fetcher = StubFetcher::new(&[("council", COUNCIL_PAGE)]);

        let outcome = generate_calendar(&config, &fetcher, at(3, 1)).await.unwrap();
        assert_eq!(outcome.document.len(), 1);

        let event = &outcome.document.events[0];
        assert_eq!(event.title, "Full Council Meeting");
        assert_eq!(event.start.format("%Y-%m-%d %H:%M").to_string(), "2025-03-12 19:00");
        assert_eq!(event.end.format("%H:%M").to_string(), "20:00");
        assert!(event.description().unwrap().contains("/docs/a.pdf"));
        assert!(outcome.text.contains("/docs/a.pdf"));

        assert_eq!(outcome.stats.records_seen, 2);
        assert_eq!(outcome.stats.records_skipped, 1);
    }

    #[tokio::test]
    async fn test_past_meeting_is_excluded() {
        let mut config = config();
        config.site.pages.truncate(1);
        config.calendar.allow_empty = true;
        let fetcher = StubFetcher::new(&[("council", COUNCIL_PAGE)]);

        let outcome = generate_calendar(&config, &fetcher, at(4, 1)).await.unwrap();
        assert!(outcome.document.is_empty());
        assert_eq!(outcome.stats.past_events, 1);
        assert!(outcome.text.contains("BEGIN:VCALENDAR"));
    }

    #[tokio::test]
    async fn test_empty_calendar_is_fatal_by_default() {
        let mut config = config();
        config.site.pages.truncate(1);
        let fetcher = StubFetcher::new(&[("council", COUNCIL_PAGE)]);

        let result = generate_calendar(&config, &fetcher, at(4, 1)).await;
        assert!(matches!(result, Err(AppError::EmptyCalendar { pages: 1 })));
    }

    #[tokio::test]
    async fn test_time_range_and_duplicates() {
        let fetcher = StubFetcher::new(&[("council", COUNCIL_PAGE), ("planning", PLANNING_PAGE)]);

        let outcome = generate_calendar(&config(), &fetcher, at(3, 1)).await.unwrap();
        let stats = &outcome.stats;
        assert_eq!(stats.pages_fetched, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.past_events, 1);
        assert_eq!(stats.events, 2);

        let planning = &outcome.document.events[1];
        assert_eq!(planning.kind, PageKind::Planning);
        assert_eq!(planning.start.format("%H:%M").to_string(), "18:30");
        assert_eq!(planning.end.format("%H:%M").to_string(), "20:00");
    }

    #[tokio::test]
    async fn test_events_follow_page_order() {
        let mut config = config();
        config.site.pages.reverse();
        let fetcher = StubFetcher::new(&[("council", COUNCIL_PAGE), ("planning", PLANNING_PAGE)]);

        let outcome = generate_calendar(&config, &fetcher, at(3, 1)).await.unwrap();
        let kinds: Vec<_> = outcome.document.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![PageKind::Planning, PageKind::FullCouncil]);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_tolerated() {
        let fetcher = StubFetcher::new(&[("planning", PLANNING_PAGE)]);

        let outcome = generate_calendar(&config(), &fetcher, at(3, 1)).await.unwrap();
        assert_eq!(outcome.stats.pages_failed, 1);
        assert_eq!(outcome.stats.pages_fetched, 1);
        assert_eq!(outcome.document.len(), 1);
    }

    #[tokio::test]
    async fn test_all_pages_failing_is_fatal() {
        let fetcher = StubFetcher::new(&[]);
        let result = generate_calendar(&config(), &fetcher, at(3, 1)).await;
        assert!(matches!(result, Err(AppError::NoPagesFetched { failed: 2 })));
    }

    #[tokio::test]
    async fn test_table_page_uses_row_titles() {
        let mut config = config();
        config.site.pages = vec![PageConfig {
            layout: Some(PageLayout::Table),
            ..page(PageKind::RightsOfWay, "footpaths")
        }];
        config.calendar.location = Some("Parish Hall".to_string());
        let html = r#"
            <table>
              <tr>
                <td>Sat 15th March 2025</td><td>10am</td><td>Footpath Walk</td><td>Church Gate</td>
              </tr>
              <tr><td>22 March 2025</td><td>2pm - 4pm</td></tr>
            </table>
        "#;
        let fetcher = StubFetcher::new(&[("footpaths", html)]);

        let outcome = generate_calendar(&config, &fetcher, at(3, 1)).await.unwrap();
        let events = &outcome.document.events;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Footpath Walk");
        assert_eq!(events[0].location.as_deref(), Some("Church Gate"));
        assert_eq!(events[1].title, "Rights of Way Meeting");
        assert_eq!(events[1].location.as_deref(), Some("Parish Hall"));
        assert_eq!(events[1].end.format("%H:%M").to_string(), "16:00");
    }

    #[tokio::test]
    async fn test_output_is_stable_across_runs() {
        let fetcher = StubFetcher::new(&[("council", COUNCIL_PAGE), ("planning", PLANNING_PAGE)]);
        let first = generate_calendar(&config(), &fetcher, at(3, 1)).await.unwrap();
        let second = generate_calendar(&config(), &fetcher, at(3, 1)).await.unwrap();
        assert_eq!(first.text, second.text);
    }

    #[tokio::test]
    async fn test_run_generate_writes_once() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("out/parish.ics"));
        let fetcher = StubFetcher::new(&[("council", COUNCIL_PAGE)]);

        let (stats, written) = run_generate(&config(), &fetcher, &storage, at(3, 1))
            .await
            .unwrap();
        assert_eq!(stats.events, 1);
        assert!(written.changed);

        let (_, rewritten) = run_generate(&config(), &fetcher, &storage, at(3, 1))
            .await
            .unwrap();
        assert!(!rewritten.changed);

        let text = storage.load_calendar().await.unwrap().unwrap();
        assert_eq!(check_calendar(&text).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("parish.ics"));
        let fetcher = StubFetcher::new(&[("council", COUNCIL_PAGE)]);

        let result = run_generate(&config(), &fetcher, &storage, at(4, 1)).await;
        assert!(result.is_err());
        assert!(storage.load_calendar().await.unwrap().is_none());
    }
}

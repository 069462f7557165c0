// src/services/extractor.rs

//! Entry extraction from meeting listing pages.
//!
//! Each [`PageLayout`] has its own extraction rule. A page whose listing
//! container is missing yields no records rather than an error.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{MeetingLink, PageConfig, PageKind, PageLayout, RawMeetingRecord};
use crate::utils::{normalize_whitespace, resolve_url};

macro_rules! selector {
    ($name:ident, $query:expr) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($query).unwrap());
    };
}

selector!(MINUTES_BLOCK, "div.minutes");
selector!(HEADING, "h4");
selector!(PARAGRAPH, "p");
selector!(TABLE, "table");
selector!(TABLE_ROW, "table tr");
selector!(CELL, "td");
selector!(ANCHOR, "a[href]");

/// A parsed page, ready to yield its meeting records.
pub struct ParsedPage {
    document: Html,
    kind: PageKind,
    layout: PageLayout,
    base_url: Url,
    fallback_title: String,
    fallback_location: Option<String>,
}

impl ParsedPage {
    /// Parse a page's HTML.
    ///
    /// `title_prefix` builds the title for records that carry none, and
    /// `location` is attached to records without their own venue.
    pub fn parse(
        html: &str,
        page: &PageConfig,
        base_url: &Url,
        title_prefix: &str,
        location: Option<&str>,
    ) -> Self {
        Self {
            document: Html::parse_document(html),
            kind: page.kind,
            layout: page.layout(),
            base_url: base_url.clone(),
            fallback_title: page.meeting_title(title_prefix),
            fallback_location: location.map(str::to_string),
        }
    }

    /// Whether the page contains the container its layout expects.
    pub fn has_listing(&self) -> bool {
        let container: &Selector = match self.layout {
            PageLayout::Minutes => &MINUTES_BLOCK,
            PageLayout::Table => &TABLE,
        };
        self.document.select(container).next().is_some()
    }

    /// Lazily yield the meeting records on the page, in page order.
    pub fn records(&self) -> impl Iterator<Item = RawMeetingRecord> + '_ {
        let (blocks, rows) = match self.layout {
            PageLayout::Minutes => (Some(self.document.select(&MINUTES_BLOCK)), None),
            PageLayout::Table => (None, Some(self.document.select(&TABLE_ROW))),
        };

        let from_blocks = blocks
            .into_iter()
            .flatten()
            .filter_map(|block| self.minutes_record(block));
        let from_rows = rows
            .into_iter()
            .flatten()
            .filter_map(|row| self.table_record(row));

        from_blocks.chain(from_rows)
    }

    fn minutes_record(&self, block: ElementRef<'_>) -> Option<RawMeetingRecord> {
        let Some(heading) = block.select(&HEADING).next() else {
            log::debug!("Skipping {} block without a date heading", self.kind);
            return None;
        };

        let time_text = block
            .select(&PARAGRAPH)
            .next()
            .map(element_text)
            .unwrap_or_default();

        Some(RawMeetingRecord {
            kind: self.kind,
            title: self.fallback_title.clone(),
            date_text: element_text(heading),
            time_text,
            location: self.fallback_location.clone(),
            links: self.links(block),
        })
    }

    fn table_record(&self, row: ElementRef<'_>) -> Option<RawMeetingRecord> {
        let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
        if cells.len() < 2 {
            log::debug!("Skipping {} row with {} cell(s)", self.kind, cells.len());
            return None;
        }

        let optional_cell = |idx: usize| {
            cells
                .get(idx)
                .map(|cell| element_text(*cell))
                .filter(|text| !text.is_empty())
        };

        Some(RawMeetingRecord {
            kind: self.kind,
            title: optional_cell(2).unwrap_or_else(|| self.fallback_title.clone()),
            date_text: element_text(cells[0]),
            time_text: element_text(cells[1]),
            location: optional_cell(3).or_else(|| self.fallback_location.clone()),
            links: self.links(row),
        })
    }

    fn links(&self, scope: ElementRef<'_>) -> Vec<MeetingLink> {
        scope
            .select(&ANCHOR)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?.trim();
                if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
                    return None;
                }
                let text = normalize_whitespace(&anchor.text().collect::<String>());
                Some(MeetingLink::new(
                    link_label(&text),
                    resolve_url(&self.base_url, href),
                ))
            })
            .collect()
    }
}

/// Text content of an element with whitespace and edge punctuation removed.
fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

fn clean_text(raw: &str) -> String {
    normalize_whitespace(raw)
        .trim_matches(|c: char| matches!(c, ',' | ';' | '|' | '*' | '-'))
        .trim()
        .to_string()
}

/// Normalise a link's text to a label.
fn link_label(text: &str) -> String {
    let lower = text.to_lowercase();
    if lower.contains("agenda") {
        "Agenda".to_string()
    } else if lower.contains("minutes") {
        "Minutes".to_string()
    } else if text.is_empty() {
        "Link".to_string()
    } else {
        text.to_string()
    }
}

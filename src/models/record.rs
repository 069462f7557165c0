//! Raw meeting data as scraped from a page.

use serde::{Deserialize, Serialize};

use crate::models::PageKind;

/// A labelled link to a meeting document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MeetingLink {
    /// Link label (e.g. "Agenda", "Minutes")
    pub label: String,

    /// Absolute URL
    pub url: String,
}

impl MeetingLink {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// One meeting entry as found on a page, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMeetingRecord {
    /// Page the record came from
    pub kind: PageKind,

    /// Meeting title
    pub title: String,

    /// Date text, whitespace-normalized
    pub date_text: String,

    /// Time text (single time or range), possibly empty
    pub time_text: String,

    /// Venue text, when the page names one
    pub location: Option<String>,

    /// Document links in page order
    pub links: Vec<MeetingLink>,
}

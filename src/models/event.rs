//! Calendar event data structures.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::{MeetingLink, PageKind};

/// A fully resolved meeting, ready for the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    /// Deterministic identifier (`UID`)
    pub uid: String,

    /// Page the event came from
    pub kind: PageKind,

    /// Normalized title
    pub title: String,

    /// Start instant in the source timezone
    pub start: DateTime<Tz>,

    /// End instant in the source timezone, after `start`
    pub end: DateTime<Tz>,

    /// Venue, if known
    pub location: Option<String>,

    /// Document links in page order
    pub links: Vec<MeetingLink>,
}

impl NormalizedEvent {
    /// Start instant in UTC.
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    /// End instant in UTC.
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    /// Plain-text description listing the links, one `Label: URL` per line.
    pub fn description(&self) -> Option<String> {
        if self.links.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .links
            .iter()
            .map(|link| format!("{}: {}", link.label, link.url))
            .collect();
        Some(lines.join("\n"))
    }
}

/// The events of one generation run.
#[derive(Debug, Clone)]
pub struct CalendarDocument {
    /// When the document was generated
    pub generated_at: DateTime<Utc>,

    /// Upcoming events in page order
    pub events: Vec<NormalizedEvent>,
}

impl CalendarDocument {
    pub fn new(generated_at: DateTime<Utc>, events: Vec<NormalizedEvent>) -> Self {
        Self {
            generated_at,
            events,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

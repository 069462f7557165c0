// src/services/calendar.rs

//! iCalendar rendering.
//!
//! Timestamps are written in UTC basic format, so the document needs no
//! VTIMEZONE component. The `ics` writer output is re-folded so that no
//! physical line, continuation space included, exceeds 75 octets.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use ics::components::Property;
use ics::properties::{CalScale, Description, DtEnd, DtStart, Location, Method, Summary};
use ics::{Event, ICalendar, escape_text};

use crate::error::{AppError, Result};
use crate::models::{CalendarConfig, CalendarDocument, NormalizedEvent};

const UTC_BASIC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

const MAX_LINE_OCTETS: usize = 75;

/// Renders calendar documents with fixed calendar-level properties.
#[derive(Debug, Clone)]
pub struct CalendarSerializer {
    prodid: String,
    name: String,
    timezone: String,
}

impl CalendarSerializer {
    pub fn new(
        prodid: impl Into<String>,
        name: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            prodid: prodid.into(),
            name: name.into(),
            timezone: timezone.into(),
        }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(&config.prodid, &config.name, &config.timezone)
    }

    /// Render the document after checking its invariants.
    pub fn render(&self, document: &CalendarDocument) -> Result<String> {
        check_invariants(&document.events)?;

        let mut calendar = ICalendar::new("2.0", self.prodid.as_str());
        calendar.push(CalScale::new("GREGORIAN"));
        calendar.push(Method::new("PUBLISH"));
        calendar.push(Property::new("X-WR-CALNAME", escape_text(self.name.as_str())));
        calendar.push(Property::new("X-WR-TIMEZONE", self.timezone.as_str()));

        let stamp = utc_basic(&document.generated_at);
        for event in &document.events {
            calendar.add_event(to_ics_event(event, &stamp));
        }

        Ok(refold(&calendar.to_string()))
    }
}

fn to_ics_event<'a>(event: &'a NormalizedEvent, stamp: &str) -> Event<'a> {
    let mut ics_event = Event::new(event.uid.as_str(), stamp.to_string());
    ics_event.push(DtStart::new(utc_basic(&event.start_utc())));
    ics_event.push(DtEnd::new(utc_basic(&event.end_utc())));
    ics_event.push(Summary::new(escape_text(event.title.as_str())));

    if let Some(location) = &event.location {
        ics_event.push(Location::new(escape_text(location.as_str())));
    }
    if let Some(description) = event.description() {
        ics_event.push(Description::new(escape_text(description)));
    }

    ics_event
}

fn check_invariants(events: &[NormalizedEvent]) -> Result<()> {
    let mut seen = HashSet::new();
    for event in events {
        if event.end <= event.start {
            return Err(AppError::serialization(format!(
                "event {} ends before it starts",
                event.uid
            )));
        }
        if !seen.insert(event.uid.as_str()) {
            return Err(AppError::serialization(format!(
                "duplicate event UID {}",
                event.uid
            )));
        }
    }
    Ok(())
}

fn utc_basic(instant: &DateTime<Utc>) -> String {
    instant.format(UTC_BASIC_FORMAT).to_string()
}

/// Rejoin the writer's continuation lines and fold them again at the octet limit.
fn refold(rendered: &str) -> String {
    let mut logical: Vec<String> = Vec::new();
    for line in rendered.split("\r\n") {
        match (line.strip_prefix(' '), logical.last_mut()) {
            (Some(rest), Some(last)) => last.push_str(rest),
            _ => logical.push(line.to_string()),
        }
    }

    let mut out = String::with_capacity(rendered.len());
    for line in logical.iter().filter(|line| !line.is_empty()) {
        fold_line(line, &mut out);
    }
    out
}

/// Append `line` folded on char boundaries, each physical line at most 75 octets.
fn fold_line(line: &str, out: &mut String) {
    let mut rest = line;
    let mut limit = MAX_LINE_OCTETS;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        out.push_str(&rest[..cut]);
        out.push_str("\r\n ");
        rest = &rest[cut..];
        // Continuation lines start with a space.
        limit = MAX_LINE_OCTETS - 1;
    }
    out.push_str(rest);
    out.push_str("\r\n");
}

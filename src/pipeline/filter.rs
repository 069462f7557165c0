// src/pipeline/filter.rs

use chrono::{DateTime, Utc};

use crate::models::NormalizedEvent;

/// Keep events starting at or after `now`, in their original order.
pub fn upcoming(events: Vec<NormalizedEvent>, now: DateTime<Utc>) -> Vec<NormalizedEvent> {
    events
        .into_iter()
        .filter(|event| event.start_utc() >= now)
        .collect()
}

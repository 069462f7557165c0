// src/services/builder.rs

//! Event assembly and identifier derivation.

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::{MeetingLink, NormalizedEvent, PageKind};
use crate::utils::normalize_whitespace;

/// Hex characters of the digest kept in a UID.
const UID_HASH_LEN: usize = 32;

/// Builds canonical events with deterministic identifiers.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    uid_domain: String,
}

impl EventBuilder {
    /// Create a builder whose UIDs end in `@{uid_domain}`.
    pub fn new(uid_domain: impl Into<String>) -> Self {
        Self {
            uid_domain: uid_domain.into(),
        }
    }

    /// Assemble an event from resolved parts.
    pub fn build(
        &self,
        kind: PageKind,
        title: &str,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
        location: Option<&str>,
        links: Vec<MeetingLink>,
    ) -> Result<NormalizedEvent> {
        let title = normalize_whitespace(title);
        if title.is_empty() {
            return Err(AppError::parse(kind.as_str(), "empty meeting title"));
        }
        if end <= start {
            return Err(AppError::serialization(format!(
                "'{title}' ends at {end} which is not after its start {start}"
            )));
        }

        let location = location
            .map(normalize_whitespace)
            .filter(|location| !location.is_empty());

        Ok(NormalizedEvent {
            uid: self.uid(kind, &start.with_timezone(&Utc), &title),
            kind,
            title,
            start,
            end,
            location,
            links,
        })
    }

    /// Identifier derived from page tag, start instant and title only.
    pub fn uid(&self, kind: PageKind, start: &DateTime<Utc>, title: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update([0x1f]);
        hasher.update(start.to_rfc3339_opts(SecondsFormat::Secs, true).as_bytes());
        hasher.update([0x1f]);
        hasher.update(title.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{}@{}", &digest[..UID_HASH_LEN], self.uid_domain)
    }
}

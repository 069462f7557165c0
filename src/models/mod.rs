// src/models/mod.rs

//! Domain models for the calendar generator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
mod page;
mod record;

// Re-export all public types
pub use config::{CalendarConfig, Config, FetcherConfig, LoggingConfig, SiteConfig};
pub use event::{CalendarDocument, NormalizedEvent};
pub use page::{PageConfig, PageKind, PageLayout};
pub use record::{MeetingLink, RawMeetingRecord};

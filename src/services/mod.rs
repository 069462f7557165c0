//! Service layer for the calendar generator.
//!
//! This module contains the business logic for:
//! - Page retrieval (`HttpFetcher`)
//! - Meeting extraction (`ParsedPage`)
//! - Date and time resolution (`DateTimeNormalizer`)
//! - Event assembly (`EventBuilder`)
//! - Rendering and checking documents (`CalendarSerializer`, `check_calendar`)

mod builder;
mod calendar;
mod checker;
mod extractor;
mod fetcher;
mod normalizer;

pub use builder::EventBuilder;
pub use calendar::CalendarSerializer;
pub use checker::check_calendar;
pub use extractor::ParsedPage;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use normalizer::{DateTimeNormalizer, expand_year, parse_time_range, reference_year};

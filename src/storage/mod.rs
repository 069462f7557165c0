//! Storage abstractions for the generated calendar.
//!
//! The document is published as a single file. Writers report whether the
//! content changed so the automation layer only commits real updates.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;

pub use local::LocalStorage;

/// Result of a storage write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Whether the stored content differs from what was there before
    pub changed: bool,
    /// Size of the written document in bytes
    pub bytes: usize,
}

/// Trait for calendar storage backends.
#[async_trait]
pub trait CalendarStorage: Send + Sync {
    /// Replace the stored calendar with `contents`.
    async fn write_calendar(&self, contents: &str) -> Result<WriteOutcome>;

    /// Load the stored calendar, if any.
    async fn load_calendar(&self) -> Result<Option<String>>;
}

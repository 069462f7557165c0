// src/error.rs

//! Unified error handling for the calendar generator.

use std::fmt;

use thiserror::Error;

/// Result type alias for calendar operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a request failed outright
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A page could not be retrieved after all retries
    #[error("Fetch failed for {url} after {attempts} attempt(s): {message}")]
    Fetch {
        url: String,
        attempts: u32,
        message: String,
    },

    /// A single record could not be turned into an event
    #[error("Parse error for {context}: {message}")]
    Parse { context: String, message: String },

    /// An event reached the serializer in an impossible state
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The rendered document failed the structural check
    #[error("Malformed calendar: {0}")]
    MalformedCalendar(String),

    /// Every configured page failed to fetch
    #[error("No pages could be fetched ({failed} failed)")]
    NoPagesFetched { failed: usize },

    /// Nothing upcoming was found and empty calendars are not allowed
    #[error("No upcoming events found across {pages} page(s)")]
    EmptyCalendar { pages: usize },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, attempts: u32, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            attempts,
            message: message.to_string(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a malformed calendar error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCalendar(message.into())
    }

    /// Whether this error only affects a single page or record.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Parse { .. })
    }
}

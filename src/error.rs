// src/error.rs

//! Unified error handling for the page watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Page could not be fetched after all attempts
    #[error("Fetch failed for {url} after {attempts} attempt(s): {message}")]
    Fetch {
        url: String,
        attempts: u32,
        message: String,
    },

    /// Document could not be traversed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Snapshot store load/persist failure (anything other than "not found")
    #[error("Store error for slot '{slot}': {message}")]
    Store { slot: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

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

    /// Notification delivery failed
    #[error("Notify error: {0}")]
    Notify(String),
}

impl AppError {
    /// Create a fetch error for a URL after the given number of attempts.
    pub fn fetch(url: impl Into<String>, attempts: u32, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            attempts,
            message: message.to_string(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a store error for a slot.
    pub fn store(slot: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Store {
            slot: slot.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// Short machine-readable kind, used in handler responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } | Self::Http(_) => "fetch",
            Self::Parse(_) => "parse",
            Self::Store { .. } => "store",
            Self::Config(_) | Self::Validation(_) | Self::Toml(_) => "config",
            Self::Notify(_) => "notify",
            Self::Io(_) | Self::Json(_) | Self::Url(_) => "internal",
        }
    }
}

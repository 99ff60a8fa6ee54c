// src/models/mod.rs

//! Domain models for the page watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod item;
mod snapshot;

// Re-export all public types
pub use config::{
    Config, FetchConfig, LoggingConfig, MatchMode, NotifyConfig, StorageBackend, StorageConfig,
    WatchConfig,
};
pub use item::{Item, ItemKind, MAX_TITLE_CHARS};
pub use snapshot::{ChangeReport, Snapshot};

// src/lib.rs

//! Keyword page watcher library.
//!
//! Fetches a single page, extracts the fragments that mention the watched
//! keywords, and reports which of them are new since the previous scan.

pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

// src/pipeline/scan.rs

//! Single page scan: fetch, extract, fingerprint.

use std::time::Duration;

use crate::error::Result;
use crate::models::{Config, Snapshot};
use crate::services::ContentExtractor;
use crate::utils::http::Fetcher;
use crate::utils::truncate_chars;

/// A completed scan, not yet compared or persisted.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub snapshot: Snapshot,

    /// Size of the fetched body in bytes
    pub body_len: usize,
}

/// Fetch the configured page and build a snapshot of its matching items.
///
/// Fetch and parse failures are returned before anything touches a store.
pub async fn scan(config: &Config, fetcher: &dyn Fetcher) -> Result<ScanResult> {
    let watch = &config.watch;
    let extractor = ContentExtractor::new(&watch.keywords, watch.match_mode, &watch.target_url)?;

    log::info!(
        "Scanning {} for {} keyword(s) ({:?} mode)",
        watch.target_url,
        watch.keywords.len(),
        watch.match_mode
    );

    let body = fetcher
        .fetch(
            &watch.target_url,
            Duration::from_secs(config.fetch.timeout_secs),
            config.fetch.max_retries,
        )
        .await?;
    let items = extractor.extract_html(&body)?;

    let snapshot = Snapshot::new(items, &watch.target_url);
    log::info!(
        "Scan complete: {} item(s), fingerprint {}",
        snapshot.item_count,
        truncate_chars(&snapshot.fingerprint, 12)
    );

    Ok(ScanResult {
        snapshot,
        body_len: body.len(),
    })
}

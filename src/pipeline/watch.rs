// src/pipeline/watch.rs

//! Full watch run: scan, detect changes, notify.

use serde::Serialize;

use crate::error::Result;
use crate::models::{ChangeReport, Config};
use crate::notify::Notifier;
use crate::pipeline::{detect, scan};
use crate::storage::{MemoryStore, SnapshotStore};
use crate::utils::http::Fetcher;

/// Switches for a single watch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    /// Delete the stored snapshot first, so the run behaves as a first run
    pub force: bool,

    /// Work on an in-memory copy of the store and never notify
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Success,
    /// Snapshot persisted but the notification could not be delivered
    PartialSuccess,
}

/// Summary of a watch run, suitable as a handler response body.
#[derive(Debug, Clone, Serialize)]
pub struct WatchOutcome {
    pub status: WatchStatus,
    pub item_count: usize,
    pub changed: bool,
    pub first_run: bool,
    pub new_item_count: usize,
    pub notification_sent: bool,
    pub message: String,

    #[serde(skip)]
    pub report: ChangeReport,
}

/// Delete the snapshot stored in `slot`.
pub async fn reset(store: &dyn SnapshotStore, slot: &str) -> Result<()> {
    store.delete(slot).await?;
    log::info!("Reset snapshot slot '{}'", slot);
    Ok(())
}

/// Run one scan against the configured page and notify about new items.
///
/// Notification happens only for a changed page with new items, and on a
/// first run only when `notify.notify_first_run` is set. A failed
/// notification does not undo the persisted snapshot.
pub async fn run_watch(
    config: &Config,
    fetcher: &dyn Fetcher,
    store: &dyn SnapshotStore,
    notifier: &dyn Notifier,
    options: WatchOptions,
) -> Result<WatchOutcome> {
    let slot = config.slot();

    let sandbox;
    let store: &dyn SnapshotStore = if options.dry_run {
        log::info!("Dry run: changes are not persisted");
        sandbox = MemoryStore::seeded(slot, store.get(slot).await?);
        &sandbox
    } else {
        store
    };

    if options.force {
        reset(store, slot).await?;
    }

    let scanned = scan(config, fetcher).await?;
    let item_count = scanned.snapshot.item_count;
    let report = detect(scanned.snapshot, store, slot).await?;

    let mut outcome = WatchOutcome {
        status: WatchStatus::Success,
        item_count,
        changed: report.changed,
        first_run: report.first_run,
        new_item_count: report.new_items.len(),
        notification_sent: false,
        message: String::new(),
        report,
    };

    let wants_notice = outcome.report.has_new_items()
        && (!outcome.report.first_run || config.notify.notify_first_run);

    outcome.message = if !outcome.changed {
        "no changes".to_string()
    } else if !wants_notice && outcome.first_run {
        "first run completed, not notified".to_string()
    } else if !wants_notice {
        "page changed with no new items".to_string()
    } else if options.dry_run {
        format!("{} new item(s), dry run not notified", outcome.new_item_count)
    } else {
        match notifier.notify_changes(&outcome.report).await {
            Ok(()) => {
                outcome.notification_sent = true;
                format!("{} new item(s) notified", outcome.new_item_count)
            }
            Err(e) => {
                log::error!("Notification failed: {}", e);
                outcome.status = WatchStatus::PartialSuccess;
                format!("notification failed: {e}")
            }
        }
    };

    log::info!("Watch result: {}", outcome.message);
    Ok(outcome)
}

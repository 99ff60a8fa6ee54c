//! Change notification delivery.
//!
//! The watcher hands a [`ChangeReport`] to a [`Notifier`]; formatting and
//! transport limits are the notifier's business.

mod line;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChangeReport, NotifyConfig};

pub use line::{LineNotifier, MAX_MESSAGE_CHARS, format_changes, truncate_message};

/// Delivers watcher events to a user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce the new items of a change report.
    async fn notify_changes(&self, report: &ChangeReport) -> Result<()>;

    /// Send a connectivity check message.
    async fn notify_test(&self) -> Result<()>;

    /// Report a failed scan.
    async fn notify_error(&self, message: &str) -> Result<()>;
}

/// Notifier that only writes to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_changes(&self, report: &ChangeReport) -> Result<()> {
        log::info!("{} new item(s) detected", report.new_items.len());
        for item in &report.new_items {
            log::info!("  [{}] {} ({})", item.kind, item.title, item.url);
        }
        Ok(())
    }

    async fn notify_test(&self) -> Result<()> {
        log::info!("Test notification (log only)");
        Ok(())
    }

    async fn notify_error(&self, message: &str) -> Result<()> {
        log::error!("Watch failed: {}", message);
        Ok(())
    }
}

/// Build the notifier selected by configuration.
///
/// LINE delivery is used whenever an access token is configured; a token
/// without any recipient is a configuration error.
pub fn build_notifier(config: &NotifyConfig) -> Result<Box<dyn Notifier>> {
    if config.line_enabled() {
        Ok(Box::new(LineNotifier::from_config(config)?))
    } else {
        log::info!("No LINE access token configured, notifications go to the log");
        Ok(Box::new(LogNotifier))
    }
}

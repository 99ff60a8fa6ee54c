//! Pipeline entry points for watcher operations.
//!
//! - `scan`: Fetch the page and build a snapshot
//! - `detect`: Compare a snapshot against the stored one
//! - `run_watch`: Scan, detect and notify in one pass

pub mod diff;
pub mod scan;
pub mod watch;

pub use diff::{detect, new_items};
pub use scan::{ScanResult, scan};
pub use watch::{WatchOptions, WatchOutcome, WatchStatus, reset, run_watch};

// src/lambda/mod.rs

//! AWS Lambda handler for the watcher.
//!
//! Each invocation:
//! 1. Loads configuration (optional TOML file, then environment)
//! 2. Sends a test notification, or
//! 3. Runs a watch (optionally forced) against the configured store

use std::collections::HashMap;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::notify::{Notifier, build_notifier};
use crate::pipeline::{WatchOptions, run_watch};
use crate::storage::build_store;
use crate::utils::http::HttpFetcher;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "PAGEWATCH_CONFIG";

/// Lambda invocation payload.
///
/// Accepts direct flags or API Gateway query parameters with the same names.
#[derive(Debug, Default, Deserialize)]
pub struct WatchRequest {
    /// Send a test notification instead of watching
    #[serde(default)]
    pub test: bool,

    /// Reset the stored snapshot before watching
    #[serde(default)]
    pub force: bool,

    #[serde(default, rename = "queryStringParameters")]
    pub query: Option<HashMap<String, String>>,
}

impl WatchRequest {
    fn flag(&self, name: &str, direct: bool) -> bool {
        direct
            || self
                .query
                .as_ref()
                .and_then(|q| q.get(name))
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    pub fn is_test(&self) -> bool {
        self.flag("test", self.test)
    }

    pub fn is_force(&self) -> bool {
        self.flag("force", self.force)
    }
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<WatchRequest>) -> std::result::Result<Value, LambdaError> {
    let start = std::time::Instant::now();
    let (request, _context) = event.into_parts();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Ok(error_body(&e, start));
        }
    };

    let notifier = match build_notifier(&config.notify) {
        Ok(notifier) => notifier,
        Err(e) => {
            error!("Notifier setup failed: {}", e);
            return Ok(error_body(&e, start));
        }
    };

    let result = if request.is_test() {
        info!("Running in test mode");
        notifier
            .notify_test()
            .await
            .map(|()| json!({ "status": "success", "mode": "test" }))
    } else {
        info!(force = request.is_force(), "Running watch");
        watch(&config, notifier.as_ref(), request.is_force()).await
    };

    match result {
        Ok(mut body) => {
            body["execution_time_ms"] = json!(start.elapsed().as_millis() as u64);
            Ok(body)
        }
        Err(e) => {
            error!("Watch failed: {}", e);
            if let Err(notify_err) = notifier.notify_error(&e.to_string()).await {
                warn!("Error notification failed: {}", notify_err);
            }
            Ok(error_body(&e, start))
        }
    }
}

fn load_config() -> Result<Config> {
    let mut config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => Config::load(&path)?,
        Err(_) => Config::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

async fn watch(config: &Config, notifier: &dyn Notifier, force: bool) -> Result<Value> {
    let store = build_store(config).await?;
    let fetcher = HttpFetcher::from_config(&config.fetch)?;
    let options = WatchOptions {
        force,
        dry_run: false,
    };

    let outcome = run_watch(config, &fetcher, store.as_ref(), notifier, options).await?;
    info!(
        "Watch complete: {} items, {} new, notified={}",
        outcome.item_count, outcome.new_item_count, outcome.notification_sent
    );

    let mut body = serde_json::to_value(&outcome)?;
    body["mode"] = json!(if force { "force" } else { "watch" });
    Ok(body)
}

fn error_body(err: &AppError, start: std::time::Instant) -> Value {
    json!({
        "status": "error",
        "error_kind": err.kind(),
        "error": err.to_string(),
        "execution_time_ms": start.elapsed().as_millis() as u64,
    })
}

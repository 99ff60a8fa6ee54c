//! pagewatch CLI
//!
//! Local execution entry point. For AWS Lambda, use `pagewatch-lambda`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagewatch::{
    error::{AppError, Result},
    models::Config,
    notify::{Notifier, build_notifier},
    pipeline::{self, WatchOptions},
    storage::{SnapshotStore, build_store},
    utils::http::HttpFetcher,
};

/// pagewatch - keyword page watcher
#[derive(Parser, Debug)]
#[command(
    name = "pagewatch",
    version,
    about = "Watches a web page for keyword mentions"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "pagewatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and extract once, print the items, persist nothing
    Scan,

    /// Scan, compare with the stored snapshot and notify about new items
    Watch {
        /// Reset the stored snapshot first
        #[arg(long)]
        force: bool,

        /// Do not persist or notify
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete the stored snapshot
    Reset,

    /// Validate configuration
    Validate,

    /// Show stored snapshot info
    Info,

    /// Send a test notification
    NotifyTest,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// File settings (when the file exists) with environment overrides on top.
fn load_config(path: &PathBuf) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load(path)?
    } else {
        Config::default()
    };
    config.apply_env();
    Ok(config)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(cli.verbose, &config.logging.level);

    if !cli.config.exists() {
        log::info!(
            "No config file at {}, using defaults and environment",
            cli.config.display()
        );
    }

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    match cli.command {
        Command::Scan => {
            let fetcher = HttpFetcher::from_config(&config.fetch)?;
            let result = pipeline::scan(&config, &fetcher).await?;

            for item in &result.snapshot.items {
                println!("[{}] {}", item.kind, item.title);
                println!("    {}", item.url);
            }
            log::info!(
                "{} item(s) from {} bytes, fingerprint {}",
                result.snapshot.item_count,
                result.body_len,
                result.snapshot.fingerprint
            );
        }

        Command::Watch { force, dry_run } => {
            let fetcher = HttpFetcher::from_config(&config.fetch)?;
            let store = build_store(&config).await?;
            let notifier = build_notifier(&config.notify)?;
            let options = WatchOptions { force, dry_run };

            match pipeline::run_watch(&config, &fetcher, store.as_ref(), notifier.as_ref(), options)
                .await
            {
                Ok(outcome) => {
                    for item in &outcome.report.new_items {
                        println!("NEW [{}] {}", item.kind, item.title);
                    }
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                }
                Err(e) => {
                    log::error!("Watch failed: {}", e);
                    if !dry_run {
                        if let Err(notify_err) = notifier.notify_error(&e.to_string()).await {
                            log::warn!("Error notification failed: {}", notify_err);
                        }
                    }
                    return Err(e);
                }
            }
        }

        Command::Reset => {
            let store = build_store(&config).await?;
            pipeline::reset(store.as_ref(), config.slot()).await?;
            log::info!("Snapshot reset");
        }

        Command::Validate => {
            log::info!("✓ Config OK");
            log::info!("  Target: {}", config.watch.target_url);
            log::info!(
                "  Keywords ({:?}): {}",
                config.watch.match_mode,
                config.watch.keywords.join(", ")
            );
            log::info!("  Storage: {:?} ({})", config.storage.backend, config.slot());
        }

        Command::Info => {
            let store = build_store(&config).await?;
            match store.get(config.slot()).await? {
                Some(snapshot) => {
                    log::info!("Snapshot: {}", config.slot());
                    log::info!("  Source: {}", snapshot.source_url);
                    log::info!("  Captured at: {}", snapshot.captured_at);
                    log::info!("  Items: {}", snapshot.item_count);
                    log::info!("  Fingerprint: {}", snapshot.fingerprint);
                }
                None => log::info!("No snapshot stored in {}", config.slot()),
            }
        }

        Command::NotifyTest => {
            if !config.notify.line_enabled() {
                return Err(AppError::config(
                    "LINE_CHANNEL_ACCESS_TOKEN is not configured",
                ));
            }
            build_notifier(&config.notify)?.notify_test().await?;
            log::info!("Test notification sent");
        }
    }

    Ok(())
}

//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Target page and keyword policy
    #[serde(default)]
    pub watch: WatchConfig,

    /// HTTP fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Snapshot persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification delivery
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TARGET_URL") {
            self.watch.target_url = url;
        }
        if let Some(mode) = lookup("KEYWORD_MATCH_MODE") {
            match mode.parse() {
                Ok(mode) => self.watch.match_mode = mode,
                Err(e) => log::warn!("Ignoring KEYWORD_MATCH_MODE: {}", e),
            }
        }
        if let Some(agent) = lookup("USER_AGENT") {
            self.fetch.user_agent = agent;
        }
        if let Some(timeout) = lookup("REQUEST_TIMEOUT") {
            match timeout.parse() {
                Ok(secs) => self.fetch.timeout_secs = secs,
                Err(_) => log::warn!("Ignoring non-numeric REQUEST_TIMEOUT={}", timeout),
            }
        }
        if let Some(retries) = lookup("MAX_RETRIES") {
            match retries.parse() {
                Ok(n) => self.fetch.max_retries = n,
                Err(_) => log::warn!("Ignoring non-numeric MAX_RETRIES={}", retries),
            }
        }
        if let Some(path) = lookup("STATE_FILE") {
            self.storage.state_file = path;
        }
        if let Some(flag) = lookup("USE_CLOUD_STORAGE") {
            self.storage.backend = if flag.eq_ignore_ascii_case("true") {
                StorageBackend::S3
            } else {
                StorageBackend::Local
            };
        }
        if let Some(bucket) = lookup("S3_BUCKET") {
            self.storage.s3_bucket = bucket;
        }
        if let Some(key) = lookup("S3_STATE_KEY") {
            self.storage.s3_key = key;
        }
        if let Some(token) = lookup("LINE_CHANNEL_ACCESS_TOKEN") {
            self.notify.line_channel_access_token = token;
        }
        if let Some(user) = lookup("LINE_USER_ID") {
            self.notify.line_user_id = user;
        }
        if let Some(group) = lookup("LINE_GROUP_ID") {
            self.notify.line_group_id = group;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
    }

    /// Validate configuration values before any scan runs.
    pub fn validate(&self) -> Result<()> {
        let target = self.watch.target_url.trim();
        if target.is_empty() {
            return Err(AppError::validation("watch.target_url is empty"));
        }
        url::Url::parse(target).map_err(|e| {
            AppError::validation(format!("watch.target_url '{target}' is invalid: {e}"))
        })?;
        if self.watch.keywords.is_empty() {
            return Err(AppError::validation("No keywords defined"));
        }
        if self.watch.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(AppError::validation("watch.keywords contains a blank entry"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_retries == 0 {
            return Err(AppError::validation("fetch.max_retries must be > 0"));
        }
        match self.storage.backend {
            StorageBackend::Local if self.storage.state_file.trim().is_empty() => {
                return Err(AppError::validation("storage.state_file is empty"));
            }
            StorageBackend::S3 if self.storage.s3_bucket.trim().is_empty() => {
                return Err(AppError::validation(
                    "storage.s3_bucket is required for the s3 backend",
                ));
            }
            _ => {}
        }
        Ok(())
    }

    /// Logical slot the snapshot is stored under for the configured backend.
    pub fn slot(&self) -> &str {
        match self.storage.backend {
            StorageBackend::Local => &self.storage.state_file,
            StorageBackend::S3 => &self.storage.s3_key,
        }
    }
}

/// How multiple keywords combine when testing a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// At least one keyword must appear
    #[default]
    Any,
    /// Every keyword must appear
    All,
}

impl FromStr for MatchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            other => Err(AppError::config(format!(
                "match mode must be 'any' or 'all', got '{other}'"
            ))),
        }
    }
}

/// Target page and keyword policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// The single page to inspect
    #[serde(default = "defaults::target_url")]
    pub target_url: String,

    /// Ordered keyword list
    #[serde(default = "defaults::keywords")]
    pub keywords: Vec<String>,

    /// Keyword combination policy
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            target_url: defaults::target_url(),
            keywords: defaults::keywords(),
            match_mode: MatchMode::default(),
        }
    }
}

/// HTTP fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-attempt timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Total number of attempts before giving up
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            retry_delay_ms: 0,
        }
    }
}

/// Which snapshot store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    S3,
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Local state file path (local backend)
    #[serde(default = "defaults::state_file")]
    pub state_file: String,

    /// Bucket name (s3 backend)
    #[serde(default)]
    pub s3_bucket: String,

    /// Optional key prefix (s3 backend)
    #[serde(default)]
    pub s3_prefix: String,

    /// Object key of the snapshot (s3 backend)
    #[serde(default = "defaults::s3_key")]
    pub s3_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            state_file: defaults::state_file(),
            s3_bucket: String::new(),
            s3_prefix: String::new(),
            s3_key: defaults::s3_key(),
        }
    }
}

/// Notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    #[serde(default)]
    pub line_channel_access_token: String,

    #[serde(default)]
    pub line_user_id: String,

    /// Takes precedence over `line_user_id` when set
    #[serde(default)]
    pub line_group_id: String,

    /// Also notify on the very first scan
    #[serde(default)]
    pub notify_first_run: bool,
}

impl NotifyConfig {
    /// Whether LINE delivery has enough settings to be attempted.
    pub fn line_enabled(&self) -> bool {
        !self.line_channel_access_token.trim().is_empty()
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    pub fn target_url() -> String {
        "https://store-jp.nintendo.com/".into()
    }
    pub fn keywords() -> Vec<String> {
        [
            "Switch2",
            "Switch 2",
            "Nintendo Switch 2",
            "多言語",
            "多言語対応",
            "抽選",
            "抽選販売",
            "招待販売",
            "申込み",
            "申し込み",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_retries() -> u32 {
        3
    }

    // Storage defaults
    pub fn state_file() -> String {
        "switch2_state.json".into()
    }
    pub fn s3_key() -> String {
        "switch2_lottery_state.json".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_keywords() {
        let mut config = Config::default();
        config.watch.keywords.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_keyword() {
        let mut config = Config::default();
        config.watch.keywords.push("  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = Config::default();
        config.watch.target_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_retries() {
        let mut config = Config::default();
        config.fetch.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_s3_without_bucket() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::S3;
        assert!(config.validate().is_err());
        config.storage.s3_bucket = "watch-state".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_partial() {
        let toml = r#"
            [watch]
            target_url = "https://example.com/"
            keywords = ["a", "b"]
            match_mode = "all"

            [fetch]
            max_retries = 5
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.watch.match_mode, MatchMode::All);
        assert_eq!(config.watch.keywords, vec!["a", "b"]);
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.storage.state_file, "switch2_state.json");
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("pagewatch.toml");
        fs::write(&path, "[storage]\nstate_file = \"data/state.json\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.slot(), "data/state.json");
        assert_eq!(config.watch.target_url, "https://store-jp.nintendo.com/");
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = Config::load_or_default("/nonexistent/pagewatch.toml");
        assert_eq!(config.fetch.max_retries, 3);
    }

    #[test]
    fn test_match_mode_from_str() {
        assert_eq!("ALL".parse::<MatchMode>().unwrap(), MatchMode::All);
        assert_eq!("any".parse::<MatchMode>().unwrap(), MatchMode::Any);
        assert!("some".parse::<MatchMode>().is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TARGET_URL", "https://example.com/watch"),
            ("KEYWORD_MATCH_MODE", "all"),
            ("REQUEST_TIMEOUT", "10"),
            ("MAX_RETRIES", "oops"),
            ("USE_CLOUD_STORAGE", "True"),
            ("S3_BUCKET", "bucket"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.watch.target_url, "https://example.com/watch");
        assert_eq!(config.watch.match_mode, MatchMode::All);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.slot(), "switch2_lottery_state.json");
    }
}

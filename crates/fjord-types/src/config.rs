//! Configuration loading for fjord.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `~/.config/fjord/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::FjordError;

/// Retry schedule for live (un)indexing jobs.
///
/// `times_secs` and `max_retries` are configured separately; `validate`
/// rejects a bound that the table cannot serve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Delay before each retry, indexed by attempt number
    #[serde(default = "default_retry_times")]
    pub times_secs: Vec<u64>,

    /// Number of retries before a failure is propagated
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Extra random delay added to each retry (0 = exact table values)
    #[serde(default)]
    pub max_jitter_secs: u64,
}

fn default_retry_times() -> Vec<u64> {
    vec![
        60,      // 1 minute
        5 * 60,  // 5 minutes
        10 * 60, // 10 minutes
        30 * 60, // 30 minutes
        60 * 60, // 60 minutes
    ]
}

fn default_max_retries() -> u32 {
    5
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            times_secs: default_retry_times(),
            max_retries: default_max_retries(),
            max_jitter_secs: 0,
        }
    }
}

impl RetrySettings {
    /// Validate the retry bound against the backoff table.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries as usize > self.times_secs.len() {
            return Err(format!(
                "max_retries ({}) exceeds the number of retry delays ({})",
                self.max_retries,
                self.times_secs.len()
            ));
        }
        Ok(())
    }
}

/// Batch reindex settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexSettings {
    /// Number of entities per chunk job
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    5000
}

impl Default for ReindexSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Operator notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifySettings {
    /// Webhook that receives operator notifications as JSON.
    /// When unset, notifications are only logged.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the RocksDB primary store
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Path for a RocksDB secondary instance used as read replica
    #[serde(default)]
    pub replica_db_path: Option<String>,

    /// Directory holding one Tantivy index per index name
    #[serde(default = "default_search_index_path")]
    pub search_index_path: String,

    /// Name of the index live and batch indexing write into
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enqueue (un)indexing jobs on entity save/delete
    #[serde(default = "default_live_index")]
    pub live_index: bool,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub reindex: ReindexSettings,

    #[serde(default)]
    pub notify: NotifySettings,
}

fn data_dir(name: &str) -> String {
    ProjectDirs::from("", "", "fjord")
        .map(|p| p.data_local_dir().join(name))
        .unwrap_or_else(|| PathBuf::from(format!("./{}", name)))
        .to_string_lossy()
        .to_string()
}

fn default_db_path() -> String {
    data_dir("db")
}

fn default_search_index_path() -> String {
    data_dir("search-index")
}

fn default_index_name() -> String {
    "feedback".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_live_index() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            replica_db_path: None,
            search_index_path: default_search_index_path(),
            index_name: default_index_name(),
            log_level: default_log_level(),
            live_index: default_live_index(),
            retry: RetrySettings::default(),
            reindex: ReindexSettings::default(),
            notify: NotifySettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/fjord/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (FJORD_*, nested keys with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, FjordError> {
        let config_dir = ProjectDirs::from("", "", "fjord")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let retry_times: Vec<i64> = default_retry_times().into_iter().map(|t| t as i64).collect();

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| FjordError::Config(e.to_string()))?
            .set_default("search_index_path", default_search_index_path())
            .map_err(|e| FjordError::Config(e.to_string()))?
            .set_default("index_name", default_index_name())
            .map_err(|e| FjordError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| FjordError::Config(e.to_string()))?
            .set_default("live_index", default_live_index())
            .map_err(|e| FjordError::Config(e.to_string()))?
            .set_default("retry.times_secs", retry_times)
            .map_err(|e| FjordError::Config(e.to_string()))?
            .set_default("retry.max_retries", default_max_retries() as i64)
            .map_err(|e| FjordError::Config(e.to_string()))?
            .set_default("reindex.chunk_size", default_chunk_size() as i64)
            .map_err(|e| FjordError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: FJORD_DB_PATH, FJORD_LIVE_INDEX, FJORD_RETRY__MAX_RETRIES, etc.
        builder = builder.add_source(
            Environment::with_prefix("FJORD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| FjordError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| FjordError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values that would otherwise fail at job time.
    pub fn validate(&self) -> Result<(), FjordError> {
        self.retry.validate().map_err(FjordError::Config)?;
        if self.reindex.chunk_size == 0 {
            return Err(FjordError::Config("reindex.chunk_size must be > 0".to_string()));
        }
        if self.index_name.trim().is_empty() {
            return Err(FjordError::Config("index_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }

    /// Expand ~ in replica_db_path, if configured
    pub fn expanded_replica_db_path(&self) -> Option<PathBuf> {
        self.replica_db_path.as_deref().map(expand_home)
    }

    /// Expand ~ in search_index_path
    pub fn expanded_search_index_path(&self) -> PathBuf {
        expand_home(&self.search_index_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.index_name, "feedback");
        assert!(settings.live_index);
        assert_eq!(settings.retry.times_secs, vec![60, 300, 600, 1800, 3600]);
        assert_eq!(settings.retry.max_retries, 5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fjord.toml");
        std::fs::write(
            &path,
            r#"
index_name = "feedback_test"
live_index = false

[retry]
times_secs = [1, 2, 3]
max_retries = 3

[reindex]
chunk_size = 10
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.index_name, "feedback_test");
        assert!(!settings.live_index);
        assert_eq!(settings.retry.times_secs, vec![1, 2, 3]);
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.reindex.chunk_size, 10);
    }

    #[test]
    fn test_retry_bound_larger_than_table_rejected() {
        let settings = Settings {
            retry: RetrySettings {
                times_secs: vec![60, 300],
                max_retries: 5,
                max_jitter_secs: 0,
            },
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("max_retries"));
    }

    #[test]
    fn test_retry_bound_smaller_than_table_allowed() {
        let retry = RetrySettings {
            max_retries: 2,
            ..Default::default()
        };
        assert!(retry.validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let settings = Settings {
            reindex: ReindexSettings { chunk_size: 0 },
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_expand_plain_path() {
        let settings = Settings {
            db_path: "/var/lib/fjord/db".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.expanded_db_path(), PathBuf::from("/var/lib/fjord/db"));
        assert!(settings.expanded_replica_db_path().is_none());
    }
}

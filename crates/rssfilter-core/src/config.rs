//! Configuration types for rssfilter.
//!
//! [`Settings::load`] layers, lowest priority first: the embedded defaults,
//! an optional settings file (`rssfilter.toml` in the working directory, or
//! an explicit path in TOML, JSON or YAML), environment variables prefixed
//! `RSSFILTER__` (`RSSFILTER__RSS_FILTER__INPUT_SOURCE=…`), then command-line
//! overrides. [`Settings::defaults`] returns the embedded defaults without
//! touching the filesystem (useful in tests).

use crate::rules::{CleanupRule, SplitRule};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
port = 5000

[rss_filter]
input_source   = ""
tags_to_remove = []
cleanup_tags   = false
tag_cleanup    = []
tag_split      = []

[[rss_filter.tag_cleanup_settings]]
tag_name        = "title"
cleanup_pattern = '\sS\d{2}E\d{2}.*'

[[rss_filter.tag_cleanup_settings]]
tag_name        = "description"
cleanup_pattern = '\s\d{3,4}p.*'

[monitor]
max_attempts         = 3
retry_delay_secs     = 5
poll_interval_secs   = 300
request_timeout_secs = 30

[logger]
log_directory       = "logs"
max_file_size_bytes = 102400
buffer_size         = 50
"#;

const DEFAULT_SETTINGS_FILE: &str = "rssfilter.toml";
const ENV_PREFIX: &str = "RSSFILTER";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub rss_filter: RssFilterSettings,
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub logger: LoggerSettings,
}

fn default_port() -> u16 { 5000 }

/// `[rss_filter]` section: the upstream and the rule set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RssFilterSettings {
    #[serde(default)]
    pub input_source: String,
    #[serde(default)]
    pub tags_to_remove: Vec<String>,
    #[serde(default)]
    pub cleanup_tags: bool,
    /// Legacy cleanup list, applied before `tag_cleanup`.
    #[serde(default)]
    pub tag_cleanup_settings: Vec<CleanupRule>,
    #[serde(default)]
    pub tag_cleanup: Vec<CleanupRule>,
    #[serde(default)]
    pub tag_split: Vec<SplitRule>,
}

/// `[monitor]` section: retry and polling cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_attempts() -> u32 { 3 }
fn default_retry_delay_secs() -> u64 { 5 }
fn default_poll_interval_secs() -> u64 { 300 }
fn default_request_timeout_secs() -> u64 { 30 }

impl MonitorSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// `[logger]` section: where stream files live and how large they grow.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerSettings {
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    /// Lines dropped per trim.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_log_directory() -> PathBuf { PathBuf::from("logs") }
fn default_max_file_size_bytes() -> u64 { 100 * 1024 }
fn default_buffer_size() -> usize { 50 }

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            log_directory: default_log_directory(),
            max_file_size_bytes: default_max_file_size_bytes(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Command-line values that win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub input_source: Option<String>,
}

impl Settings {
    /// Load settings from every source. `path`, when given, must exist;
    /// otherwise `rssfilter.toml` is read if present.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("rss_filter.tags_to_remove")
                    .try_parsing(true),
            )
            .set_override_option("port", overrides.port.map(i64::from))?
            .set_override_option("rss_filter.input_source", overrides.input_source.clone())?
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rss_filter.input_source.trim().is_empty() {
            anyhow::bail!("rss_filter.input_source must be set to the upstream feed URL");
        }
        if self.monitor.max_attempts == 0 {
            anyhow::bail!("monitor.max_attempts must be at least 1");
        }
        if self.logger.buffer_size == 0 {
            anyhow::bail!("logger.buffer_size must be at least 1");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_load() {
        let cfg = Settings::defaults();
        assert_eq!(cfg.port, 5000);
        assert!(!cfg.rss_filter.cleanup_tags);
        assert_eq!(cfg.monitor.max_attempts, 3);
        assert_eq!(cfg.monitor.retry_delay(), Duration::from_secs(5));
        assert_eq!(cfg.monitor.poll_interval(), Duration::from_secs(300));
        assert_eq!(cfg.logger.max_file_size_bytes, 102_400);
        assert_eq!(cfg.logger.buffer_size, 50);
        assert_eq!(
            cfg.rss_filter.tag_cleanup_settings,
            vec![
                CleanupRule::new("title", r"\sS\d{2}E\d{2}.*"),
                CleanupRule::new("description", r"\s\d{3,4}p.*"),
            ]
        );
    }

    #[test]
    fn file_layers_over_defaults_and_keeps_split_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
port = 8080

[rss_filter]
input_source   = "https://example.com/rss"
tags_to_remove = ["guid", "media:thumbnail"]
cleanup_tags   = true

[[rss_filter.tag_split]]
tag_name      = "title"
split_pattern = '(.+) S(\d{2})E(\d{2})'
new_tags      = { title = "$1", season = "$2", description = "S$2" }

[logger]
buffer_size = 5
"#,
        )
        .unwrap();

        let cfg = Settings::load(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.rss_filter.tags_to_remove, ["guid", "media:thumbnail"]);
        let split = &cfg.rss_filter.tag_split[0];
        let keys: Vec<_> = split.new_tags.keys().map(String::as_str).collect();
        assert_eq!(keys, ["title", "season", "description"]);
        assert_eq!(cfg.logger.buffer_size, 5);
        assert_eq!(cfg.logger.max_file_size_bytes, 102_400);
        assert_eq!(cfg.rss_filter.tag_cleanup_settings.len(), 2);
    }

    #[test]
    fn overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "port": 7000, "rss_filter": { "input_source": "a" } }"#)
            .unwrap();
        let overrides = Overrides {
            port: Some(9000),
            input_source: Some("https://override.example/rss".into()),
        };
        let cfg = Settings::load(Some(&path), &overrides).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.rss_filter.input_source, "https://override.example/rss");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load(Some(&path), &Overrides::default()).is_err());
    }

    #[test]
    fn validate_requires_input_source() {
        let mut cfg = Settings::defaults();
        assert!(cfg.validate().is_err());
        cfg.rss_filter.input_source = "https://example.com/rss".into();
        assert!(cfg.validate().is_ok());
        cfg.monitor.max_attempts = 0;
        assert!(cfg.validate().is_err());
    }
}

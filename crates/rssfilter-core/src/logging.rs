//! Bounded append-only log files, one per named stream.
//!
//! Every [`BoundedLog::log`] call takes the stream's lock, creates the file
//! (and its directory) if needed, trims the oldest `trim_batch_size` lines
//! when the file has grown past `max_size_bytes`, then appends
//! `"<timestamp> - <message>"`. Writers to different streams never contend.
//!
//! Logging never fails the caller. I/O errors are reported through
//! `tracing::error!` and swallowed.
//!
//! # File format
//!
//! ```text
//! 2026-10-16 09:15:00 - Attempt 1 to fetch RSS feed from https://example.com/rss
//! 2026-10-16 09:15:01 - [LOG TRIMMED: Removed 50 oldest entries to maintain size limit]
//! ```

use crate::config::LoggerSettings;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Timestamp format shared by entries and trim markers.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shared handle to one stream.
pub type LogHandle = Arc<BoundedLog>;

/// A size-capped log file.
#[derive(Debug)]
pub struct BoundedLog {
    name: String,
    path: PathBuf,
    max_size_bytes: u64,
    trim_batch_size: usize,
    lock: Mutex<()>,
}

impl BoundedLog {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        max_size_bytes: u64,
        trim_batch_size: usize,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            max_size_bytes,
            trim_batch_size,
            lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped entry.
    pub fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::debug!(stream = %self.name, "{message}");

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = self.append(message) {
            tracing::error!(
                stream = %self.name,
                path = %self.path.display(),
                error = %err,
                "failed to write to log file"
            );
        }
    }

    fn append(&self, message: &str) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let len = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .metadata()?
            .len();

        if len > self.max_size_bytes {
            if let Err(err) = self.trim_oldest() {
                tracing::error!(
                    stream = %self.name,
                    error = %err,
                    "failed to trim log file"
                );
            }
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{} - {message}", timestamp())
    }

    /// Drop the oldest `trim_batch_size` lines and note it with a marker.
    /// Files with no more lines than the batch are left alone.
    fn trim_oldest(&self) -> io::Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let lines: Vec<&str> = contents.lines().collect();
        if lines.len() <= self.trim_batch_size {
            return Ok(());
        }

        let mut kept = String::with_capacity(contents.len());
        for line in &lines[self.trim_batch_size..] {
            kept.push_str(line);
            kept.push('\n');
        }
        kept.push_str(&format!(
            "{} - [LOG TRIMMED: Removed {} oldest entries to maintain size limit]\n",
            timestamp(),
            self.trim_batch_size
        ));
        fs::write(&self.path, kept)
    }
}

fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Hands out one [`BoundedLog`] per stream name, rooted at the configured
/// log directory. Repeated requests for a name share the same lock.
#[derive(Debug)]
pub struct LogFactory {
    settings: LoggerSettings,
    streams: Mutex<HashMap<String, LogHandle>>,
}

impl LogFactory {
    pub fn new(settings: LoggerSettings) -> Self {
        Self {
            settings,
            streams: Mutex::new(HashMap::new()),
        }
    }

    /// Handle bound to `<log_directory>/<name>.log`.
    pub fn create_logger(&self, name: &str) -> LogHandle {
        let mut streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        streams
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(BoundedLog::new(
                    name,
                    self.settings.log_directory.join(format!("{name}.log")),
                    self.settings.max_file_size_bytes,
                    self.settings.buffer_size,
                ))
            })
            .clone()
    }

    /// Append to a stream by name.
    pub fn log(&self, name: &str, message: impl AsRef<str>) {
        self.create_logger(name).log(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(dir: &Path) -> LoggerSettings {
        LoggerSettings {
            log_directory: dir.to_path_buf(),
            ..LoggerSettings::default()
        }
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/monitor.log");
        let log = BoundedLog::new("monitor", &path, 1024, 10);
        log.log("hello");
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with(" - hello\n"), "{contents:?}");
    }

    #[test]
    fn entries_are_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let log = BoundedLog::new("monitor", dir.path().join("m.log"), 1024, 10);
        log.log("first");
        let contents = fs::read_to_string(log.path()).unwrap();
        let (stamp, message) = contents.trim_end().split_once(" - ").unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(message, "first");
    }

    #[test]
    fn small_file_is_not_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let log = BoundedLog::new("monitor", dir.path().join("m.log"), 1, 50);
        for i in 0..5 {
            log.log(format!("entry {i}"));
        }
        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents.lines().count(), 5);
        assert!(!contents.contains("LOG TRIMMED"));
    }

    #[test]
    fn factory_shares_streams_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let factory = LogFactory::new(settings(dir.path()));
        let a = factory.create_logger("update");
        let b = factory.create_logger("update");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.path(), dir.path().join("update.log"));
        factory.log("monitor", "via name");
        let contents = fs::read_to_string(dir.path().join("monitor.log")).unwrap();
        assert!(contents.contains("via name"));
    }

    #[test]
    fn unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let log = BoundedLog::new("monitor", blocker.join("m.log"), 1024, 10);
        log.log("swallowed");
    }
}

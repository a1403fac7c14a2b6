//! Feed cache — a single slot holding the latest transformed feed.
//!
//! The slot is swapped wholesale under a lock, so readers always see one
//! complete `(text, updated_at)` pair. Both operations record an entry in
//! the `update` log stream, outside the lock.

use crate::logging::LogHandle;
use chrono::{DateTime, Local};
use std::sync::{Arc, PoisonError, RwLock};

/// Log stream used by the cache.
pub const UPDATE_STREAM: &str = "update";

/// The most recently stored feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestFeed {
    pub text: String,
    /// `None` until the first store.
    pub updated_at: Option<DateTime<Local>>,
}

#[derive(Debug)]
pub struct FeedCache {
    latest: RwLock<Arc<LatestFeed>>,
    log: LogHandle,
}

impl FeedCache {
    pub fn new(log: LogHandle) -> Self {
        Self {
            latest: RwLock::new(Arc::new(LatestFeed::default())),
            log,
        }
    }

    /// Replace the cached feed and stamp it with the current time.
    pub fn store(&self, text: impl Into<String>) {
        let updated_at = Local::now();
        let feed = Arc::new(LatestFeed {
            text: text.into(),
            updated_at: Some(updated_at),
        });
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = feed;
        self.log.log(format!("Feed updated at {}", display_time(Some(updated_at))));
    }

    /// The cached text, or an empty string if nothing was stored yet.
    pub fn load(&self) -> String {
        let latest = self.snapshot();
        self.log.log(format!(
            "Feed requested. Last updated: {}",
            display_time(latest.updated_at)
        ));
        latest.text.clone()
    }

    /// Text and timestamp together, without logging.
    pub fn snapshot(&self) -> Arc<LatestFeed> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn display_time(at: Option<DateTime<Local>>) -> String {
    match at {
        Some(at) => at.format(crate::logging::TIMESTAMP_FORMAT).to_string(),
        None => "never".to_string(),
    }
}

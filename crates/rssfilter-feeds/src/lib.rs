//! rssfilter-feeds — upstream feed sources and the resilient fetch loop.
//!
//! A [`FeedSource`] yields raw feed text. The [`FeedMonitor`] fetches it,
//! parses and transforms it, retries transient failures according to its
//! [`RetryPolicy`], and stores each success in the shared feed cache. The
//! same cycle runs on a timer ([`FeedMonitor::run`]) and on demand
//! ([`FeedMonitor::update_cached_feed`]).

pub mod http;
pub mod monitor;
pub mod retry;

pub use http::HttpFeedSource;
pub use monitor::{FeedMonitor, MONITOR_STREAM};
pub use retry::RetryPolicy;

use rssfilter_core::FeedError;
use std::future::Future;

/// Where raw feed text comes from.
pub trait FeedSource: Send + Sync {
    /// Human-readable location, used in log lines.
    fn location(&self) -> &str;

    /// Retrieve the raw feed text.
    fn fetch(&self) -> impl Future<Output = Result<String, FeedError>> + Send;
}

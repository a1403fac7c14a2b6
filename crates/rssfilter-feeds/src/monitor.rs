//! Feed monitor — the fetch → parse → transform → store cycle.
//!
//! # Cycle
//!
//! [`FeedMonitor::update_cached_feed`] is the single cycle. It is driven by
//! the poll loop in [`FeedMonitor::run`] and called directly for manual
//! refreshes; the two may overlap, and the cache tolerates concurrent
//! stores. A failed cycle leaves the cache untouched.
//!
//! # Cancellation
//!
//! Fetches and retry delays race the caller's [`CancellationToken`]. Log
//! writes and the cache store are synchronous, so a cancellation never
//! interrupts them half-way.

use crate::{FeedSource, RetryPolicy};
use rssfilter_core::logging::{LogHandle, TIMESTAMP_FORMAT};
use rssfilter_core::{transform, Document, FeedCache, FeedError, RuleSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Log stream used by the monitor and the transformation engine.
pub const MONITOR_STREAM: &str = "monitor";

/// Time between scheduled cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

const SNIPPET_CHARS: usize = 100;

pub struct FeedMonitor<S> {
    source: S,
    rules: RuleSet,
    cache: Arc<FeedCache>,
    log: LogHandle,
    retry: RetryPolicy,
    poll_interval: Duration,
}

impl<S: FeedSource> FeedMonitor<S> {
    pub fn new(source: S, rules: RuleSet, cache: Arc<FeedCache>, log: LogHandle) -> Self {
        Self {
            source,
            rules,
            cache,
            log,
            retry: RetryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &Arc<FeedCache> {
        &self.cache
    }

    /// One attempt: fetch, reject empty content, parse, transform.
    pub async fn fetch_and_process(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Document, FeedError> {
        let content = tokio::select! {
            _ = cancel.cancelled() => return Err(FeedError::Cancelled),
            fetched = self.source.fetch() => fetched?,
        };

        if content.trim().is_empty() {
            return Err(FeedError::EmptyContent);
        }

        let mut doc = Document::parse(&content).inspect_err(|err| {
            let snippet: String = content.chars().take(SNIPPET_CHARS).collect();
            self.log.log(err.to_string());
            self.log.log(format!("RSS content snippet: {snippet}..."));
        })?;

        let report = transform(&mut doc, &self.rules, &self.log);
        tracing::debug!(
            removed = report.removed,
            split = report.split,
            cleaned = report.cleaned,
            skipped = report.skipped.len(),
            "feed transformed"
        );
        Ok(doc)
    }

    /// Run [`fetch_and_process`](Self::fetch_and_process) until it succeeds,
    /// fails with a non-retriable error, or runs out of attempts.
    pub async fn fetch_with_retry(&self, cancel: &CancellationToken) -> Result<Document, FeedError> {
        let mut last_error = None;

        for attempt in 1..=self.retry.max_attempts {
            self.log.log(format!(
                "Attempt {attempt} to fetch RSS feed from {}",
                self.source.location()
            ));

            let err = match self.fetch_and_process(cancel).await {
                Ok(doc) => return Ok(doc),
                Err(err) if err.is_retriable() => err,
                Err(err) => {
                    self.log
                        .log(format!("Non-retriable error on attempt {attempt}: {err}"));
                    return Err(err);
                }
            };

            self.log.log(format!(
                "Attempt {attempt} failed: {err}. Retrying in {} seconds...",
                self.retry.retry_delay.as_secs()
            ));
            last_error = Some(err);

            if self.retry.should_retry(attempt) {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(FeedError::Cancelled),
                    _ = tokio::time::sleep(self.retry.retry_delay) => {}
                }
            }
        }

        self.log.log(format!(
            "Failed to fetch RSS feed after {} attempts",
            self.retry.max_attempts
        ));
        Err(last_error.unwrap_or(FeedError::RetriesExhausted(self.retry.max_attempts)))
    }

    /// One full cycle. On success the serialized document replaces the
    /// cached feed; on failure the cache keeps its previous value.
    pub async fn update_cached_feed(&self, cancel: &CancellationToken) -> Result<(), FeedError> {
        match self.fetch_with_retry(cancel).await {
            Ok(doc) => {
                self.cache.store(doc.to_xml_string());
                Ok(())
            }
            Err(err) => {
                self.log
                    .log(format!("Failed to update cached feed after retries: {err}"));
                Err(err)
            }
        }
    }

    /// Poll until `shutdown` fires: one cycle, then `poll_interval` of sleep.
    /// A failed cycle is logged and the loop carries on.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            source = self.source.location(),
            interval_secs = self.poll_interval.as_secs(),
            "feed monitor started"
        );

        while !shutdown.is_cancelled() {
            self.log.log(format!(
                "Checking RSS feed at {}",
                chrono::Local::now().format(TIMESTAMP_FORMAT)
            ));

            match self.update_cached_feed(&shutdown).await {
                Ok(()) => {
                    self.log.log("Feed processed and cached successfully.");
                    tracing::info!("feed refreshed");
                }
                Err(FeedError::Cancelled) => break,
                Err(err) => {
                    self.log.log(format!("Feed processing error: {}", describe(&err)));
                    if let Some(inner) = std::error::Error::source(&err) {
                        self.log.log(format!("Inner exception: {inner}"));
                    }
                    tracing::warn!(error = %err, "feed cycle failed");
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("feed monitor stopped");
    }
}

fn describe(err: &FeedError) -> String {
    match err {
        FeedError::TransientTransport { .. } | FeedError::PermanentTransport { .. } => {
            err.to_string()
        }
        FeedError::Timeout { .. } => "Request timed out".to_string(),
        FeedError::MalformedInput(_) => err.to_string(),
        other => format!("Unexpected error: {other}"),
    }
}

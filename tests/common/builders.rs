//! Test builders — scripted feed sources and a throwaway log/cache setup.
//!
//! These are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use rssfilter::cache::UPDATE_STREAM;
use rssfilter::config::LoggerSettings;
use rssfilter::logging::LogHandle;
use rssfilter::{
    FeedCache, FeedError, FeedMonitor, FeedSource, LogFactory, RuleSet, MONITOR_STREAM,
};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// A [`FeedSource`] that replays a fixed list of outcomes, one per fetch.
/// Once the script runs out every fetch fails permanently.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<String, FeedError>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Result<String, FeedError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with `body`.
    pub fn serving(body: &str) -> Self {
        Self::new(std::iter::repeat_with(|| Ok(body.to_string())).take(64))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeedSource for ScriptedSource {
    fn location(&self) -> &str {
        "scripted://feed"
    }

    fn fetch(&self) -> impl Future<Output = Result<String, FeedError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(FeedError::unreachable("script exhausted"))
        });
        async move { next }
    }
}

/// A source whose fetch never completes.
pub struct HangingSource;

impl FeedSource for HangingSource {
    fn location(&self) -> &str {
        "hanging://feed"
    }

    fn fetch(&self) -> impl Future<Output = Result<String, FeedError>> + Send {
        std::future::pending()
    }
}

/// HTTP 503 as the HTTP source would report it.
pub fn service_unavailable() -> Result<String, FeedError> {
    Err(FeedError::from_status(503, "Service Unavailable"))
}

// ---------------------------------------------------------------------------
// TestEnv
// ---------------------------------------------------------------------------

/// A temporary log directory with a factory and a cache wired to it.
pub struct TestEnv {
    pub dir: tempfile::TempDir,
    pub logs: LogFactory,
    pub cache: Arc<FeedCache>,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp log dir");
        let logs = LogFactory::new(LoggerSettings {
            log_directory: dir.path().to_path_buf(),
            ..LoggerSettings::default()
        });
        let cache = Arc::new(FeedCache::new(logs.create_logger(UPDATE_STREAM)));
        Self { dir, logs, cache }
    }

    pub fn monitor_log(&self) -> LogHandle {
        self.logs.create_logger(MONITOR_STREAM)
    }

    /// A monitor with the default retry policy (3 attempts, 5 s apart).
    pub fn monitor<S: FeedSource>(&self, source: S, rules: RuleSet) -> FeedMonitor<S> {
        FeedMonitor::new(source, rules, Arc::clone(&self.cache), self.monitor_log())
    }

    /// Contents of a stream's log file, or an empty string if never written.
    pub fn read_log(&self, stream: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(format!("{stream}.log"))).unwrap_or_default()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

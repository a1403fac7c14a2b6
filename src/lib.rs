//! rssfilter — single-feed RSS rewriting proxy.
//!
//! Polls one upstream feed, rewrites its element tree by rule (tag removal,
//! content cleanup, tag splitting) and serves the latest rewrite over HTTP.
//! The library re-exports the core and feed crates so integration tests can
//! import everything from one place.
//!
//! # Architecture
//!
//! ```text
//! FeedMonitor (timer) ──┐
//!                       ├──► fetch ─► parse ─► transform ─► FeedCache
//! GET /refresh ─────────┘                                     │
//! GET /rss ◄──────────────────────────────────────────────────┘
//! ```
//!
//! The monitor runs on a background task; the HTTP server drives the main
//! task. Both stop when the shared shutdown token fires.

pub mod server;

pub use rssfilter_core::{
    cache, config, document, error, logging, rules, transform, CleanupRule, Document, FeedCache,
    FeedError, LogFactory, NodeId, RuleSet, SplitRule, TagRef,
};
pub use rssfilter_feeds::{FeedMonitor, FeedSource, HttpFeedSource, RetryPolicy, MONITOR_STREAM};

use rssfilter_core::cache::UPDATE_STREAM;
use rssfilter_core::config::Settings;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Wire every component from `settings` and run until `shutdown` fires.
pub async fn run(settings: Settings, shutdown: CancellationToken) -> anyhow::Result<()> {
    let logs = LogFactory::new(settings.logger.clone());
    let cache = Arc::new(FeedCache::new(logs.create_logger(UPDATE_STREAM)));
    let source = HttpFeedSource::new(
        settings.rss_filter.input_source.clone(),
        settings.monitor.request_timeout(),
    )?;
    let monitor = Arc::new(
        FeedMonitor::new(
            source,
            RuleSet::from_settings(&settings.rss_filter),
            Arc::clone(&cache),
            logs.create_logger(MONITOR_STREAM),
        )
        .with_retry_policy(RetryPolicy::from(&settings.monitor))
        .with_poll_interval(settings.monitor.poll_interval()),
    );

    let poller = tokio::spawn({
        let monitor = Arc::clone(&monitor);
        let shutdown = shutdown.clone();
        async move { monitor.run(shutdown).await }
    });

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, source = %settings.rss_filter.input_source, "rssfilter listening");

    let state = server::AppState::new(monitor).with_shutdown(shutdown.clone());
    let served = server::serve(listener, server::router(state), shutdown.clone()).await;

    shutdown.cancel();
    poller.await?;
    served.map_err(Into::into)
}

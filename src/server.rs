//! HTTP boundary.
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `GET /rss` | Cached feed verbatim, `application/rss+xml` |
//! | `GET /refresh` | Runs one cycle now; `200` on success, `500` with the error otherwise |

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rssfilter_core::FeedCache;
use rssfilter_feeds::{FeedMonitor, FeedSource};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml";

/// Shared handles for the route handlers.
pub struct AppState<S> {
    pub cache: Arc<FeedCache>,
    pub monitor: Arc<FeedMonitor<S>>,
    /// Parent of every manual refresh's cancellation.
    pub shutdown: CancellationToken,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            monitor: Arc::clone(&self.monitor),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S: FeedSource> AppState<S> {
    pub fn new(monitor: Arc<FeedMonitor<S>>) -> Self {
        Self {
            cache: Arc::clone(monitor.cache()),
            monitor,
            shutdown: CancellationToken::new(),
        }
    }

    /// Abort in-flight refreshes when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

pub fn router<S: FeedSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/rss", get(rss::<S>))
        .route("/refresh", get(refresh::<S>))
        .with_state(state)
}

async fn rss<S: FeedSource>(State(state): State<AppState<S>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], state.cache.load())
}

async fn refresh<S: FeedSource>(State(state): State<AppState<S>>) -> Response {
    // Dropping the handler future on client disconnect aborts the fetch too.
    let cancel = state.shutdown.child_token();
    match state.monitor.update_cached_feed(&cancel).await {
        Ok(()) => (StatusCode::OK, "Feed refreshed successfully.").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "manual refresh failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error refreshing feed: {err}"),
            )
                .into_response()
        }
    }
}

/// Serve `router` on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

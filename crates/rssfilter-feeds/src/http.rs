//! HTTP feed source backed by `reqwest`.
//!
//! Non-success statuses are classified with [`FeedError::from_status`], so a
//! 503 or 408 is retried and a 404 is not. Client-side timeouts become
//! [`FeedError::Timeout`]; connection failures without a status are treated
//! as permanent.

use crate::FeedSource;
use rssfilter_core::FeedError;
use std::time::Duration;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rssfilter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(classify)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn get(&self) -> Result<String, FeedError> {
        let response = self.client.get(&self.url).send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }
        response.text().await.map_err(classify)
    }
}

impl FeedSource for HttpFeedSource {
    fn location(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> impl std::future::Future<Output = Result<String, FeedError>> + Send {
        self.get()
    }
}

fn classify(err: reqwest::Error) -> FeedError {
    let classified = if err.is_timeout() {
        FeedError::timeout(err.to_string())
    } else {
        match err.status() {
            Some(status) => FeedError::from_status(status.as_u16(), err.to_string()),
            None => FeedError::unreachable(err.to_string()),
        }
    };
    classified.with_source(err)
}

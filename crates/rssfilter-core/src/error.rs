//! Error taxonomy for one fetch → parse → transform → store cycle.
//!
//! [`FeedError`] is what a cycle fails with. The distinction between
//! retriable and non-retriable kinds drives the fetch loop:
//!
//! - **Retriable**: upstream server errors (HTTP ≥ 500), request-timeout
//!   status (408) and operation timeouts.
//! - **Non-retriable**: everything else. Empty content, malformed documents,
//!   other transport failures and cancellation abort the cycle at once.
//!
//! [`RuleError`] never escapes the transformation engine; a failing rule is
//! logged, recorded in the report and skipped.

use std::fmt;
use thiserror::Error;

/// HTTP status that marks a request timeout and is retried like a 5xx.
pub const REQUEST_TIMEOUT: u16 = 408;

/// Underlying cause carried by transport errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a cycle failed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The upstream answered with nothing but whitespace.
    #[error("received empty RSS content")]
    EmptyContent,

    /// The payload did not parse, or parsed without a root element.
    #[error("XML parsing error: {0}")]
    MalformedInput(String),

    /// Server-side failure worth retrying (5xx or 408).
    #[error("HTTP error: {message}, status: {}", StatusDisplay(.status))]
    TransientTransport {
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Transport failure that retrying will not fix.
    #[error("HTTP error: {message}, status: {}", StatusDisplay(.status))]
    PermanentTransport {
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The request outlived its deadline.
    #[error("request timed out: {message}")]
    Timeout {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// Every attempt failed without recording a retriable error.
    #[error("failed to fetch RSS feed after {0} attempts")]
    RetriesExhausted(u32),
}

impl FeedError {
    /// Classify an HTTP status returned by the upstream.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status >= 500 || status == REQUEST_TIMEOUT {
            FeedError::TransientTransport {
                status: Some(status),
                message,
                source: None,
            }
        } else {
            FeedError::PermanentTransport {
                status: Some(status),
                message,
                source: None,
            }
        }
    }

    /// A transport failure with no HTTP status, e.g. a refused connection.
    pub fn unreachable(message: impl Into<String>) -> Self {
        FeedError::PermanentTransport {
            status: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        FeedError::Timeout {
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause. Kinds without a cause slot are
    /// returned unchanged.
    pub fn with_source(mut self, cause: impl Into<BoxError>) -> Self {
        match &mut self {
            FeedError::TransientTransport { source, .. }
            | FeedError::PermanentTransport { source, .. }
            | FeedError::Timeout { source, .. } => *source = Some(cause.into()),
            _ => {}
        }
        self
    }

    /// Returns true if the fetch loop should try again after this error.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            FeedError::TransientTransport { .. } | FeedError::Timeout { .. }
        )
    }

    /// The HTTP status attached to a transport error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FeedError::TransientTransport { status, .. }
            | FeedError::PermanentTransport { status, .. } => *status,
            _ => None,
        }
    }
}

struct StatusDisplay<'a>(&'a Option<u16>);

impl fmt::Display for StatusDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.0 {
            Some(code) => write!(f, "{code}"),
            None => f.write_str("none"),
        }
    }
}

/// A rule that could not be applied. The transform continues without it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("invalid pattern `{pattern}` for tag `{tag}`: {message}")]
    InvalidPattern {
        tag: String,
        pattern: String,
        message: String,
    },

    #[error("namespace prefix '{prefix}' not found in the document")]
    UnresolvedPrefix { prefix: String },
}

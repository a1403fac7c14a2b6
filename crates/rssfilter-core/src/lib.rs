//! rssfilter-core — document model, rules and shared state for rssfilter.
//!
//! # Architecture
//!
//! ```text
//! upstream text ──► Document::parse ──► transform(RuleSet) ──► FeedCache::store
//!                                                                   │
//!                                                    HTTP readers ◄─┘ FeedCache::load
//! ```
//!
//! Every component writes its own [`logging::BoundedLog`] stream.

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod rules;
pub mod transform;

pub use cache::{FeedCache, LatestFeed};
pub use document::{Document, NodeId};
pub use error::{FeedError, RuleError};
pub use logging::{BoundedLog, LogFactory, LogHandle};
pub use rules::{CleanupRule, RuleSet, SplitRule, TagRef};
pub use transform::{transform, TransformReport};

//! Rule types for the transformation engine.
//!
//! Split and cleanup rules deserialize straight from the `[rss_filter]`
//! settings section. Removal rules are plain tag identifiers and are parsed
//! into [`TagRef`] when the [`RuleSet`] is assembled.

use crate::config::RssFilterSettings;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;

/// A tag identifier: `local` or `prefix:local`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub prefix: Option<String>,
    pub local: String,
}

impl TagRef {
    pub fn parse(tag: &str) -> Self {
        match tag.split_once(':') {
            Some((prefix, local)) => Self {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => Self {
                prefix: None,
                local: tag.to_string(),
            },
        }
    }

    /// The bare `link` rule, which spares the channel's own link.
    pub fn is_link(&self) -> bool {
        self.prefix.is_none() && self.local == "link"
    }
}

impl fmt::Display for TagRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Split one element's text into several sibling elements.
///
/// `new_tags` maps each target tag name to a template in which `$1` and `$2`
/// stand for the first two capture groups of `split_pattern`. Iteration
/// follows declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SplitRule {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub split_pattern: String,
    #[serde(default)]
    pub new_tags: IndexMap<String, String>,
}

impl SplitRule {
    pub fn new<K, V>(
        tag_name: impl Into<String>,
        split_pattern: impl Into<String>,
        new_tags: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            tag_name: tag_name.into(),
            split_pattern: split_pattern.into(),
            new_tags: new_tags
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        !self.tag_name.trim().is_empty()
            && !self.split_pattern.trim().is_empty()
            && !self.new_tags.is_empty()
    }
}

/// Delete every match of `cleanup_pattern` from an element's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CleanupRule {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub cleanup_pattern: String,
}

impl CleanupRule {
    pub fn new(tag_name: impl Into<String>, cleanup_pattern: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            cleanup_pattern: cleanup_pattern.into(),
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        !self.tag_name.is_empty() && !self.cleanup_pattern.is_empty()
    }
}

/// Everything the engine applies to a document, in phase order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub remove: Vec<TagRef>,
    /// Gates the split and cleanup phases.
    pub cleanup_enabled: bool,
    pub split: Vec<SplitRule>,
    pub cleanup: Vec<CleanupRule>,
}

impl RuleSet {
    /// Assemble rules from settings. Legacy `tag_cleanup_settings` run
    /// before `tag_cleanup`, in the same phase.
    pub fn from_settings(settings: &RssFilterSettings) -> Self {
        Self {
            remove: settings
                .tags_to_remove
                .iter()
                .filter(|tag| !tag.trim().is_empty())
                .map(|tag| TagRef::parse(tag.trim()))
                .collect(),
            cleanup_enabled: settings.cleanup_tags,
            split: settings.tag_split.clone(),
            cleanup: settings
                .tag_cleanup_settings
                .iter()
                .chain(&settings.tag_cleanup)
                .cloned()
                .collect(),
        }
    }

    pub fn removing<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            remove: tags.into_iter().map(|t| TagRef::parse(t.as_ref())).collect(),
            ..Self::default()
        }
    }

    pub fn with_split(mut self, rule: SplitRule) -> Self {
        self.split.push(rule);
        self.cleanup_enabled = true;
        self
    }

    pub fn with_cleanup(mut self, rule: CleanupRule) -> Self {
        self.cleanup.push(rule);
        self.cleanup_enabled = true;
        self
    }

    pub fn cleanup_enabled(mut self, enabled: bool) -> Self {
        self.cleanup_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_ref_parses_prefix() {
        let tag = TagRef::parse("media:thumbnail");
        assert_eq!(tag.prefix.as_deref(), Some("media"));
        assert_eq!(tag.local, "thumbnail");
        assert_eq!(tag.to_string(), "media:thumbnail");
        assert!(TagRef::parse("link").is_link());
        assert!(!TagRef::parse("atom:link").is_link());
    }

    #[test]
    fn legacy_cleanup_runs_first() {
        let settings = RssFilterSettings {
            tags_to_remove: vec!["guid".into(), "  ".into()],
            cleanup_tags: true,
            tag_cleanup_settings: vec![CleanupRule::new("title", "a")],
            tag_cleanup: vec![CleanupRule::new("description", "b")],
            ..RssFilterSettings::default()
        };
        let rules = RuleSet::from_settings(&settings);
        assert_eq!(rules.remove, vec![TagRef::parse("guid")]);
        assert!(rules.cleanup_enabled);
        let tags: Vec<_> = rules.cleanup.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, ["title", "description"]);
    }

    #[test]
    fn incomplete_rules_are_detected() {
        assert!(!SplitRule::new("title", "(a)(b)", Vec::<(String, String)>::new()).is_complete());
        assert!(!SplitRule::new(" ", "(a)(b)", [("x", "$1")]).is_complete());
        assert!(SplitRule::new("title", "(a)(b)", [("x", "$1")]).is_complete());
        assert!(!CleanupRule::new("title", "").is_complete());
    }
}

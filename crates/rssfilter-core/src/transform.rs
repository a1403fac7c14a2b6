//! Tag transformation engine.
//!
//! [`transform`] rewrites a [`Document`] in place in three phases:
//!
//! 1. **Removal** — every [`TagRef`] in order. Bare names match elements in
//!    the root's default namespace; `prefix:local` names resolve the prefix
//!    on the root element; `link` removes every link except those directly
//!    under `channel`.
//! 2. **Split** — each [`SplitRule`] matches an element's text and writes
//!    `$1`/`$2` templates into sibling elements.
//! 3. **Cleanup** — each [`CleanupRule`] deletes pattern matches from an
//!    element's text and trims it.
//!
//! Phases 2 and 3 only run when the rule set has cleanup enabled. A rule
//! with a bad pattern or an unknown prefix is logged, recorded in the
//! [`TransformReport`] and skipped; the other rules still run.

use crate::document::{Document, NodeId};
use crate::error::RuleError;
use crate::logging::BoundedLog;
use crate::rules::{CleanupRule, RuleSet, SplitRule, TagRef};
use regex::Regex;

/// What a transform did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Elements removed by the removal phase.
    pub removed: usize,
    /// Elements whose text matched a split rule.
    pub split: usize,
    /// Elements whose text a cleanup rule changed.
    pub cleaned: usize,
    /// Rules that could not be applied.
    pub skipped: Vec<RuleError>,
}

/// Apply `rules` to `doc`.
pub fn transform(doc: &mut Document, rules: &RuleSet, log: &BoundedLog) -> TransformReport {
    let mut report = TransformReport::default();

    for tag in &rules.remove {
        match remove_tag(doc, tag, log) {
            Ok(count) => report.removed += count,
            Err(err) => report.skipped.push(err),
        }
    }

    if rules.cleanup_enabled {
        if !rules.split.is_empty() {
            for rule in &rules.split {
                match split_tag(doc, rule) {
                    Ok(count) => report.split += count,
                    Err(err) => skip(log, &mut report, err),
                }
            }
            log.log(format!(
                "Processed tag splitting for {} tag types",
                rules.split.len()
            ));
        }

        if !rules.cleanup.is_empty() {
            for rule in &rules.cleanup {
                match cleanup_tag(doc, rule) {
                    Ok(count) => report.cleaned += count,
                    Err(err) => skip(log, &mut report, err),
                }
            }
            log.log(format!(
                "Cleaned up content for {} tag types",
                rules.cleanup.len()
            ));
        }
    }

    report
}

fn skip(log: &BoundedLog, report: &mut TransformReport, err: RuleError) {
    log.log(format!("Warning: skipping rule: {err}"));
    report.skipped.push(err);
}

// ---------------------------------------------------------------------------
// Removal
// ---------------------------------------------------------------------------

fn remove_tag(doc: &mut Document, tag: &TagRef, log: &BoundedLog) -> Result<usize, RuleError> {
    if tag.is_link() {
        let doomed = collect(doc, |doc, id| {
            doc.local_name(id) == Some("link")
                && doc
                    .parent(id)
                    .and_then(|parent| doc.local_name(parent))
                    != Some("channel")
        });
        let count = detach_all(doc, &doomed);
        log.log(format!(
            "Preserved channel link element, removed {count} other link elements"
        ));
        return Ok(count);
    }

    let namespace = match &tag.prefix {
        Some(prefix) => match doc.root_namespace_for_prefix(prefix) {
            Some(uri) => Some(uri.to_string()),
            None => {
                log.log(format!(
                    "Warning: Namespace prefix '{prefix}' not found in the document"
                ));
                return Err(RuleError::UnresolvedPrefix {
                    prefix: prefix.clone(),
                });
            }
        },
        None => doc.default_namespace().map(str::to_string),
    };

    let doomed = collect(doc, |doc, id| {
        doc.local_name(id) == Some(tag.local.as_str())
            && doc.namespace_of(id) == namespace.as_deref()
    });
    Ok(detach_all(doc, &doomed))
}

fn collect(doc: &Document, keep: impl Fn(&Document, NodeId) -> bool) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|id| *id != doc.root() && keep(doc, *id))
        .collect()
}

fn detach_all(doc: &mut Document, ids: &[NodeId]) -> usize {
    for id in ids {
        doc.detach(*id);
    }
    ids.len()
}

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

fn split_tag(doc: &mut Document, rule: &SplitRule) -> Result<usize, RuleError> {
    if !rule.is_complete() {
        return Ok(0);
    }
    let regex = compile(&rule.tag_name, &rule.split_pattern)?;
    let targets = collect(doc, |doc, id| doc.local_name(id) == Some(rule.tag_name.as_str()));

    let mut matched = 0;
    for element in targets {
        let value = doc.text(element);
        if value.is_empty() {
            continue;
        }
        let Some(captures) = regex.captures(&value) else {
            continue;
        };
        if captures.len() < 3 {
            continue;
        }
        let Some(parent) = doc.parent(element) else {
            continue;
        };
        let first = captures.get(1).map_or("", |m| m.as_str());
        let second = captures.get(2).map_or("", |m| m.as_str());

        for (new_tag, template) in &rule.new_tags {
            let expanded = expand_template(template, first, second);
            let new_value = expanded.trim();
            let existing = doc
                .child_elements(parent)
                .find(|child| doc.local_name(*child) == Some(new_tag.as_str()));

            if let Some(existing) = existing {
                doc.set_text(existing, new_value);
            } else if *new_tag == rule.tag_name {
                doc.set_text(element, new_value);
            } else {
                let name = match doc.element(parent).and_then(|p| p.prefix()) {
                    Some(prefix) => format!("{prefix}:{new_tag}"),
                    None => new_tag.clone(),
                };
                doc.insert_after(element, &name, new_value);
            }
        }
        matched += 1;
    }
    Ok(matched)
}

/// Substitute `$1` and `$2` in one left-to-right pass. Any other `$`
/// sequence is kept literally.
pub fn expand_template(template: &str, first: &str, second: &str) -> String {
    let mut out = String::with_capacity(template.len() + first.len() + second.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            let group = match chars.peek() {
                Some('1') => Some(first),
                Some('2') => Some(second),
                _ => None,
            };
            if let Some(group) = group {
                chars.next();
                out.push_str(group);
                continue;
            }
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

fn cleanup_tag(doc: &mut Document, rule: &CleanupRule) -> Result<usize, RuleError> {
    if !rule.is_complete() {
        return Ok(0);
    }
    let regex = compile(&rule.tag_name, &rule.cleanup_pattern)?;
    let targets = collect(doc, |doc, id| doc.local_name(id) == Some(rule.tag_name.as_str()));

    let mut cleaned = 0;
    for element in targets {
        let value = doc.text(element);
        if value.is_empty() {
            continue;
        }
        let processed = regex.replace_all(&value, "");
        let processed = processed.trim();
        if processed != value {
            doc.set_text(element, processed);
            cleaned += 1;
        }
    }
    Ok(cleaned)
}

fn compile(tag: &str, pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|err| RuleError::InvalidPattern {
        tag: tag.to_string(),
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

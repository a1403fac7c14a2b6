//! Domain-specific assertion macros for rssfilter harnesses.
//!
//! These wrap plain element lookups with failure messages that print the
//! serialized document, so a broken rewrite is visible at a glance.

use rssfilter::{Document, NodeId};

/// All attached elements with the given qualified name, in document order.
pub fn elements_named(doc: &Document, name: &str) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|id| doc.name(*id) == Some(name))
        .collect()
}

/// Texts of all elements with the given qualified name.
pub fn texts_of(doc: &Document, name: &str) -> Vec<String> {
    elements_named(doc, name)
        .into_iter()
        .map(|id| doc.text(id))
        .collect()
}

/// Assert that no element with the given qualified name remains.
#[macro_export]
macro_rules! assert_no_element {
    ($doc:expr, $name:expr) => {{
        let doc: &rssfilter::Document = &$doc;
        let found = $crate::common::elements_named(doc, $name);
        if !found.is_empty() {
            panic!(
                "assert_no_element! failed: {} <{}> element(s) remain in\n{}",
                found.len(),
                $name,
                doc.to_xml_string()
            );
        }
    }};
}

/// Assert the texts of every element with the given qualified name.
#[macro_export]
macro_rules! assert_texts {
    ($doc:expr, $name:expr, [$($text:expr),* $(,)?]) => {{
        let doc: &rssfilter::Document = &$doc;
        let actual = $crate::common::texts_of(doc, $name);
        let expected: Vec<String> = vec![$(String::from($text)),*];
        if actual != expected {
            panic!(
                "assert_texts! failed for <{}>\n  expected: {:?}\n  actual:   {:?}\n{}",
                $name,
                expected,
                actual,
                doc.to_xml_string()
            );
        }
    }};
}

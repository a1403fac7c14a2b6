//! Document — an owned arena of XML nodes.
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`]. Each
//! node records its parent and its ordered children, so the tree can be
//! walked and rewritten in place without shared ownership or back-pointers.
//! Detached nodes stay in the arena but are unreachable from the root.
//!
//! # Fidelity
//!
//! Whitespace text is kept as parsed, attribute values are written back in
//! their original escaped form, and elements parsed as `<x/>` stay
//! self-closing while they remain childless. A document that no rule touches
//! therefore serialises to the same markup it was parsed from, modulo
//! entity spelling inside text.

use crate::error::FeedError;
use quick_xml::escape::{partial_escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Index of a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An attribute exactly as it appeared in the source (value still escaped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub raw_value: String,
}

impl Attribute {
    /// The attribute value with entity references resolved.
    pub fn value(&self) -> String {
        unescape(&self.raw_value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| self.raw_value.clone())
    }
}

/// An element's qualified name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written, e.g. `title` or `media:title`.
    pub name: String,
    pub attributes: Vec<Attribute>,
    self_closing: bool,
}

impl Element {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            self_closing: false,
        }
    }

    /// Namespace prefix of the qualified name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Local part of the qualified name.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    Declaration(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed feed document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

const DOCUMENT_NODE: NodeId = NodeId(0);

impl Document {
    /// Parse markup into a document.
    ///
    /// Fails with [`FeedError::MalformedInput`] on syntax errors, unbalanced
    /// tags, text outside the root element, more than one root, or no root
    /// at all.
    pub fn parse(input: &str) -> Result<Self, FeedError> {
        let mut nodes = vec![Node {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
        }];
        let mut open: Vec<NodeId> = vec![DOCUMENT_NODE];
        let mut root: Option<NodeId> = None;
        let mut reader = Reader::from_str(input);

        loop {
            let event = reader.read_event().map_err(|err| {
                FeedError::MalformedInput(format!(
                    "{err} (at byte {})",
                    reader.buffer_position()
                ))
            })?;
            let parent = *open.last().unwrap_or(&DOCUMENT_NODE);
            let at_top = parent == DOCUMENT_NODE;

            let kind = match event {
                Event::Start(start) | Event::Empty(start) if at_top && root.is_some() => {
                    return Err(FeedError::MalformedInput(format!(
                        "unexpected second root element <{}>",
                        qualified_name(&start)?
                    )));
                }
                Event::Start(start) => {
                    let id = push(&mut nodes, parent, NodeKind::Element(read_element(&start)?));
                    if at_top {
                        root = Some(id);
                    }
                    open.push(id);
                    continue;
                }
                Event::Empty(start) => {
                    let mut element = read_element(&start)?;
                    element.self_closing = true;
                    let id = push(&mut nodes, parent, NodeKind::Element(element));
                    if at_top {
                        root = Some(id);
                    }
                    continue;
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    match open.pop() {
                        Some(id) if id != DOCUMENT_NODE => continue,
                        _ => {
                            return Err(FeedError::MalformedInput(format!(
                                "unexpected closing tag </{name}>"
                            )))
                        }
                    }
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|err| FeedError::MalformedInput(err.to_string()))?
                        .into_owned();
                    if at_top && !value.trim().is_empty() {
                        return Err(FeedError::MalformedInput(
                            "text outside the root element".to_string(),
                        ));
                    }
                    NodeKind::Text(value)
                }
                Event::CData(data) => {
                    if at_top {
                        return Err(FeedError::MalformedInput(
                            "CDATA outside the root element".to_string(),
                        ));
                    }
                    NodeKind::CData(String::from_utf8_lossy(&data.into_inner()).into_owned())
                }
                Event::Comment(comment) => {
                    NodeKind::Comment(String::from_utf8_lossy(&comment.into_inner()).into_owned())
                }
                Event::Decl(decl) => NodeKind::Declaration(String::from_utf8_lossy(&decl).into_owned()),
                Event::PI(pi) => {
                    NodeKind::ProcessingInstruction(String::from_utf8_lossy(&pi).into_owned())
                }
                Event::DocType(doctype) => NodeKind::DocType(
                    String::from_utf8_lossy(&doctype.into_inner())
                        .trim()
                        .to_string(),
                ),
                Event::Eof => break,
            };
            push(&mut nodes, parent, kind);
        }

        if let Some(&unclosed) = open.last() {
            if unclosed != DOCUMENT_NODE {
                let name = match &nodes[unclosed.0].kind {
                    NodeKind::Element(element) => element.name.clone(),
                    _ => String::new(),
                };
                return Err(FeedError::MalformedInput(format!(
                    "unexpected end of input: <{name}> is never closed"
                )));
            }
        }

        let root = root
            .ok_or_else(|| FeedError::MalformedInput("missing root element".to_string()))?;
        Ok(Self { nodes, root })
    }

    /// The root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The element stored at `id`, or `None` for non-element nodes.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Qualified name of an element.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Local name of an element.
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::local_name)
    }

    /// The parent element, or `None` for the root and for detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0]
            .parent
            .filter(|parent| self.element(*parent).is_some())
    }

    /// All child nodes in order (elements, text, comments…).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child elements in order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.element(*child).is_some())
    }

    /// Every element reachable from the root, in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.element(id).is_none() {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Resolve `prefix` (or the default namespace when `None`) in scope at
    /// element `id`.
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        let attribute = match prefix {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(found) = self.element(node).and_then(|e| e.attribute(&attribute)) {
                let uri = found.raw_value.as_str();
                return (!uri.is_empty()).then_some(uri);
            }
            current = self.parent(node);
        }
        None
    }

    /// Namespace URI of element `id`, or `None` when it has none.
    pub fn namespace_of(&self, id: NodeId) -> Option<&str> {
        let prefix = self.element(id)?.prefix();
        self.lookup_namespace(id, prefix)
    }

    /// Resolve a prefix against the declarations on the root element.
    pub fn root_namespace_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.lookup_namespace(self.root, Some(prefix))
    }

    /// The root element's default namespace.
    pub fn default_namespace(&self) -> Option<&str> {
        self.lookup_namespace(self.root, None)
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for child in self.children(id) {
            match &self.nodes[child.0].kind {
                NodeKind::Text(text) | NodeKind::CData(text) => out.push_str(text),
                NodeKind::Element(_) => self.collect_text(*child, out),
                _ => {}
            }
        }
    }

    /// Replace all content of element `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, value: &str) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
        if let NodeKind::Element(element) = &mut self.nodes[id.0].kind {
            element.self_closing = false;
        }
        if !value.is_empty() {
            push(&mut self.nodes, id, NodeKind::Text(value.to_string()));
        }
    }

    /// Remove an element (and its subtree) from its parent.
    ///
    /// Indentation directly before the element (a whitespace-only text node
    /// spanning a line break, in a parent with no other text) goes with it,
    /// so removal does not leave an empty indented line behind. In mixed
    /// content all text stays. The root element cannot be detached.
    pub fn detach(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        let siblings = &mut self.nodes[parent.0].children;
        let Some(index) = siblings.iter().position(|child| *child == id) else {
            return;
        };
        siblings.remove(index);
        if index > 0 && !self.has_mixed_content(parent) {
            let before = self.nodes[parent.0].children[index - 1];
            if let NodeKind::Text(text) = &self.nodes[before.0].kind {
                if text.trim().is_empty() && text.contains('\n') {
                    self.nodes[parent.0].children.remove(index - 1);
                    self.nodes[before.0].parent = None;
                }
            }
        }
    }

    /// Whether `id` holds any text that is not pure whitespace, in which case
    /// its whitespace is content rather than indentation.
    fn has_mixed_content(&self, id: NodeId) -> bool {
        self.children(id).iter().any(|child| match &self.nodes[child.0].kind {
            NodeKind::Text(text) | NodeKind::CData(text) => !text.trim().is_empty(),
            _ => false,
        })
    }

    /// Create an element named `name` holding `value` and place it directly
    /// after `anchor`, reusing the anchor's indentation.
    pub fn insert_after(&mut self, anchor: NodeId, name: &str, value: &str) -> Option<NodeId> {
        let parent = self.nodes[anchor.0].parent?;
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|child| *child == anchor)?;

        let indent = index
            .checked_sub(1)
            .map(|i| self.nodes[parent.0].children[i])
            .and_then(|before| match &self.nodes[before.0].kind {
                NodeKind::Text(text) if text.trim().is_empty() => Some(text.clone()),
                _ => None,
            });

        let element = self.alloc(NodeKind::Element(Element::new(name)), Some(parent));
        if !value.is_empty() {
            push(&mut self.nodes, element, NodeKind::Text(value.to_string()));
        }

        let mut inserted = vec![element];
        if let Some(indent) = indent {
            inserted.insert(0, self.alloc(NodeKind::Text(indent), Some(parent)));
        }
        let children = &mut self.nodes[parent.0].children;
        children.splice(index + 1..index + 1, inserted);
        Some(element)
    }

    fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Serialise the document back to markup.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        for child in self.children(DOCUMENT_NODE) {
            self.write_node(*child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Document => {}
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for attribute in &element.attributes {
                    let quote = if attribute.raw_value.contains('"') { '\'' } else { '"' };
                    out.push(' ');
                    out.push_str(&attribute.name);
                    out.push('=');
                    out.push(quote);
                    out.push_str(&attribute.raw_value);
                    out.push(quote);
                }
                let children = self.children(id);
                if children.is_empty() && element.self_closing {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
            NodeKind::Text(text) => out.push_str(&partial_escape(text)),
            NodeKind::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Declaration(text) | NodeKind::ProcessingInstruction(text) => {
                out.push_str("<?");
                out.push_str(text);
                out.push_str("?>");
            }
            NodeKind::DocType(text) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(text);
                out.push('>');
            }
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

fn push(nodes: &mut Vec<Node>, parent: NodeId, kind: NodeKind) -> NodeId {
    let id = NodeId(nodes.len());
    nodes.push(Node {
        kind,
        parent: Some(parent),
        children: Vec::new(),
    });
    nodes[parent.0].children.push(id);
    id
}

fn qualified_name(start: &BytesStart<'_>) -> Result<String, FeedError> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_string)
        .map_err(|err| FeedError::MalformedInput(err.to_string()))
}

fn read_element(start: &BytesStart<'_>) -> Result<Element, FeedError> {
    let mut element = Element::new(qualified_name(start)?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| FeedError::MalformedInput(err.to_string()))?;
        element.attributes.push(Attribute {
            name: String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
            raw_value: String::from_utf8_lossy(&attribute.value).into_owned(),
        });
    }
    Ok(element)
}

//! # DOM Snapshot
//!
//! An arena-backed, mutable document tree. Nodes are addressed by [`NodeId`]
//! handles that stay valid for the lifetime of the [`Document`]; detached
//! nodes are never freed, they simply lose their parent.
//!
//! The tree is deliberately small: it models exactly what the line-tracking
//! pipeline needs from a browser DOM (ancestry, attributes, classes, text
//! content, insertion) and nothing about layout or styling.

use std::fmt;

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<Attribute>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = value,
            None => self.attrs.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).value)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    /// Element name comparison is ASCII case-insensitive (HTML rules).
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// A mutable DOM snapshot.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// True when `id` is an element named `name` (case-insensitive).
    pub fn is_element(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.is(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.element(*c).is_some())
    }

    /// Walk from `id` (inclusive) up to the document root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// All nodes below `id` in document (pre-)order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Elements below `id` in document order.
    pub fn descendant_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id).filter(|n| self.element(*n).is_some())
    }

    /// Nearest inclusive ancestor element satisfying `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.ancestors(id)
            .find(|n| self.element(*n).is_some_and(&pred))
    }

    /// True when `ancestor` is `id` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|n| n == ancestor)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute. No-op on non-element nodes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(e) = self.element_mut(id) {
            e.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id).and_then(|e| e.remove_attr(name))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|e| e.classes().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        if let Some(e) = self.element_mut(id) {
            let joined = match e.attr("class") {
                Some(existing) if !existing.trim().is_empty() => {
                    format!("{} {class}", existing.trim())
                }
                _ => class.to_string(),
            };
            e.set_attr("class", joined);
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(e) = self.element_mut(id) else {
            return;
        };
        let remaining: Vec<String> = e
            .classes()
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        if remaining.is_empty() {
            e.remove_attr("class");
        } else {
            e.set_attr("class", remaining.join(" "));
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text(t) = self.data(id) {
            out.push_str(t);
        }
        for n in self.descendants(id) {
            if let NodeData::Text(t) = self.data(n) {
                out.push_str(t);
            }
        }
        out
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut element = Element::new(name);
        for (k, v) in attrs {
            element.set_attr(k, *v);
        }
        self.push_node(NodeData::Element(element))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeData::Text(text.into()))
    }

    pub(crate) fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` immediately after `reference` under the same parent.
    /// Falls back to appending under `reference` when it has no parent.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) {
        self.detach(child);
        let Some(parent) = self.parent(reference) else {
            self.append_child(reference, child);
            return;
        };
        let siblings = &mut self.nodes[parent.0].children;
        let pos = siblings
            .iter()
            .position(|c| *c == reference)
            .map_or(siblings.len(), |p| p + 1);
        siblings.insert(pos, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Remove `id` from its parent's child list. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Detach every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for c in children {
            self.nodes[c.0].parent = None;
        }
    }

    /// Position of `id` among its parent's element children.
    pub fn element_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.element_children(parent).position(|c| c == id)
    }

    /// First element in document order satisfying `pred`.
    pub fn find(&self, from: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.descendant_elements(from)
            .find(|n| self.element(*n).is_some_and(&pred))
    }

    /// All elements in document order satisfying `pred`.
    pub fn find_all(&self, from: NodeId, pred: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendant_elements(from)
            .filter(|n| self.element(*n).is_some_and(&pred))
            .collect()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find(self.root(), |e| e.is("body"))
    }

    /// Follow element-child indexes down from `from`.
    pub fn element_at_path(&self, from: NodeId, path: &[usize]) -> Option<NodeId> {
        path.iter().try_fold(from, |node, idx| {
            self.element_children(node).nth(*idx)
        })
    }

    /// Element-child index path from `from` down to `id`.
    pub fn element_path(&self, from: NodeId, id: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;
        while current != from {
            path.push(self.element_index(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.create_element("div", &[("class", "outer box")]);
        let p = doc.create_element("p", &[("data-line", "3")]);
        let text = doc.create_text("hello");
        doc.append_child(root, div);
        doc.append_child(div, p);
        doc.append_child(p, text);
        (doc, div, p, text)
    }

    #[test]
    fn ancestors_are_inclusive_and_reach_root() {
        let (doc, div, p, text) = sample();
        let chain: Vec<_> = doc.ancestors(text).collect();
        assert_eq!(chain, vec![text, p, div, doc.root()]);
    }

    #[test]
    fn closest_finds_nearest_match() {
        let (doc, div, _p, text) = sample();
        assert_eq!(doc.closest(text, |e| e.is("div")), Some(div));
        assert_eq!(doc.closest(text, |e| e.is("table")), None);
    }

    #[test]
    fn class_manipulation() {
        let (mut doc, div, _, _) = sample();
        assert!(doc.has_class(div, "box"));
        doc.add_class(div, "highlight");
        assert_eq!(doc.attr(div, "class"), Some("outer box highlight"));
        doc.remove_class(div, "outer");
        assert_eq!(doc.attr(div, "class"), Some("box highlight"));
        doc.remove_class(div, "box");
        doc.remove_class(div, "highlight");
        assert_eq!(doc.attr(div, "class"), None);
    }

    #[test]
    fn insert_after_keeps_sibling_order() {
        let (mut doc, div, p, _) = sample();
        let hr = doc.create_element("hr", &[]);
        let span = doc.create_element("span", &[]);
        doc.append_child(div, span);
        doc.insert_after(p, hr);
        assert_eq!(doc.children(div), &[p, hr, span]);
    }

    #[test]
    fn element_paths_roundtrip() {
        let (doc, _, p, _) = sample();
        let path = doc.element_path(doc.root(), p).unwrap();
        assert_eq!(path, vec![0, 0]);
        assert_eq!(doc.element_at_path(doc.root(), &path), Some(p));
    }

    #[test]
    fn text_content_of_text_node_is_itself() {
        let (doc, div, _, text) = sample();
        assert_eq!(doc.text_content(text), "hello");
        assert_eq!(doc.text_content(div), "hello");
    }
}

//! # Tree Builder
//!
//! Turns the token stream from [`crate::lexer`] into a [`Document`]. The
//! builder is permissive: it never fails, and malformed markup produces a
//! best-effort tree rather than an error.
//!
//! Recovery rules, in the order they are applied:
//!
//! - void elements (`br`, `img`, `hr`, ...) and `<x/>` never take children
//! - `script` and `style` contents are raw text up to the matching end tag
//! - opening `li`, `td`/`th`, `tr` or `p` implicitly closes an open sibling
//!   of the same family, and block-level openers close an open `p`
//! - an end tag with no matching open element is ignored
//! - anything still open at end of input is closed

use std::borrow::Cow;

use crate::dom::{Attribute, Document, Element, NodeData, NodeId};
use crate::lexer::{TokenKind, lex_with_spans};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const CLOSES_PARAGRAPH: &[&str] = &[
    "address",
    "blockquote",
    "div",
    "dl",
    "fieldset",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

/// Parse a complete document.
pub fn parse(input: &str) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    parse_fragment_into(&mut doc, root, input);
    doc
}

/// Parse `input` and append the resulting nodes as children of `parent`.
pub fn parse_fragment_into(doc: &mut Document, parent: NodeId, input: &str) {
    TreeBuilder::new(doc, parent).run(input);
}

struct TreeBuilder<'d> {
    doc: &'d mut Document,
    /// Open elements; the bottom entry is the fragment parent and is never popped.
    stack: Vec<NodeId>,
}

impl<'d> TreeBuilder<'d> {
    fn new(doc: &'d mut Document, parent: NodeId) -> Self {
        Self {
            doc,
            stack: vec![parent],
        }
    }

    fn current(&self) -> NodeId {
        // The fragment parent is never popped
        self.stack[self.stack.len() - 1]
    }

    fn run(mut self, input: &str) {
        let tokens = lex_with_spans(input);
        let mut i = 0;

        while i < tokens.len() {
            let (token, span) = &tokens[i];
            i += 1;

            match token.kind {
                TokenKind::Text | TokenKind::Lt => self.push_text(&decode(token.text)),
                TokenKind::ProcessingInstruction => {}
                TokenKind::Bang => self.push_bang(token.text),
                TokenKind::EndTag => self.close(end_tag_name(token.text)),
                TokenKind::StartTag => {
                    let (element, self_closing) = parse_start_tag(token.text);
                    let raw = RAW_TEXT_ELEMENTS.iter().any(|r| element.is(r));
                    let name = element.name.to_ascii_lowercase();
                    let node = self.open(element, self_closing);

                    if raw && !self_closing {
                        // Everything up to the matching end tag is raw text
                        let content_start = span.end;
                        let mut content_end = input.len();
                        while i < tokens.len() {
                            let (t, s) = &tokens[i];
                            i += 1;
                            if t.kind == TokenKind::EndTag
                                && end_tag_name(t.text).eq_ignore_ascii_case(&name)
                            {
                                content_end = s.start;
                                break;
                            }
                        }
                        let raw_text = &input[content_start..content_end];
                        if !raw_text.is_empty() {
                            let text = self.doc.create_text(raw_text);
                            self.doc.append_child(node, text);
                        }
                        self.pop_to(node);
                    }
                }
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        // Merge with a preceding text sibling
        if let Some(&last) = self.doc.children(parent).last()
            && let NodeData::Text(existing) = self.doc.data_mut(last)
        {
            existing.push_str(text);
            return;
        }
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node);
    }

    fn push_bang(&mut self, text: &str) {
        let data = if let Some(body) = text.strip_prefix("<!--") {
            NodeData::Comment(body.strip_suffix("-->").unwrap_or(body).to_string())
        } else {
            let body = text.trim_start_matches("<!").trim_end_matches('>');
            NodeData::Doctype(body.trim().to_string())
        };
        let node = self.doc.push_node(data);
        let parent = self.current();
        self.doc.append_child(parent, node);
    }

    fn open(&mut self, element: Element, self_closing: bool) -> NodeId {
        let name = element.name.to_ascii_lowercase();
        self.apply_implied_end_tags(&name);

        let is_void = VOID_ELEMENTS.contains(&name.as_str());
        let node = self.doc.push_node(NodeData::Element(element));
        let parent = self.current();
        self.doc.append_child(parent, node);

        if !(self_closing || is_void) {
            self.stack.push(node);
        }
        node
    }

    fn apply_implied_end_tags(&mut self, name: &str) {
        match name {
            "li" => self.close_open_sibling(&["li"], &["ul", "ol"]),
            "td" | "th" => self.close_open_sibling(&["td", "th"], &["tr", "table"]),
            "tr" => self.close_open_sibling(&["tr"], &["table", "thead", "tbody", "tfoot"]),
            "thead" | "tbody" | "tfoot" => {
                self.close_open_sibling(&["thead", "tbody", "tfoot"], &["table"])
            }
            "option" => self.close_open_sibling(&["option"], &["select"]),
            _ => {}
        }
        if CLOSES_PARAGRAPH.contains(&name)
            && self.stack.len() > 1
            && self.doc.is_element(self.current(), "p")
        {
            self.stack.pop();
        }
    }

    /// Close the nearest open element named in `family`, unless a `boundary`
    /// element is reached first.
    fn close_open_sibling(&mut self, family: &[&str], boundary: &[&str]) {
        for idx in (1..self.stack.len()).rev() {
            let node = self.stack[idx];
            let Some(name) = self.doc.tag_name(node) else {
                continue;
            };
            if family.iter().any(|f| name.eq_ignore_ascii_case(f)) {
                self.stack.truncate(idx);
                return;
            }
            if boundary.iter().any(|b| name.eq_ignore_ascii_case(b)) {
                return;
            }
        }
    }

    fn close(&mut self, name: &str) {
        let found = (1..self.stack.len())
            .rev()
            .find(|idx| self.doc.is_element(self.stack[*idx], name));
        if let Some(idx) = found {
            self.stack.truncate(idx);
        }
    }

    fn pop_to(&mut self, node: NodeId) {
        if let Some(idx) = self.stack.iter().rposition(|n| *n == node)
            && idx > 0
        {
            self.stack.truncate(idx);
        }
    }
}

fn decode(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

fn end_tag_name(text: &str) -> &str {
    text.trim_start_matches("</").trim_end_matches('>').trim()
}

/// Split a start-tag token into an element and its self-closing flag.
fn parse_start_tag(text: &str) -> (Element, bool) {
    let inner = text.strip_prefix('<').unwrap_or(text);
    let inner = inner.strip_suffix('>').unwrap_or(inner);
    let trimmed = inner.trim_end();
    let self_closing = trimmed.ends_with('/');
    let inner = if self_closing {
        &trimmed[..trimmed.len() - 1]
    } else {
        inner
    };

    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let mut element = Element::new(&inner[..name_end]);
    element.attrs = parse_attributes(&inner[name_end..]);
    (element, self_closing)
}

fn parse_attributes(input: &str) -> Vec<Attribute> {
    let bytes = input.as_bytes();
    let mut attrs: Vec<Attribute> = Vec::new();
    let mut pos = 0;

    let skip_ws = |mut p: usize| {
        while p < bytes.len() && (bytes[p].is_ascii_whitespace() || bytes[p] == b'/') {
            p += 1;
        }
        p
    };

    loop {
        pos = skip_ws(pos);
        if pos >= bytes.len() {
            break;
        }

        let name_start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'=' {
            pos += 1;
        }
        let name = &input[name_start..pos];

        let mut value = String::new();
        let mut look = pos;
        while look < bytes.len() && bytes[look].is_ascii_whitespace() {
            look += 1;
        }
        if look < bytes.len() && bytes[look] == b'=' {
            look += 1;
            while look < bytes.len() && bytes[look].is_ascii_whitespace() {
                look += 1;
            }
            if look < bytes.len() && (bytes[look] == b'"' || bytes[look] == b'\'') {
                let quote = bytes[look];
                let value_start = look + 1;
                let value_end = input[value_start..]
                    .bytes()
                    .position(|b| b == quote)
                    .map_or(input.len(), |p| value_start + p);
                value = decode(&input[value_start..value_end]).into_owned();
                pos = (value_end + 1).min(input.len());
            } else {
                let value_start = look;
                let mut value_end = look;
                while value_end < bytes.len() && !bytes[value_end].is_ascii_whitespace() {
                    value_end += 1;
                }
                value = decode(&input[value_start..value_end]).into_owned();
                pos = value_end;
            }
        }

        if !name.is_empty() && !attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name)) {
            attrs.push(Attribute {
                name: name.to_string(),
                value,
            });
        }
    }

    attrs
}

//! Serialization of a [`Document`] (or any subtree) back to markup.

use crate::dom::{Document, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl Document {
    /// Markup for `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    /// Markup for the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let raw = self
            .element(id)
            .is_some_and(|e| e.is("script") || e.is("style"));
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(*child, raw, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match self.data(id) {
            NodeData::Document => {
                for child in self.children(id) {
                    self.write_node(*child, false, out);
                }
            }
            NodeData::Doctype(body) => {
                out.push_str("<!");
                out.push_str(body);
                out.push('>');
            }
            NodeData::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            NodeData::Text(text) if raw_text => out.push_str(text),
            NodeData::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for attr in &element.attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(&attr.value));
                    out.push('"');
                }
                out.push('>');

                let name = element.name.to_ascii_lowercase();
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }
                out.push_str(&self.inner_html(id));
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn reserializes_parsed_markup() {
        let input = r#"<p data-line="3">See <a href="http://example.com">text</a>.</p>"#;
        let doc = parse(input);
        assert_eq!(doc.outer_html(doc.root()), input);
    }

    #[test]
    fn escapes_text_and_attributes() {
        let doc = parse(r#"<pre data-source="a --&gt; &quot;b&quot;">x &lt; y</pre>"#);
        assert_eq!(
            doc.outer_html(doc.root()),
            r#"<pre data-source="a --&gt; &quot;b&quot;">x &lt; y</pre>"#
        );
    }

    #[test]
    fn void_and_self_closing_elements() {
        let doc = parse(r#"<p>a<br />b</p><svg><path d="M0 0"/></svg>"#);
        assert_eq!(
            doc.outer_html(doc.root()),
            r#"<p>a<br>b</p><svg><path d="M0 0"></path></svg>"#
        );
    }
}

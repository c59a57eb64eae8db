//! Text shaping for descriptions.

use markdown_lineref_markup::{Document, NodeData, NodeId};

pub const ELLIPSIS: &str = "...";

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep the first `max` characters, marking the cut with [`ELLIPSIS`].
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Collapsed text of `node`.
pub fn text_of(doc: &Document, node: NodeId) -> String {
    collapse(&doc.text_content(node))
}

/// Collapsed text of `node`, leaving out nested lists.
pub fn own_text(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    collect_own_text(doc, node, &mut out);
    collapse(&out)
}

fn collect_own_text(doc: &Document, node: NodeId, out: &mut String) {
    for child in doc.children(node) {
        match doc.data(*child) {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(e) if e.is("ul") || e.is("ol") => {}
            NodeData::Element(_) => collect_own_text(doc, *child, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markdown_lineref_markup::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("short", 10, "short")]
    #[case("exactly10!", 10, "exactly10!")]
    #[case("eleven char", 10, "eleven cha...")]
    #[case("ünïcödé text", 5, "ünïcö...")]
    fn test_truncate(#[case] text: &str, #[case] max: usize, #[case] expected: &str) {
        assert_eq!(truncate(text, max), expected);
    }

    #[test]
    fn test_own_text_skips_nested_lists() {
        let doc = parse("<li>Fruit <em>fresh</em><ul><li>Apple</li></ul></li>");
        let li = doc.find(doc.root(), |e| e.is("li")).unwrap();

        assert_eq!(own_text(&doc, li), "Fruit fresh");
        assert_eq!(text_of(&doc, li), "Fruit freshApple");
    }
}

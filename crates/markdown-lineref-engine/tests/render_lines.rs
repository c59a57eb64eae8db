use markdown_lineref_engine::render::{RenderOptions, render_markdown};
use markdown_lineref_markup::{Document, NodeId, parse};
use pretty_assertions::assert_eq;

const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "pre", "ul", "ol", "li", "blockquote", "hr",
    "table", "tr",
];

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.md",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn rendered(markdown: &str) -> Document {
    parse(&render_markdown(markdown, &RenderOptions::default()))
}

fn line(doc: &Document, node: NodeId) -> usize {
    doc.attr(node, "data-line")
        .unwrap_or_else(|| panic!("missing data-line on {}", doc.outer_html(node)))
        .parse()
        .unwrap()
}

/// Source text of a 1-based line.
fn source_line(markdown: &str, n: usize) -> &str {
    markdown.lines().nth(n - 1).unwrap()
}

#[test]
fn every_block_carries_a_valid_line() {
    let md = fixture("tour");
    let doc = rendered(&md);
    let line_count = md.lines().count();

    let blocks = doc.find_all(doc.root(), |e| {
        BLOCK_TAGS.iter().any(|t| e.is(t))
            && !e.classes().any(|c| c == "markdown-alert-title")
    });

    assert!(blocks.len() > 15, "only {} blocks rendered", blocks.len());
    for block in blocks {
        let n = line(&doc, block);
        assert!((1..=line_count).contains(&n), "{n} out of range");
    }
}

#[test]
fn lines_point_at_the_right_source() {
    let md = fixture("tour");
    let doc = rendered(&md);
    let text_at = |node| source_line(&md, line(&doc, node)).trim_start();

    for heading in doc.find_all(doc.root(), |e| e.is("h1") || e.is("h2")) {
        assert!(text_at(heading).starts_with('#'));
    }
    for row in doc.find_all(doc.root(), |e| e.is("tr")) {
        assert!(text_at(row).starts_with('|'));
    }
    for item in doc.find_all(doc.root(), |e| e.is("li")) {
        let text = text_at(item);
        assert!(
            text.starts_with("- ") || text.starts_with(|c: char| c.is_ascii_digit()),
            "{text}"
        );
    }

    let quote = doc.find(doc.root(), |e| e.is("blockquote")).unwrap();
    assert_eq!(line(&doc, quote), 12);
    let rule = doc.find(doc.root(), |e| e.is("hr")).unwrap();
    assert_eq!(line(&doc, rule), 30);
}

#[test]
fn fenced_code_lines_match_their_source_exactly() {
    let md = fixture("tour");
    let doc = rendered(&md);

    let spans = doc.find_all(doc.root(), |e| {
        e.is("span") && e.classes().any(|c| c == "code-line")
    });

    assert_eq!(spans.len(), 2);
    for span in spans {
        assert_eq!(doc.text_content(span), source_line(&md, line(&doc, span)));
    }
}

#[test]
fn diagram_fences_are_containers_without_code_lines() {
    let md = fixture("tour");
    let doc = rendered(&md);

    let container = doc
        .find(doc.root(), |e| e.is("pre") && e.classes().any(|c| c == "diagram"))
        .unwrap();

    assert_eq!(line(&doc, container), 25);
    assert_eq!(source_line(&md, 25), "```mermaid");
    assert_eq!(
        doc.attr(container, "data-source"),
        Some("flowchart TD\n  A[Start] --> B[End]\n")
    );
    assert!(doc.find(container, |e| e.is("code") || e.is("span")).is_none());
}

#[test]
fn nested_items_carry_their_own_lines() {
    let md = fixture("tour");
    let doc = rendered(&md);

    let lines: Vec<usize> = doc
        .find_all(doc.root(), |e| e.is("li"))
        .into_iter()
        .map(|li| line(&doc, li))
        .collect();

    assert_eq!(lines, vec![7, 8, 9, 10]);
}

use markdown_lineref_markup::{Document, NodeId};

use super::text::{collapse, own_text, text_of, truncate};
use super::{Pointable, PointableKind, RENDER_ERROR_ATTR};
use crate::diagram::DiagramMark;
use crate::diagram::stamp::{FROM_ATTR, TO_ATTR};

const FALLBACK_MAX: usize = 80;
const ITEM_MAX: usize = 60;
const LIST_ENTRY_MAX: usize = 20;
const DIAGRAM_MAX: usize = 40;
const FORMULA_MAX: usize = 60;
const PREVIEW_MAX: usize = 50;

/// One-line, type-tagged summary of a resolved element.
pub fn describe(doc: &Document, pointable: &Pointable) -> String {
    let node = pointable.node;
    match pointable.kind {
        PointableKind::RenderError => doc.attr(node, RENDER_ERROR_ATTR).unwrap_or("").to_string(),
        PointableKind::TableCell { row, col } => {
            let row_text = doc
                .closest(node, |e| e.is("tr"))
                .map(|tr| cells_text(doc, tr))
                .unwrap_or_default();
            format!(
                "table[row {row}, col {col}] cell: {} | row: {row_text}",
                text_of(doc, node)
            )
        }
        PointableKind::TableRow { row } => format!("table[row {row}] {}", cells_text(doc, node)),
        PointableKind::Table => doc
            .find(node, |e| e.is("tr"))
            .filter(|tr| doc.find(*tr, |e| e.is("th")).is_some())
            .map(|tr| cells_text(doc, tr))
            .unwrap_or_else(|| "(table)".to_string()),
        PointableKind::CodeLine => {
            let number = pointable.line.map_or("?".to_string(), |l| l.to_string());
            format!(
                "code[{} L{number}]: {}",
                code_language(doc, node),
                doc.text_content(node).trim()
            )
        }
        PointableKind::CodeBlock => code_block(doc, node),
        PointableKind::DiagramNode(mark) => diagram_node(doc, node, mark),
        PointableKind::DiagramContainer => {
            let source = doc.attr(node, "data-source").unwrap_or("");
            let first = source
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("");
            format!("mermaid diagram: {first}")
        }
        PointableKind::Formula => {
            let tex = doc
                .attr(node, "data-math")
                .map(collapse)
                .unwrap_or_else(|| text_of(doc, node));
            format!("$$ {} $$", truncate(&tex, FORMULA_MAX))
        }
        PointableKind::Heading { level } => format!("{} {}", "#".repeat(level), text_of(doc, node)),
        PointableKind::List { ordered } => list(doc, node, ordered),
        PointableKind::ListItem => list_item(doc, node),
        PointableKind::BlockQuote => format!("> {}", truncate(&text_of(doc, node), ITEM_MAX)),
        PointableKind::ThematicBreak => "---".to_string(),
        PointableKind::Other => truncate(&text_of(doc, node), FALLBACK_MAX),
    }
}

/// Cell texts of a row joined with ` | `.
fn cells_text(doc: &Document, row: NodeId) -> String {
    doc.element_children(row)
        .filter(|c| doc.is_element(*c, "td") || doc.is_element(*c, "th"))
        .map(|c| text_of(doc, c))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Language from the enclosing `<code class="language-x">`, else `text`.
fn code_language(doc: &Document, node: NodeId) -> String {
    let code = doc
        .closest(node, |e| e.is("code"))
        .or_else(|| doc.find(node, |e| e.is("code")));
    code.and_then(|c| doc.element(c))
        .and_then(|e| {
            e.classes()
                .find_map(|c| c.strip_prefix("language-"))
                .map(str::to_string)
        })
        .unwrap_or_else(|| "text".to_string())
}

fn code_block(doc: &Document, node: NodeId) -> String {
    let text = doc.text_content(node);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let preview = lines.iter().take(2).copied().collect::<Vec<_>>().join(" / ");
    let preview = if preview.chars().count() > PREVIEW_MAX {
        truncate(&preview, PREVIEW_MAX)
    } else if lines.len() > 2 {
        format!("{preview}{}", super::text::ELLIPSIS)
    } else {
        preview
    };
    format!("code[{}]: {preview}", code_language(doc, node))
}

fn diagram_node(doc: &Document, node: NodeId, mark: DiagramMark) -> String {
    let value = doc.attr(node, mark.attribute()).unwrap_or("");
    let body = match (doc.attr(node, FROM_ATTR), doc.attr(node, TO_ATTR)) {
        (Some(from), Some(to)) if mark.is_link() => format!("{from} {value} {to}"),
        _ => {
            // Nodes read by their drawn label, falling back to the id.
            let drawn = text_of(doc, node);
            let text = if mark == DiagramMark::Node && !drawn.is_empty() {
                drawn
            } else {
                collapse(value)
            };
            truncate(&text, DIAGRAM_MAX)
        }
    };
    format!("mermaid {}: {body}", mark.name())
}

fn list(doc: &Document, node: NodeId, ordered: bool) -> String {
    let start: usize = doc
        .attr(node, "start")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    doc.element_children(node)
        .filter(|c| doc.is_element(*c, "li"))
        .enumerate()
        .map(|(i, item)| {
            let prefix = if ordered {
                format!("{}.", start + i)
            } else {
                "-".to_string()
            };
            let nested = if has_nested_list(doc, item) { "[+]" } else { "" };
            format!("{prefix} {}{nested}", truncate(&own_text(doc, item), LIST_ENTRY_MAX))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn list_item(doc: &Document, node: NodeId) -> String {
    let parent = doc.parent(node);
    let prefix = match parent.filter(|p| doc.is_element(*p, "ol")) {
        Some(ol) => {
            let start: usize = doc.attr(ol, "start").and_then(|s| s.parse().ok()).unwrap_or(1);
            let index = doc
                .element_children(ol)
                .filter(|c| doc.is_element(*c, "li"))
                .position(|c| c == node)
                .unwrap_or(0);
            format!("{}.", start + index)
        }
        None => "-".to_string(),
    };
    let nested = if has_nested_list(doc, node) { " (+ nested)" } else { "" };
    format!("{prefix} {}{nested}", truncate(&own_text(doc, node), ITEM_MAX))
}

fn has_nested_list(doc: &Document, item: NodeId) -> bool {
    doc.find(item, |e| e.is("ul") || e.is("ol")).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointing::resolve;
    use markdown_lineref_markup::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn describe_id(html: &str, id: &str) -> String {
        let doc = parse(html);
        let target = doc.find(doc.root(), |e| e.attr("id") == Some(id)).unwrap();
        let pointable = resolve(&doc, target).unwrap();
        describe(&doc, &pointable)
    }

    const TABLE: &str = r#"<table data-line="1"><thead><tr data-line="1"><th>Name</th><th>Qty</th></tr></thead><tbody><tr data-line="3" id="row"><td>Apple</td><td id="cell"><b>4</b></td></tr></tbody></table>"#;

    #[rstest]
    #[case(TABLE, "cell", "table[row 2, col 2] cell: 4 | row: Apple | 4")]
    #[case(TABLE, "row", "table[row 2] Apple | 4")]
    #[case(
        r#"<pre data-line="2"><code class="language-rust"><span class="code-line" data-line="3" id="l">  let x = 1;</span></code></pre>"#,
        "l",
        "code[rust L3]: let x = 1;"
    )]
    #[case(
        r#"<pre data-line="2" id="pre"><code><span class="code-line" data-line="3">a</span>
<span class="code-line" data-line="4">b</span>
<span class="code-line" data-line="5">c</span></code></pre>"#,
        "pre",
        "code[text]: a / b..."
    )]
    #[case(r#"<h3 data-line="1" id="h">Setup <em>steps</em></h3>"#, "h", "### Setup steps")]
    #[case(
        r#"<ol data-line="1" start="3" id="ol"><li data-line="1">three</li><li data-line="2">a much longer item text here<ul data-line="3"><li data-line="3">x</li></ul></li></ol>"#,
        "ol",
        "3. three, 4. a much longer item t...[+]"
    )]
    #[case(r#"<blockquote data-line="1" id="q"><p data-line="1">Quoted  words</p></blockquote>"#, "q", "> Quoted words")]
    #[case(r#"<hr data-line="9" id="hr">"#, "hr", "---")]
    #[case(
        r#"<pre class="diagram" data-line="4" data-source="%% c&#10;flowchart TD&#10;A --&gt; B" id="d"></pre>"#,
        "d",
        "mermaid diagram: %% c"
    )]
    #[case(
        r#"<div class="math math-display" data-line="2" data-math="x^2   +  y^2" id="m"><span>rendered</span></div>"#,
        "m",
        "$$ x^2 + y^2 $$"
    )]
    #[case(
        r#"<p data-line="2">e <span class="math math-inline" data-render-error="KaTeX parse error: Undefined control sequence" id="err">\bad</span></p>"#,
        "err",
        "KaTeX parse error: Undefined control sequence"
    )]
    fn test_describes(#[case] html: &str, #[case] id: &str, #[case] expected: &str) {
        assert_eq!(describe_id(html, id), expected);
    }

    #[test]
    fn test_header_row_describes_the_table() {
        let doc = parse(TABLE);
        let table = doc.find(doc.root(), |e| e.is("table")).unwrap();
        let pointable = Pointable {
            node: table,
            line: Some(1),
            kind: PointableKind::Table,
        };
        assert_eq!(describe(&doc, &pointable), "Name | Qty");

        let bare = parse("<table><tr><td>1</td></tr></table>");
        let table = bare.find(bare.root(), |e| e.is("table")).unwrap();
        assert_eq!(
            describe(&bare, &Pointable { node: table, line: None, kind: PointableKind::Table }),
            "(table)"
        );
    }

    #[test]
    fn test_long_list_item_is_cut_at_sixty() {
        let text = "x".repeat(70);
        let html = format!(r#"<ul data-line="1"><li data-line="1" id="li">{text}</li></ul>"#);

        assert_eq!(describe_id(&html, "li"), format!("- {}...", "x".repeat(60)));
    }

    #[test]
    fn test_code_line_is_never_cut() {
        // Given a code line well past every description limit
        let line = format!("let total = {};", "a + ".repeat(30));
        let html = format!(
            r#"<pre data-line="1"><code class="language-rust"><span class="code-line" data-line="2" id="l">{line}</span></code></pre>"#
        );

        // Then the whole line is described
        assert_eq!(describe_id(&html, "l"), format!("code[rust L2]: {}", line.trim()));
    }

    #[test]
    fn test_fallback_is_cut_at_eighty() {
        let text = "y".repeat(90);
        let html = format!(r#"<p data-line="1" id="p">{text}</p>"#);

        assert_eq!(describe_id(&html, "p"), format!("{}...", "y".repeat(80)));
    }

    #[test]
    fn test_diagram_links_show_their_endpoints() {
        let html = r#"<svg><path data-source-line="2" data-mermaid-edge="--&gt;" data-mermaid-from="A" data-mermaid-to="B" id="e"></path><rect class="hit-area" data-source-line="2" data-mermaid-edge="--&gt;" data-mermaid-from="A" data-mermaid-to="B" id="hit"></rect><g data-source-line="2" data-mermaid-node="A" id="n"><text>Start here</text></g><g data-source-line="3" data-mermaid-class="Animal" id="c"><text>Animal</text><text>+name</text></g></svg>"#;

        assert_eq!(describe_id(html, "e"), "mermaid edge: A --> B");
        assert_eq!(describe_id(html, "hit"), "mermaid edge: A --> B");
        assert_eq!(describe_id(html, "n"), "mermaid node: Start here");
        assert_eq!(describe_id(html, "c"), "mermaid class: Animal");
    }
}

use markdown_lineref_markup::{Document, Element, NodeId};

use super::{Pointable, PointableKind, RENDER_ERROR_ATTR, RENDER_ERROR_LINE_ATTR};
use crate::diagram::{DiagramMark, SOURCE_LINE_ATTR};
use crate::render::LINE_ATTR;

/// Nearest element worth referencing at or above `target`, or `None` for a
/// click on the page background.
///
/// Rules are tried in order, each against the whole ancestry: a failed
/// formula or diagram, a table cell, a code line, a stamped diagram element,
/// any line-tagged block, an unrendered diagram container, a formula.
pub fn resolve(doc: &Document, target: NodeId) -> Option<Pointable> {
    let target = nearest_element(doc, target)?;
    let pointable = |node: NodeId, kind: PointableKind| Pointable {
        node,
        line: line_of(doc, node),
        kind,
    };

    if let Some(holder) = doc.closest(target, |e| e.attr(RENDER_ERROR_ATTR).is_some()) {
        let line = doc
            .attr(holder, RENDER_ERROR_LINE_ATTR)
            .and_then(|l| l.parse().ok())
            .or_else(|| line_of(doc, holder));
        return Some(Pointable {
            node: holder,
            line,
            kind: PointableKind::RenderError,
        });
    }

    if let Some(cell) = doc.closest(target, |e| e.is("td") || e.is("th")) {
        let row = doc.closest(cell, |e| e.is("tr"));
        let kind = PointableKind::TableCell {
            row: row.and_then(|r| row_number(doc, r)).unwrap_or(1),
            col: doc.element_index(cell).map_or(1, |i| i + 1),
        };
        return Some(pointable(cell, kind));
    }

    if let Some(code_line) =
        doc.closest(target, |e| e.is("span") && has_class(e, "code-line"))
    {
        return Some(pointable(code_line, PointableKind::CodeLine));
    }

    if let Some(stamped) = doc.closest(target, |e| e.attr(SOURCE_LINE_ATTR).is_some()) {
        let mark = doc
            .element(stamped)
            .and_then(DiagramMark::of)
            .map_or(DiagramMark::Node, |(mark, _)| mark);
        return Some(pointable(stamped, PointableKind::DiagramNode(mark)));
    }

    if let Some(block) = doc.closest(target, |e| e.attr(LINE_ATTR).is_some()) {
        return Some(pointable(block, classify(doc, block)));
    }

    if let Some(container) = doc.closest(target, is_diagram_container) {
        return Some(pointable(container, PointableKind::DiagramContainer));
    }

    doc.closest(target, |e| has_class(e, "math"))
        .map(|formula| pointable(formula, PointableKind::Formula))
}

/// The element's own stamped or block line, else the nearest enclosing
/// block's line.
pub fn line_of(doc: &Document, node: NodeId) -> Option<usize> {
    let own = doc
        .attr(node, SOURCE_LINE_ATTR)
        .or_else(|| doc.attr(node, LINE_ATTR))
        .and_then(|l| l.trim().parse().ok());
    own.or_else(|| {
        doc.ancestors(node)
            .filter_map(|n| doc.attr(n, LINE_ATTR))
            .find_map(|l| l.trim().parse().ok())
    })
}

fn nearest_element(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.ancestors(node).find(|n| doc.element(*n).is_some())
}

fn has_class(element: &Element, class: &str) -> bool {
    element.classes().any(|c| c == class)
}

fn is_diagram_container(element: &Element) -> bool {
    element.is("pre") && has_class(element, "diagram")
}

/// 1-based position of `row` among every row of its table.
fn row_number(doc: &Document, row: NodeId) -> Option<usize> {
    let table = doc.closest(row, |e| e.is("table"))?;
    doc.find_all(table, |e| e.is("tr"))
        .iter()
        .position(|r| *r == row)
        .map(|i| i + 1)
}

fn classify(doc: &Document, node: NodeId) -> PointableKind {
    let Some(element) = doc.element(node) else {
        return PointableKind::Other;
    };
    let name = element.name.to_ascii_lowercase();

    if has_class(element, "math") {
        return PointableKind::Formula;
    }
    if is_diagram_container(element) {
        return PointableKind::DiagramContainer;
    }
    match name.as_str() {
        "pre" => PointableKind::CodeBlock,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => PointableKind::Heading {
            level: name[1..].parse().unwrap_or(1),
        },
        "ul" => PointableKind::List { ordered: false },
        "ol" => PointableKind::List { ordered: true },
        "li" => PointableKind::ListItem,
        "blockquote" => PointableKind::BlockQuote,
        "hr" => PointableKind::ThematicBreak,
        "tr" => PointableKind::TableRow {
            row: row_number(doc, node).unwrap_or(1),
        },
        "table" => PointableKind::Table,
        _ => PointableKind::Other,
    }
}

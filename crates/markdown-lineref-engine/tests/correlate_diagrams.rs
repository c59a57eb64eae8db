//! Diagram correlation against library-shaped output.
//!
//! Matching is best-effort: duplicate names collapse to their first line,
//! and positional matches assume the library draws in declaration order.

use markdown_lineref_engine::diagram::{DiagramKind, SOURCE_LINE_ATTR, SourceMaps, correlate};
use markdown_lineref_engine::pointing::{PointableKind, describe, resolve};
use markdown_lineref_markup::{Document, NodeId, parse, parse_fragment_into};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn line_of_id(doc: &Document, id: &str) -> Option<usize> {
    let node = doc.find(doc.root(), |e| e.attr("id") == Some(id))?;
    doc.attr(node, SOURCE_LINE_ATTR)?.parse().ok()
}

#[test]
fn minimal_flowchart_maps_everything_to_line_two() {
    let source = "flowchart TD\nA[Start] --> B[End]";

    let maps = SourceMaps::build(DiagramKind::Flowchart, source, 0);

    assert_eq!(maps.node_line("A"), Some(2));
    assert_eq!(maps.node_line("B"), Some(2));
    assert_eq!(maps.arrow("A", "B").map(|a| a.line), Some(2));
}

#[test]
fn gantt_tasks_with_the_same_name_keep_their_lines() {
    // Given two tasks both called "Review"
    let source = "gantt
  title Release
  section Build
  Review :a1, 2024-01-01, 1d
  Review :a2, after a1, 1d
";
    let mut doc = parse(
        r#"<svg><g><rect id="a1" class="task task0" x="0" y="48" width="90" height="20"></rect><rect id="a2" class="task task0" x="90" y="72" width="60" height="20"></rect></g></svg>"#,
    );
    let root = doc.root();

    // When the chart is correlated as the diagram opening on line 10
    correlate(source, 10, &mut doc, root);

    // Then each bar keeps its own source line
    assert_eq!(line_of_id(&doc, "a1"), Some(14));
    assert_eq!(line_of_id(&doc, "a2"), Some(15));
}

#[test]
fn stamped_lines_stay_inside_each_diagram() {
    let svg = r#"<svg><g class="node default" id="flowchart-A-0"><text>A</text></g><g class="node default" id="flowchart-B-1"><text>B</text></g></svg>"#;
    let mut doc = parse(
        r#"<pre class="diagram" id="one" data-line="1"></pre><pre class="diagram" id="two" data-line="20"></pre>"#,
    );
    let first = doc.find(doc.root(), |e| e.attr("id") == Some("one")).unwrap();
    let second = doc.find(doc.root(), |e| e.attr("id") == Some("two")).unwrap();
    parse_fragment_into(&mut doc, first, svg);
    parse_fragment_into(&mut doc, second, svg);

    correlate("flowchart TD\nA --> B", 1, &mut doc, first);
    correlate("flowchart LR\n\n\nB --> A", 20, &mut doc, second);

    let lines = |container: NodeId| -> Vec<usize> {
        doc.find_all(container, |e| e.attr(SOURCE_LINE_ATTR).is_some())
            .into_iter()
            .filter_map(|n| doc.attr(n, SOURCE_LINE_ATTR)?.parse().ok())
            .collect()
    };
    assert_eq!(lines(first), vec![3, 3]);
    assert_eq!(lines(second), vec![24, 24]);
}

#[test]
fn table_cell_inside_diagram_beats_the_container() {
    let doc = parse(
        r#"<pre class="diagram" data-line="5"><table><tr><th>k</th></tr><tr data-line="7"><td>v</td><td><b id="hit">w</b></td></tr></table></pre>"#,
    );
    let target = doc.find(doc.root(), |e| e.attr("id") == Some("hit")).unwrap();

    let pointable = resolve(&doc, target).unwrap();

    assert_eq!(pointable.kind, PointableKind::TableCell { row: 2, col: 2 });
    assert_eq!(pointable.line, Some(7));
    assert_eq!(describe(&doc, &pointable), "table[row 2, col 2] cell: w | row: v | w");
}

#[rstest]
#[case::sequence(
    "sequenceDiagram\n  participant Alice\n  Alice->>Bob: Hello",
    r#"<svg><text class="actor" id="t">Bob</text></svg>"#,
    Some(3)
)]
#[case::state(
    "stateDiagram-v2\n  [*] --> Idle\n  Idle --> Busy",
    r#"<svg><g class="node statediagram-state" id="state-Busy-3"><text id="t">Busy</text></g></svg>"#,
    Some(3)
)]
#[case::unknown_kind(
    "journey\n  title Day",
    r#"<svg><g class="node" id="t"></g></svg>"#,
    None
)]
fn nodes_resolve_to_their_first_mention(
    #[case] source: &str,
    #[case] svg: &str,
    #[case] expected: Option<usize>,
) {
    let mut doc = parse(svg);
    let root = doc.root();

    correlate(source, 0, &mut doc, root);

    let target = doc.find(root, |e| e.attr("id") == Some("t")).unwrap();
    assert_eq!(resolve(&doc, target).and_then(|p| p.line), expected);
}

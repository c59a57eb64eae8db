use regex::Regex;
use std::sync::LazyLock;

use super::rendered_name;
use crate::diagram::DiagramMark;
use crate::diagram::source_map::{Arrow, SourceLine, SourceMaps};
use crate::diagram::stamp::{Stamper, has_class, text_of};

static ALIASED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^state\s+"([^"]+)"\s+as\s+(\w+)"#).expect("Invalid state alias regex")
});

static DECLARED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^state\s+(\w+)").expect("Invalid state regex"));

static TRANSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s*-->\s*(\S+?)\s*(?::\s*(.+))?$").expect("Invalid transition regex")
});

static DESCRIBED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*:\s*(.+)$").expect("Invalid description regex"));

static RENDERED_STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^state-(.+)-\d+$").expect("Invalid state id regex"));

/// Start and end pseudo-states have no name to look up.
const PSEUDO_STATE: &str = "[*]";

pub fn scan(maps: &mut SourceMaps, line: &SourceLine<'_>) {
    if line.header || line.text.starts_with("note") || line.text.starts_with('}') {
        return;
    }
    let n = line.number;

    if let Some(caps) = ALIASED.captures(line.text) {
        maps.add_node(&caps[2], n);
        maps.add_node(&caps[1], n);
    } else if let Some(caps) = DECLARED.captures(line.text) {
        maps.add_node(&caps[1], n);
    } else if let Some(caps) = TRANSITION.captures(line.text) {
        let (from, to) = (&caps[1], &caps[2]);
        let label = caps.get(3).map(|m| m.as_str().trim());
        for state in [from, to] {
            if state != PSEUDO_STATE {
                maps.add_node(state, n);
            }
        }
        maps.add_link(Arrow::new(n, from, to, "-->").with_label(label));
        if let Some(label) = label {
            maps.add_label(&format!("state:{label}"), n);
        }
    } else if let Some(caps) = DESCRIBED.captures(line.text) {
        maps.add_node(&caps[1], n);
    }
}

pub fn stamp(maps: &SourceMaps, stamper: &mut Stamper<'_>) {
    for node in stamper.select(|e| e.is("g") && has_class(e, "node")) {
        let name = stamper
            .doc()
            .element(node)
            .and_then(|e| rendered_name(e, &RENDERED_STATE));
        if let Some(name) = name
            && let Some(line) = maps.node_line(&name)
        {
            stamper.stamp(node, line, DiagramMark::State, &name);
        }
    }

    // Transition ids share a counter with nodes, so only their order is usable.
    let transitions = stamper.select(|e| e.is("path") && has_class(e, "transition"));
    for (path, link) in transitions.into_iter().zip(&maps.links) {
        stamper.stamp_link(path, DiagramMark::Transition, link);
    }

    for label in stamper.select(|e| e.is("g") && has_class(e, "edgeLabel")) {
        let text = text_of(stamper.doc(), label);
        if let Some(line) = maps.label_line(&format!("state:{text}")) {
            stamper.stamp(label, line, DiagramMark::Label, &text);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::diagram::{DiagramKind, SOURCE_LINE_ATTR, SourceMaps, correlate};
    use markdown_lineref_markup::parse;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"stateDiagram-v2
    [*] --> Still
    state "Moving fast" as Moving
    Still --> Moving : push
    Moving --> [*]
"#;

    #[test]
    fn test_scans_states_and_transitions() {
        let maps = SourceMaps::build(DiagramKind::State, SOURCE, 20);

        assert_eq!(maps.node_line("Still"), Some(22));
        assert_eq!(maps.node_line("Moving"), Some(23));
        assert_eq!(maps.node_line("Moving fast"), Some(23));
        assert_eq!(maps.node_line("[*]"), None);
        assert_eq!(
            maps.links.iter().map(|l| l.line).collect::<Vec<_>>(),
            vec![22, 24, 25]
        );
        assert_eq!(maps.label_line("state:push"), Some(24));
    }

    #[test]
    fn test_stamps_states_transitions_and_labels() {
        let mut doc = parse(
            r#"<svg><g class="node" id="state-root_start-0"><circle r="7"></circle></g><g class="node statediagram-state" id="state-Still-1"><rect width="50" height="40"></rect></g><g class="node statediagram-state" id="state-Moving-2"><rect width="50" height="40"></rect></g><path class="transition" id="edge3" d="M0,0L0,40"></path><path class="transition" id="edge4" d="M0,60L0,100"></path><path class="transition" id="edge5" d="M0,120L0,160"></path><g class="edgeLabel"><span>push</span></g></svg>"#,
        );
        let root = doc.root();

        correlate(SOURCE, 20, &mut doc, root);

        let by_id = |id: &str| doc.find(root, |e| e.attr("id") == Some(id)).unwrap();
        assert_eq!(doc.attr(by_id("state-root_start-0"), SOURCE_LINE_ATTR), None);
        assert_eq!(doc.attr(by_id("state-Still-1"), SOURCE_LINE_ATTR), Some("22"));
        assert_eq!(doc.attr(by_id("state-Moving-2"), "data-mermaid-state"), Some("Moving"));

        let push = by_id("edge4");
        assert_eq!(doc.attr(push, SOURCE_LINE_ATTR), Some("24"));
        assert_eq!(doc.attr(push, "data-mermaid-from"), Some("Still"));
        assert_eq!(doc.attr(by_id("edge5"), "data-mermaid-to"), Some("[*]"));

        let label = doc.find(root, |e| e.attr("class") == Some("edgeLabel")).unwrap();
        assert_eq!(doc.attr(label, SOURCE_LINE_ATTR), Some("24"));
    }
}

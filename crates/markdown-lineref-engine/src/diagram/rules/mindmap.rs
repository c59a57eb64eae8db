use regex::Regex;
use std::sync::LazyLock;

use crate::diagram::DiagramMark;
use crate::diagram::source_map::{Item, SourceLine, SourceMaps};
use crate::diagram::stamp::{Stamper, has_class};

/// `id((text))`, `id[text]`, `id{{text}}` and the other node shapes.
static SHAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\[\(\{\)]*?(?:\[|\(\(|\(-|\(|\)\)|\)|\{\{)(.+?)(?:\]|\)\)|-\)|\)|\(\(|\(|\}\})$")
        .expect("Invalid mindmap shape regex")
});

/// Every node is one indented line; hierarchy comes from indentation and
/// rendering follows declaration order.
pub fn scan(maps: &mut SourceMaps, line: &SourceLine<'_>) {
    if line.header || line.text.starts_with("::icon") || line.text.starts_with(":::") {
        return;
    }
    let text = SHAPED
        .captures(line.text)
        .and_then(|caps| caps.get(1))
        .map_or(line.text, |m| m.as_str())
        .trim();
    maps.items.push(Item {
        line: line.number,
        text: text.to_string(),
    });
}

pub fn stamp(maps: &SourceMaps, stamper: &mut Stamper<'_>) {
    let nodes = stamper.select(|e| e.is("g") && has_class(e, "mindmap-node"));
    for (node, item) in nodes.into_iter().zip(&maps.items) {
        stamper.stamp(node, item.line, DiagramMark::Node, &item.text);
    }
}

#[cfg(test)]
mod tests {
    use crate::diagram::{DiagramKind, SOURCE_LINE_ATTR, SourceMaps, correlate};
    use markdown_lineref_markup::parse;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "mindmap
  root((Central))
    A[Square]
    Plain idea
      ::icon(fa fa-book)
";

    #[test]
    fn test_scans_node_text_without_shapes() {
        let maps = SourceMaps::build(DiagramKind::Mindmap, SOURCE, 0);

        assert_eq!(
            maps.items
                .iter()
                .map(|i| (i.line, i.text.as_str()))
                .collect::<Vec<_>>(),
            vec![(2, "Central"), (3, "Square"), (4, "Plain idea")]
        );
    }

    #[test]
    fn test_stamps_nodes_in_order() {
        let mut doc = parse(
            r#"<svg><g class="mindmap-node section-root"><circle r="30"></circle></g><g class="mindmap-node section-0"><rect width="60" height="30"></rect></g><g class="mindmap-node section-1"><path d="M0,0"></path></g></svg>"#,
        );
        let root = doc.root();

        let report = correlate(SOURCE, 0, &mut doc, root);

        let nodes = doc.find_all(root, |e| e.is("g"));
        let lines: Vec<_> = nodes.iter().map(|n| doc.attr(*n, SOURCE_LINE_ATTR)).collect();
        assert_eq!(lines, vec![Some("2"), Some("3"), Some("4")]);
        assert_eq!(doc.attr(nodes[0], "data-mermaid-node"), Some("Central"));
        assert_eq!(report.stamped, 3);
    }
}

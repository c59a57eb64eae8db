use markdown_lineref_markup::Element;
use regex::Regex;
use std::sync::LazyLock;

use super::{rendered_name, unquote};
use crate::diagram::DiagramMark;
use crate::diagram::source_map::{Arrow, SourceLine, SourceMaps};
use crate::diagram::stamp::{Stamper, has_class, text_of};

/// Node id followed by a shape: `A[..]`, `B((..))`, `C{..}`, `D>..]` and so on.
/// Ids may contain single hyphens (`node-1`) but never a link's `--` or `-.`.
static SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\w+(?:-\w+)*)(?:\[\[.*?\]\]|\[\(.*?\)\]|\(\(\(.*?\)\)\)|\(\(.*?\)\)|\(\[.*?\]\)|\[/.*?[/\\]\]|\[\\.*?[/\\]\]|\[.*?\]|\{\{.*?\}\}|\{.*?\}|\(.*?\)|>.*?\]|@\{.*?\})",
    )
    .expect("Invalid flowchart shape regex")
});

static CLASS_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":::[\w-]+").expect("Invalid class suffix regex"));

/// A link with its optional `-- text -->` or `-->|text|` label.
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\s*(?:(?:--|==|-\.)\s+(?P<text>[^\s>|][^>|]*?)\s+)?(?P<arrow><?(?:-{2,}|={2,}|-?\.+-|~{3,})[>xo]?)(?:\s*\|(?P<pipe>[^|]*)\|)?\s*",
    )
    .expect("Invalid flowchart link regex")
});

static SUBGRAPH_TITLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\s*\[(.*)\]$").expect("Invalid subgraph regex")
});

static NODE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+(?:-\w+)*$").expect("Invalid node id regex"));

static RENDERED_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^flowchart-(.+)-\d+$").expect("Invalid node id regex"));

static RENDERED_EDGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^L[-_](.+?)[-_]\d+$").expect("Invalid edge id regex"));

const KEYWORDS: &[&str] = &[
    "end",
    "style",
    "classDef",
    "class",
    "click",
    "linkStyle",
    "direction",
    "accTitle",
    "accDescr",
];

pub fn scan(maps: &mut SourceMaps, line: &SourceLine<'_>) {
    if line.header {
        return;
    }
    let keyword = line.text.split_whitespace().next().unwrap_or("");
    if KEYWORDS.contains(&keyword.trim_end_matches(':')) {
        return;
    }

    if let Some(rest) = line.text.strip_prefix("subgraph ") {
        let rest = rest.trim();
        match SUBGRAPH_TITLED.captures(rest) {
            Some(caps) => {
                maps.add_node(&caps[1], line.number);
                maps.add_node(unquote(&caps[2]), line.number);
            }
            None => maps.add_node(unquote(rest), line.number),
        }
        return;
    }

    let text = SHAPE.replace_all(line.text, "$1");
    let text = CLASS_SUFFIX.replace_all(&text, "");

    let mut segments = Vec::new();
    let mut links = Vec::new();
    let mut last = 0;
    for caps in LINK.captures_iter(&text) {
        let Some(whole) = caps.get(0) else { continue };
        segments.push(&text[last..whole.start()]);
        last = whole.end();
        let label = caps
            .name("pipe")
            .or_else(|| caps.name("text"))
            .map(|m| unquote(m.as_str()));
        links.push((caps["arrow"].to_string(), label));
    }
    segments.push(&text[last..]);

    let groups: Vec<Vec<&str>> = segments
        .iter()
        .map(|segment| {
            segment
                .split('&')
                .map(str::trim)
                .filter(|id| NODE_ID.is_match(id))
                .collect()
        })
        .collect();

    for id in groups.iter().flatten() {
        maps.add_node(id, line.number);
    }
    for (i, (arrow, label)) in links.iter().enumerate() {
        let (Some(sources), Some(targets)) = (groups.get(i), groups.get(i + 1)) else {
            continue;
        };
        for from in sources {
            for to in targets {
                maps.add_link(Arrow::new(line.number, from, to, arrow).with_label(*label));
            }
        }
        if let Some(label) = label {
            maps.add_label(label, line.number);
        }
    }
}

pub fn stamp(maps: &SourceMaps, stamper: &mut Stamper<'_>) {
    for node in stamper.select(|e| e.is("g") && has_class(e, "node")) {
        let name = stamper
            .doc()
            .element(node)
            .and_then(|e| rendered_name(e, &RENDERED_NODE));
        if let Some(name) = name
            && let Some(line) = maps.node_line(&name)
        {
            stamper.stamp(node, line, DiagramMark::Node, &name);
        }
    }

    for cluster in stamper.select(|e| e.is("g") && has_class(e, "cluster")) {
        let doc = stamper.doc();
        let id = doc.attr(cluster, "id").unwrap_or("").to_string();
        let title = text_of(doc, cluster);
        let found = maps
            .node_line(&id)
            .or_else(|| maps.node_line(&title))
            .map(|line| (line, if title.is_empty() { id } else { title }));
        if let Some((line, value)) = found {
            stamper.stamp(cluster, line, DiagramMark::Subgraph, &value);
        }
    }

    let edges = stamper.select(|e| {
        e.is("path")
            && (has_class(e, "flowchart-link")
                || e.attr("id").is_some_and(|id| RENDERED_EDGE.is_match(id)))
    });
    for edge in edges {
        let arrow = stamper.doc().element(edge).and_then(|e| edge_arrow(maps, e));
        if let Some(arrow) = arrow {
            stamper.stamp_link(edge, DiagramMark::Edge, arrow);
        }
    }

    for label in stamper.select(|e| e.is("g") && has_class(e, "edgeLabel")) {
        let text = text_of(stamper.doc(), label);
        if let Some(line) = maps.label_line(&text) {
            stamper.stamp(label, line, DiagramMark::Label, &text);
        }
    }
}

/// Endpoints from `LS-`/`LE-` classes, else from an `L-A-B-0` style id.
fn edge_arrow<'m>(maps: &'m SourceMaps, element: &Element) -> Option<&'m Arrow> {
    let start = element.classes().find_map(|c| c.strip_prefix("LS-"));
    let end = element.classes().find_map(|c| c.strip_prefix("LE-"));
    if let (Some(from), Some(to)) = (start, end)
        && let Some(arrow) = maps.arrow(from, to)
    {
        return Some(arrow);
    }

    let id = element.attr("id")?;
    let body = RENDERED_EDGE.captures(id)?.get(1)?.as_str();
    body.match_indices(['-', '_'])
        .find_map(|(i, _)| maps.arrow(&body[..i], &body[i + 1..]))
}

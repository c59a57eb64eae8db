//! Maps rendered diagram output back to diagram source lines.
//!
//! The diagram library's output ids and class names carry no source
//! positions, so correlation works in two passes:
//!
//! 1. [`SourceMaps::build`] re-reads the diagram source line by line with a
//!    per-kind rule set, recording where each name, link and label was
//!    declared.
//! 2. The kind's stamping rules walk the rendered SVG, recover each visual
//!    element's identity from its id, classes or text, and stamp
//!    `data-source-line` plus one `data-mermaid-*` marker naming what it is.
//!
//! Correlation is best-effort. A name declared twice maps to its first
//! line, and index-matched elements (messages, tasks, commits, mindmap
//! nodes) assume the library draws them in declaration order. Anything left
//! unstamped resolves through the container's own `data-line`.

pub mod rules;
pub mod source_map;
pub mod stamp;

pub use source_map::{Arrow, SourceMaps, significant_lines};
pub use stamp::{SOURCE_LINE_ATTR, Stamper};

use markdown_lineref_markup::{Document, Element, NodeId};
use std::fmt;

/// Diagram kinds with their own correlation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
    State,
    Er,
    Gantt,
    Pie,
    Git,
    Mindmap,
    /// Anything else. Tolerated; it simply stamps nothing.
    Unknown,
}

impl DiagramKind {
    /// Detect the kind from the keyword of the first significant line.
    pub fn detect(source: &str) -> Self {
        let Some((_, first)) = significant_lines(source).into_iter().next() else {
            return Self::Unknown;
        };
        let keyword = first
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_end_matches(':')
            .to_ascii_lowercase();

        match keyword.as_str() {
            "flowchart" | "graph" | "flowchart-elk" => Self::Flowchart,
            "sequencediagram" => Self::Sequence,
            "classdiagram" | "classdiagram-v2" => Self::Class,
            "statediagram" | "statediagram-v2" => Self::State,
            "erdiagram" => Self::Er,
            "gantt" => Self::Gantt,
            "pie" => Self::Pie,
            "gitgraph" => Self::Git,
            "mindmap" => Self::Mindmap,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequence",
            Self::Class => "class",
            Self::State => "state",
            Self::Er => "er",
            Self::Gantt => "gantt",
            Self::Pie => "pie",
            Self::Git => "git",
            Self::Mindmap => "mindmap",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a stamped diagram element is. Each variant owns one
/// `data-mermaid-<name>` attribute holding the element's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramMark {
    Node,
    Subgraph,
    Edge,
    Label,
    Class,
    Relation,
    Member,
    Message,
    Arrow,
    State,
    Transition,
    Attribute,
    Entity,
    Relationship,
    Task,
    Section,
    Title,
    Slice,
    Legend,
    Commit,
    Branch,
}

impl DiagramMark {
    /// Lookup order used when reading marks back from an element.
    pub const ALL: [DiagramMark; 21] = [
        Self::Node,
        Self::Subgraph,
        Self::Edge,
        Self::Label,
        Self::Class,
        Self::Relation,
        Self::Member,
        Self::Message,
        Self::Arrow,
        Self::State,
        Self::Transition,
        Self::Attribute,
        Self::Entity,
        Self::Relationship,
        Self::Task,
        Self::Section,
        Self::Title,
        Self::Slice,
        Self::Legend,
        Self::Commit,
        Self::Branch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Subgraph => "subgraph",
            Self::Edge => "edge",
            Self::Label => "label",
            Self::Class => "class",
            Self::Relation => "relation",
            Self::Member => "member",
            Self::Message => "message",
            Self::Arrow => "arrow",
            Self::State => "state",
            Self::Transition => "transition",
            Self::Attribute => "attribute",
            Self::Entity => "entity",
            Self::Relationship => "relationship",
            Self::Task => "task",
            Self::Section => "section",
            Self::Title => "title",
            Self::Slice => "slice",
            Self::Legend => "legend",
            Self::Commit => "commit",
            Self::Branch => "branch",
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            Self::Node => "data-mermaid-node",
            Self::Subgraph => "data-mermaid-subgraph",
            Self::Edge => "data-mermaid-edge",
            Self::Label => "data-mermaid-label",
            Self::Class => "data-mermaid-class",
            Self::Relation => "data-mermaid-relation",
            Self::Member => "data-mermaid-member",
            Self::Message => "data-mermaid-message",
            Self::Arrow => "data-mermaid-arrow",
            Self::State => "data-mermaid-state",
            Self::Transition => "data-mermaid-transition",
            Self::Attribute => "data-mermaid-attribute",
            Self::Entity => "data-mermaid-entity",
            Self::Relationship => "data-mermaid-relationship",
            Self::Task => "data-mermaid-task",
            Self::Section => "data-mermaid-section",
            Self::Title => "data-mermaid-title",
            Self::Slice => "data-mermaid-slice",
            Self::Legend => "data-mermaid-legend",
            Self::Commit => "data-mermaid-commit",
            Self::Branch => "data-mermaid-branch",
        }
    }

    /// Links carry their endpoints and render as `A --> B`.
    pub fn is_link(self) -> bool {
        matches!(
            self,
            Self::Edge | Self::Relation | Self::Arrow | Self::Transition | Self::Relationship
        )
    }

    /// The first mark stamped on `element`, with its value.
    pub fn of(element: &Element) -> Option<(Self, &str)> {
        Self::ALL
            .into_iter()
            .find_map(|mark| element.attr(mark.attribute()).map(|value| (mark, value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationReport {
    pub kind: DiagramKind,
    pub stamped: usize,
    pub overlays: usize,
}

/// Stamp source lines onto the rendered diagram under `root`.
///
/// `base_line` is the container's own `data-line` (the opening fence), so
/// source line `i` (0-based) is document line `base_line + i + 1`.
pub fn correlate(
    source: &str,
    base_line: usize,
    doc: &mut Document,
    root: NodeId,
) -> CorrelationReport {
    let kind = DiagramKind::detect(source);
    let maps = SourceMaps::build(kind, source, base_line);
    let span = base_line..=base_line + source.lines().count();

    let mut stamper = Stamper::new(doc, root, span);
    rules::stamp(kind, &maps, &mut stamper);

    let report = CorrelationReport {
        kind,
        stamped: stamper.stamped(),
        overlays: stamper.overlays(),
    };
    log::debug!(
        "correlated {kind} diagram at line {base_line}: {} stamped, {} overlays",
        report.stamped,
        report.overlays
    );
    report
}

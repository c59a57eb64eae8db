use std::collections::HashMap;

use super::DiagramKind;
use super::rules;

/// A directed link between two named things: a flowchart edge, sequence
/// message, class relation, state transition or ER relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrow {
    pub line: usize,
    pub from: String,
    pub to: String,
    /// Arrow or relation syntax as written, e.g. `-->`, `<|--`, `||--o{`.
    pub kind: String,
    pub label: Option<String>,
}

impl Arrow {
    pub fn new(line: usize, from: &str, to: &str, kind: &str) -> Self {
        Self {
            line,
            from: from.to_string(),
            to: to.to_string(),
            kind: kind.to_string(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: Option<&str>) -> Self {
        self.label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        self
    }
}

/// A class member or an ER attribute, owned by a named box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub line: usize,
    pub owner: String,
    pub text: String,
    pub method: bool,
}

/// Something identified only by its position: Gantt tasks, git commits,
/// mindmap nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub line: usize,
    pub label: String,
    pub value: f64,
}

/// Source positions re-derived from diagram text, rebuilt for every diagram.
///
/// Name-keyed maps keep the first occurrence of a name. The vectors keep
/// declaration order and are matched to rendered output by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMaps {
    pub nodes: HashMap<String, usize>,
    pub arrows: HashMap<String, Arrow>,
    pub labels: HashMap<String, usize>,
    pub links: Vec<Arrow>,
    pub members: Vec<Member>,
    pub items: Vec<Item>,
    pub slices: Vec<Slice>,
}

/// One significant line of diagram source.
#[derive(Debug, Clone, Copy)]
pub struct SourceLine<'a> {
    /// Absolute 1-based document line.
    pub number: usize,
    pub text: &'a str,
    /// Leading whitespace width, for indentation-structured diagrams.
    pub indent: usize,
    /// The diagram's declaration line (`flowchart TD`, `pie title ...`).
    pub header: bool,
}

/// Per-diagram scanner state for block syntax such as `class X { ... }`.
#[derive(Debug, Default)]
pub struct ScanState {
    pub open_block: Option<String>,
}

impl SourceMaps {
    /// Scan `source`, whose first line is document line `base_line + 1`.
    pub fn build(kind: DiagramKind, source: &str, base_line: usize) -> Self {
        let mut maps = Self::default();
        let mut state = ScanState::default();
        for (i, (idx, raw)) in significant_lines(source).into_iter().enumerate() {
            let line = SourceLine {
                number: base_line + idx + 1,
                text: raw.trim(),
                indent: raw.len() - raw.trim_start().len(),
                header: i == 0,
            };
            rules::scan(kind, &mut maps, &line, &mut state);
        }
        maps
    }

    pub fn node_line(&self, key: &str) -> Option<usize> {
        self.nodes.get(key).copied()
    }

    pub fn label_line(&self, key: &str) -> Option<usize> {
        self.labels.get(key).copied()
    }

    pub fn arrow(&self, from: &str, to: &str) -> Option<&Arrow> {
        self.arrows.get(&arrow_key(from, to))
    }

    pub fn add_node(&mut self, key: &str, line: usize) {
        let key = key.trim();
        if !key.is_empty() {
            self.nodes.entry(key.to_string()).or_insert(line);
        }
    }

    pub fn add_label(&mut self, key: &str, line: usize) {
        let key = key.trim();
        if !key.is_empty() {
            self.labels.entry(key.to_string()).or_insert(line);
        }
    }

    /// Record a link in declaration order and, if its endpoints are new, by
    /// endpoint key.
    pub fn add_link(&mut self, arrow: Arrow) {
        self.arrows
            .entry(arrow_key(&arrow.from, &arrow.to))
            .or_insert_with(|| arrow.clone());
        self.links.push(arrow);
    }
}

pub fn arrow_key(from: &str, to: &str) -> String {
    format!("{from}-{to}")
}

/// `(index, line)` pairs for lines that carry content: blank lines, `%%`
/// comments and directives, and a leading `---` front-matter block are
/// skipped.
pub fn significant_lines(source: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut in_front_matter = false;
    let mut seen_content = false;

    for (idx, raw) in source.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed == "---" && (in_front_matter || !seen_content) {
            in_front_matter = !in_front_matter;
            seen_content = true;
            continue;
        }
        if in_front_matter || trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }
        seen_content = true;
        out.push((idx, raw));
    }
    out
}

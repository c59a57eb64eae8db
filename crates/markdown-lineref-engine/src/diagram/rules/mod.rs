//! Per-kind source scanning and output stamping rules.
//!
//! Each kind module exposes `scan`, called once per significant source line
//! while building [`SourceMaps`], and `stamp`, called once on the rendered
//! output.

mod class;
mod er;
mod flowchart;
mod gantt;
mod git;
mod mindmap;
mod pie;
mod sequence;
mod state;

use markdown_lineref_markup::Element;
use regex::Regex;

use super::DiagramKind;
use super::source_map::{ScanState, SourceLine, SourceMaps};
use super::stamp::Stamper;

pub fn scan(
    kind: DiagramKind,
    maps: &mut SourceMaps,
    line: &SourceLine<'_>,
    scan_state: &mut ScanState,
) {
    match kind {
        DiagramKind::Flowchart => flowchart::scan(maps, line),
        DiagramKind::Sequence => sequence::scan(maps, line),
        DiagramKind::Class => class::scan(maps, line, scan_state),
        DiagramKind::State => state::scan(maps, line),
        DiagramKind::Er => er::scan(maps, line, scan_state),
        DiagramKind::Gantt => gantt::scan(maps, line),
        DiagramKind::Pie => pie::scan(maps, line),
        DiagramKind::Git => git::scan(maps, line),
        DiagramKind::Mindmap => mindmap::scan(maps, line),
        DiagramKind::Unknown => {}
    }
}

pub fn stamp(kind: DiagramKind, maps: &SourceMaps, stamper: &mut Stamper<'_>) {
    match kind {
        DiagramKind::Flowchart => flowchart::stamp(maps, stamper),
        DiagramKind::Sequence => sequence::stamp(maps, stamper),
        DiagramKind::Class => class::stamp(maps, stamper),
        DiagramKind::State => state::stamp(maps, stamper),
        DiagramKind::Er => er::stamp(maps, stamper),
        DiagramKind::Gantt => gantt::stamp(maps, stamper),
        DiagramKind::Pie => pie::stamp(maps, stamper),
        DiagramKind::Git => git::stamp(maps, stamper),
        DiagramKind::Mindmap => mindmap::stamp(maps, stamper),
        DiagramKind::Unknown => {}
    }
}

/// The source name behind a rendered element: its `data-id`, or the first
/// capture of `id_pattern` against its `id`.
fn rendered_name(element: &Element, id_pattern: &Regex) -> Option<String> {
    if let Some(name) = element.attr("data-id") {
        return Some(name.to_string());
    }
    let id = element.attr("id")?;
    id_pattern
        .captures(id)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

fn has_class_prefix(element: &Element, prefix: &str) -> bool {
    element.classes().any(|c| c.starts_with(prefix))
}

use regex::Regex;
use std::sync::LazyLock;

use super::has_class_prefix;
use crate::diagram::DiagramMark;
use crate::diagram::source_map::{Item, SourceLine, SourceMaps};
use crate::diagram::stamp::{Stamper, has_class, text_of};

static TASK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+?)\s*:\s*(.*)$").expect("Invalid task regex"));

const SETTINGS: &[&str] = &[
    "dateFormat",
    "axisFormat",
    "tickInterval",
    "excludes",
    "includes",
    "todayMarker",
    "weekday",
    "weekend",
    "inclusiveEndDates",
    "topAxis",
    "displayMode",
    "accTitle",
    "accDescr",
    "click",
];

pub fn scan(maps: &mut SourceMaps, line: &SourceLine<'_>) {
    if line.header {
        return;
    }
    let keyword = line.text.split_whitespace().next().unwrap_or("");
    if SETTINGS.contains(&keyword.trim_end_matches(':')) {
        return;
    }
    let n = line.number;

    if let Some(title) = line.text.strip_prefix("title ") {
        maps.add_label(&format!("title:{}", title.trim()), n);
    } else if let Some(section) = line.text.strip_prefix("section ") {
        maps.add_label(&format!("section:{}", section.trim()), n);
    } else if let Some(caps) = TASK.captures(line.text) {
        maps.items.push(Item {
            line: n,
            text: caps[1].to_string(),
        });
    }
}

/// Tasks are matched by position, so two tasks with the same name still
/// resolve to their own lines.
pub fn stamp(maps: &SourceMaps, stamper: &mut Stamper<'_>) {
    let bars = stamper.select(|e| e.is("rect") && has_class(e, "task"));
    for (bar, task) in bars.into_iter().zip(&maps.items) {
        stamper.stamp(bar, task.line, DiagramMark::Task, &task.text);
    }

    let labels = stamper.select(|e| e.is("text") && has_class_prefix(e, "taskText"));
    for (label, task) in labels.into_iter().zip(&maps.items) {
        stamper.stamp(label, task.line, DiagramMark::Task, &task.text);
    }

    for section in stamper.select(|e| e.is("text") && has_class_prefix(e, "sectionTitle")) {
        let text = text_of(stamper.doc(), section);
        if let Some(line) = maps.label_line(&format!("section:{text}")) {
            stamper.stamp(section, line, DiagramMark::Section, &text);
        }
    }

    for title in stamper.select(|e| e.is("text") && has_class(e, "titleText")) {
        let text = text_of(stamper.doc(), title);
        if let Some(line) = maps.label_line(&format!("title:{text}")) {
            stamper.stamp(title, line, DiagramMark::Title, &text);
        }
    }
}

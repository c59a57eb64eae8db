use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

use crate::diagram::DiagramMark;
use crate::diagram::source_map::{Slice, SourceLine, SourceMaps};
use crate::diagram::stamp::{Stamper, has_class, text_of};

static SLICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^"([^"]+)"\s*:\s*([0-9]*\.?[0-9]+)"#).expect("Invalid slice regex")
});

/// The ` [386]` value suffix legends get with `showData`.
static LEGEND_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[[^\]]*\]$").expect("Invalid legend value regex"));

pub fn scan(maps: &mut SourceMaps, line: &SourceLine<'_>) {
    let title = if line.header {
        line.text.split_once("title ").map(|(_, title)| title)
    } else {
        line.text.strip_prefix("title ")
    };
    if let Some(title) = title {
        maps.add_label(&format!("title:{}", title.trim()), line.number);
        return;
    }

    if let Some(caps) = SLICE.captures(line.text) {
        let Ok(value) = caps[2].parse::<f64>() else {
            return;
        };
        maps.slices.push(Slice {
            line: line.number,
            label: caps[1].to_string(),
            value,
        });
        maps.add_label(&format!("pie:{}", &caps[1]), line.number);
    }
}

/// Slices are drawn largest first; the sort is stable so equal values keep
/// declaration order.
fn drawing_order(slices: &[Slice]) -> Vec<&Slice> {
    let mut order: Vec<&Slice> = slices.iter().collect();
    order.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    order
}

pub fn stamp(maps: &SourceMaps, stamper: &mut Stamper<'_>) {
    let order = drawing_order(&maps.slices);

    let wedges = stamper.select(|e| e.is("path") && has_class(e, "pieCircle"));
    for (wedge, slice) in wedges.into_iter().zip(&order) {
        stamper.stamp(wedge, slice.line, DiagramMark::Slice, &slice.label);
    }
    let percentages = stamper.select(|e| e.is("text") && has_class(e, "slice"));
    for (text, slice) in percentages.into_iter().zip(&order) {
        stamper.stamp(text, slice.line, DiagramMark::Slice, &slice.label);
    }

    for legend in stamper.select(|e| e.is("g") && has_class(e, "legend")) {
        let text = text_of(stamper.doc(), legend);
        let label = LEGEND_VALUE.replace(&text, "");
        if let Some(line) = maps.label_line(&format!("pie:{label}")) {
            stamper.stamp(legend, line, DiagramMark::Legend, &label);
        }
    }

    for title in stamper.select(|e| e.is("text") && has_class(e, "pieTitleText")) {
        let text = text_of(stamper.doc(), title);
        if let Some(line) = maps.label_line(&format!("title:{text}")) {
            stamper.stamp(title, line, DiagramMark::Title, &text);
        }
    }
}

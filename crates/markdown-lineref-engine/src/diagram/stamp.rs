use markdown_lineref_markup::{Document, Element, NodeId, bounding_box};
use std::ops::RangeInclusive;

use super::DiagramMark;
use super::source_map::Arrow;
pub use crate::pointing::text::text_of;

pub const SOURCE_LINE_ATTR: &str = "data-source-line";
pub const FROM_ATTR: &str = "data-mermaid-from";
pub const TO_ATTR: &str = "data-mermaid-to";

/// Anything thinner than this gets a transparent overlay to click on.
const MIN_HIT_SIZE: f64 = 8.0;

pub fn has_class(element: &Element, class: &str) -> bool {
    element.classes().any(|c| c == class)
}

/// Writes source-line markers into one rendered diagram.
pub struct Stamper<'d> {
    doc: &'d mut Document,
    root: NodeId,
    span: RangeInclusive<usize>,
    stamped: usize,
    overlays: usize,
}

impl<'d> Stamper<'d> {
    pub fn new(doc: &'d mut Document, root: NodeId, span: RangeInclusive<usize>) -> Self {
        Self {
            doc,
            root,
            span,
            stamped: 0,
            overlays: 0,
        }
    }

    pub fn doc(&self) -> &Document {
        self.doc
    }

    /// Elements under the diagram root matching `pred`, in document order.
    pub fn select(&self, pred: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.doc.find_all(self.root, pred)
    }

    pub fn stamped(&self) -> usize {
        self.stamped
    }

    pub fn overlays(&self) -> usize {
        self.overlays
    }

    /// Mark `node` as coming from `line`. Lines outside the diagram's own
    /// source span are refused.
    pub fn stamp(&mut self, node: NodeId, line: usize, mark: DiagramMark, value: &str) -> bool {
        if !self.span.contains(&line) {
            log::debug!("refusing line {line} outside diagram span {:?}", self.span);
            return false;
        }
        self.doc.set_attr(node, SOURCE_LINE_ATTR, line.to_string());
        self.doc.set_attr(node, mark.attribute(), value);
        self.stamped += 1;
        true
    }

    /// Mark a connector with its endpoints, adding a hit-area overlay when
    /// the drawn shape is too thin to click.
    pub fn stamp_link(&mut self, node: NodeId, mark: DiagramMark, arrow: &Arrow) -> bool {
        if !self.stamp(node, arrow.line, mark, &arrow.kind) {
            return false;
        }
        self.doc.set_attr(node, FROM_ATTR, arrow.from.as_str());
        self.doc.set_attr(node, TO_ATTR, arrow.to.as_str());
        self.add_hit_area(node);
        true
    }

    fn add_hit_area(&mut self, node: NodeId) {
        let Some(bbox) = bounding_box(self.doc, node) else {
            return;
        };
        if bbox.width >= MIN_HIT_SIZE && bbox.height >= MIN_HIT_SIZE {
            return;
        }
        let area = bbox.inflate_to(MIN_HIT_SIZE);
        let (x, y, w, h) = (
            area.x.to_string(),
            area.y.to_string(),
            area.width.to_string(),
            area.height.to_string(),
        );
        let overlay = self.doc.create_element(
            "rect",
            &[
                ("class", "hit-area"),
                ("x", x.as_str()),
                ("y", y.as_str()),
                ("width", w.as_str()),
                ("height", h.as_str()),
            ],
        );

        // The overlay answers clicks exactly like the element it covers.
        let copied: Vec<(String, String)> = self
            .doc
            .element(node)
            .map(|e| {
                e.attrs
                    .iter()
                    .filter(|a| {
                        a.name.starts_with("data-source-") || a.name.starts_with("data-mermaid-")
                    })
                    .map(|a| (a.name.clone(), a.value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        for (name, value) in copied {
            self.doc.set_attr(overlay, &name, value);
        }

        self.doc.insert_after(node, overlay);
        self.overlays += 1;
    }
}

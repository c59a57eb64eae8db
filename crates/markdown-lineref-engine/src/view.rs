//! Per-document view state and the event loop between page and host.
//!
//! The page scripts stay thin: they post [`ViewEvent`]s naming elements by
//! their index path from `<body>`, and run the [`ViewCommand`]s sent back.
//! Everything else (resolving, describing, correlating diagrams, collecting
//! render failures) happens here against a [`Document`] snapshot that mirrors
//! the page.
//!
//! ```text
//! page ── "pointer-down:0,2" ──► DocumentView::dispatch ──► Effect::Host(point:3|See text.)
//!      ◄── lineref.highlight([0,2]) ── Effect::Script
//! ```
//!
//! Each open document owns one [`DocumentView`]; nothing is shared between
//! views.

use markdown_lineref_markup::{Document, NodeId, parse, parse_fragment_into};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::assemble::AssembledDocument;
use crate::diagram::correlate;
use crate::messages::{Engine, HostMessage, MessageError, RenderError, Zoom};
use crate::pointing::{self, RENDER_ERROR_ATTR, RENDER_ERROR_LINE_ATTR, line_of};
use crate::render::LINE_ATTR;

/// Class the page adds to elements that failed to render.
pub const RENDER_ERROR_CLASS: &str = "render-error";

/// "Parse error on line 3:" as reported by the diagram library.
static DIAGRAM_ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bon line (\d+)").expect("Invalid diagram error line regex")
});

/// An event posted by the page scripts.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    LinkOver(String),
    LinkLeave,
    LinkClick(String),
    Wheel { ctrl: bool, delta_y: f64 },
    TogglePointing,
    PointerOver(Vec<usize>),
    PointerLeave,
    PointerDown(Vec<usize>),
    FormulaFailed { path: Vec<usize>, message: String },
    /// Library output for the `index`th diagram container.
    DiagramRendered { index: usize, markup: String },
    DiagramFailed { index: usize, message: String },
    /// Every formula and diagram has been attempted.
    Rendered,
}

fn parse_path(payload: &str) -> Result<Vec<usize>, MessageError> {
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }
    payload
        .split(',')
        .map(|i| i.trim().parse())
        .collect::<Result<_, _>>()
        .map_err(|_| MessageError::InvalidPath(payload.to_string()))
}

fn parse_indexed(payload: &str) -> Result<(usize, String), MessageError> {
    let (index, rest) = payload
        .split_once('|')
        .ok_or_else(|| MessageError::InvalidDiagram(payload.to_string()))?;
    let index = index
        .parse()
        .map_err(|_| MessageError::InvalidDiagram(payload.to_string()))?;
    Ok((index, rest.to_string()))
}

impl FromStr for ViewEvent {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, payload) = s
            .split_once(':')
            .ok_or_else(|| MessageError::Malformed(s.to_string()))?;

        match tag {
            "link-over" => Ok(ViewEvent::LinkOver(payload.to_string())),
            "link-leave" => Ok(ViewEvent::LinkLeave),
            "link-click" => Ok(ViewEvent::LinkClick(payload.to_string())),
            "wheel" => {
                let (modifier, delta) = payload
                    .split_once('|')
                    .ok_or_else(|| MessageError::InvalidWheel(payload.to_string()))?;
                let delta_y = delta
                    .trim()
                    .parse()
                    .map_err(|_| MessageError::InvalidWheel(payload.to_string()))?;
                Ok(ViewEvent::Wheel {
                    ctrl: modifier == "ctrl",
                    delta_y,
                })
            }
            "toggle-pointing" => Ok(ViewEvent::TogglePointing),
            "pointer-over" => Ok(ViewEvent::PointerOver(parse_path(payload)?)),
            "pointer-leave" => Ok(ViewEvent::PointerLeave),
            "pointer-down" => Ok(ViewEvent::PointerDown(parse_path(payload)?)),
            "formula-failed" => {
                let (path, message) = payload.split_once('|').unwrap_or((payload, ""));
                Ok(ViewEvent::FormulaFailed {
                    path: parse_path(path)?,
                    message: message.to_string(),
                })
            }
            "diagram-rendered" => {
                let (index, markup) = parse_indexed(payload)?;
                Ok(ViewEvent::DiagramRendered { index, markup })
            }
            "diagram-failed" => {
                let (index, message) = parse_indexed(payload)?;
                Ok(ViewEvent::DiagramFailed { index, message })
            }
            "rendered" => Ok(ViewEvent::Rendered),
            other => Err(MessageError::UnknownTag(other.to_string())),
        }
    }
}

/// A call into `window.lineref` on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    SetPointing(bool),
    Highlight(Vec<usize>),
    ClearHighlight,
    ReplaceDiagram { index: usize, markup: String },
    ScrollTo(Vec<usize>),
}

impl ViewCommand {
    /// Script for the host to evaluate in the page.
    pub fn to_script(&self) -> String {
        match self {
            ViewCommand::SetPointing(on) => format!("window.lineref.setPointing({on});"),
            ViewCommand::Highlight(path) => {
                format!("window.lineref.highlight({});", serde_json::json!(path))
            }
            ViewCommand::ClearHighlight => "window.lineref.clearHighlight();".to_string(),
            ViewCommand::ReplaceDiagram { index, markup } => format!(
                "window.lineref.replaceDiagram({index}, {});",
                serde_json::Value::String(markup.clone())
            ),
            ViewCommand::ScrollTo(path) => {
                format!("window.lineref.scrollToPath({});", serde_json::json!(path))
            }
        }
    }
}

impl fmt::Display for ViewCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_script())
    }
}

/// Outcome of one [`ViewEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Host(HostMessage),
    Script(ViewCommand),
}

/// One open document: its DOM snapshot, pointing mode, the current hover
/// highlight and the render failures collected so far.
#[derive(Debug, Clone)]
pub struct DocumentView {
    doc: Document,
    pointing: bool,
    highlight: Option<NodeId>,
    errors: Vec<RenderError>,
}

impl DocumentView {
    pub fn new(html: &str, pointing: bool) -> Self {
        Self {
            doc: parse(html),
            pointing,
            highlight: None,
            errors: Vec::new(),
        }
    }

    /// Snapshot an assembled page, starting in the pointing mode it was
    /// assembled with.
    pub fn from_assembled(page: &AssembledDocument) -> Self {
        let mut view = Self::new(&page.html, false);
        view.pointing = view
            .doc
            .body()
            .and_then(|body| view.doc.attr(body, "data-pointing"))
            == Some("true");
        view
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn is_pointing(&self) -> bool {
        self.pointing
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlight
    }

    pub fn errors(&self) -> &[RenderError] {
        &self.errors
    }

    pub fn set_pointing(&mut self, on: bool) -> ViewCommand {
        self.pointing = on;
        if !on {
            self.highlight = None;
        }
        log::debug!("pointing mode {}", if on { "on" } else { "off" });
        ViewCommand::SetPointing(on)
    }

    pub fn toggle_pointing(&mut self) -> ViewCommand {
        self.set_pointing(!self.pointing)
    }

    /// Move the hover highlight to whatever `path` resolves to. Returns a
    /// command only when the highlight changes.
    pub fn pointer_over(&mut self, path: &[usize]) -> Option<ViewCommand> {
        if !self.pointing {
            return None;
        }
        let target = self.node_at_path(path);
        match pointing::resolve(&self.doc, target) {
            Some(pointable) if self.highlight == Some(pointable.node) => None,
            Some(pointable) => {
                self.highlight = Some(pointable.node);
                self.path_of(pointable.node).map(ViewCommand::Highlight)
            }
            None => self.pointer_leave(),
        }
    }

    pub fn pointer_leave(&mut self) -> Option<ViewCommand> {
        self.highlight.take().map(|_| ViewCommand::ClearHighlight)
    }

    /// Resolve and describe the element under the pointer. `None` outside
    /// pointing mode or on the page background.
    pub fn pointer_down(&self, path: &[usize]) -> Option<HostMessage> {
        if !self.pointing {
            return None;
        }
        let target = self.node_at_path(path);
        let pointable = pointing::resolve(&self.doc, target)?;
        let description = pointing::describe(&self.doc, &pointable);
        log::debug!(
            "pointed at {:?} on line {:?}: {description}",
            pointable.kind,
            pointable.line
        );
        Some(HostMessage::Point {
            line: pointable.line,
            description,
        })
    }

    pub fn link_over(&self, href: &str) -> HostMessage {
        HostMessage::Hover(href.to_string())
    }

    pub fn link_leave(&self) -> HostMessage {
        HostMessage::Leave
    }

    /// Links do not navigate while pointing.
    pub fn link_click(&self, href: &str) -> Option<HostMessage> {
        (!self.pointing).then(|| HostMessage::Click(href.to_string()))
    }

    pub fn wheel(&self, ctrl: bool, delta_y: f64) -> Option<HostMessage> {
        if !ctrl || delta_y == 0.0 {
            return None;
        }
        Some(HostMessage::Zoom(if delta_y < 0.0 { Zoom::In } else { Zoom::Out }))
    }

    fn diagram_container(&self, index: usize) -> Option<NodeId> {
        self.doc
            .find_all(self.doc.root(), |e| {
                e.is("pre") && e.classes().any(|c| c == "diagram")
            })
            .get(index)
            .copied()
    }

    /// Put rendered diagram markup into the `index`th container, stamp it
    /// with source lines, and hand the stamped markup back to the page.
    pub fn attach_diagram(&mut self, index: usize, markup: &str) -> Option<ViewCommand> {
        let Some(container) = self.diagram_container(index) else {
            log::warn!("no diagram container #{index} to attach output to");
            return None;
        };
        let source = self
            .doc
            .attr(container, "data-source")
            .unwrap_or("")
            .to_string();
        let base_line = line_of(&self.doc, container).unwrap_or(0);

        self.doc.clear_children(container);
        parse_fragment_into(&mut self.doc, container, markup);
        self.doc.set_attr(container, "data-rendered", "true");
        correlate(&source, base_line, &mut self.doc, container);

        Some(ViewCommand::ReplaceDiagram {
            index,
            markup: self.doc.inner_html(container),
        })
    }

    /// Current (stamped) content of the `index`th diagram container.
    pub fn diagram_markup(&self, index: usize) -> Option<String> {
        self.diagram_container(index)
            .map(|container| self.doc.inner_html(container))
    }

    fn mark_failed(&mut self, holder: NodeId, line: Option<usize>, message: &str) {
        self.doc.set_attr(holder, RENDER_ERROR_ATTR, message);
        if let Some(line) = line {
            self.doc
                .set_attr(holder, RENDER_ERROR_LINE_ATTR, line.to_string());
        }
        self.doc.add_class(holder, RENDER_ERROR_CLASS);
    }

    /// Record a formula that failed to render. The formula keeps the message
    /// so pointing at it reports the failure.
    pub fn fail_formula(&mut self, path: &[usize], message: &str) {
        let target = self.node_at_path(path);
        let holder = self
            .doc
            .closest(target, |e| e.classes().any(|c| c == "math"));
        let line = holder.and_then(|h| line_of(&self.doc, h));
        if let Some(holder) = holder {
            self.mark_failed(holder, line, message);
        }
        log::debug!("formula failed on line {line:?}: {message}");
        self.errors.push(RenderError {
            engine: Engine::KaTeX,
            line,
            message: message.to_string(),
        });
    }

    /// Record a diagram that failed to render. A line number in the message
    /// is relative to the diagram source and is moved onto the document.
    pub fn fail_diagram(&mut self, index: usize, message: &str) {
        let container = self.diagram_container(index);
        let base_line = container.and_then(|c| line_of(&self.doc, c));
        let relative = DIAGRAM_ERROR_LINE
            .captures(message)
            .and_then(|caps| caps[1].parse::<usize>().ok());
        let line = match (base_line, relative) {
            (Some(base), Some(offset)) => Some(base + offset),
            (base, _) => base,
        };
        if let Some(container) = container {
            self.mark_failed(container, line, message);
        }
        log::debug!("diagram #{index} failed on line {line:?}: {message}");
        self.errors.push(RenderError {
            engine: Engine::Mermaid,
            line,
            message: message.to_string(),
        });
    }

    pub fn render_complete(&self) -> HostMessage {
        HostMessage::render_complete(&self.errors)
    }

    /// Path of the element with the greatest `data-line` not after `line`;
    /// the first such element in document order on ties.
    pub fn scroll_target(&self, line: usize) -> Option<Vec<usize>> {
        let mut best: Option<(usize, NodeId)> = None;
        for node in self.doc.descendant_elements(self.doc.root()) {
            let Some(own) = self
                .doc
                .attr(node, LINE_ATTR)
                .and_then(|l| l.trim().parse::<usize>().ok())
            else {
                continue;
            };
            if own <= line && best.is_none_or(|(b, _)| own > b) {
                best = Some((own, node));
            }
        }
        best.and_then(|(_, node)| self.path_of(node))
    }

    pub fn scroll_to(&self, line: usize) -> Option<ViewCommand> {
        self.scroll_target(line).map(ViewCommand::ScrollTo)
    }

    fn body(&self) -> NodeId {
        self.doc.body().unwrap_or_else(|| self.doc.root())
    }

    /// Follow an index path down from `<body>`, stopping at the last index
    /// that exists.
    pub fn node_at_path(&self, path: &[usize]) -> NodeId {
        let mut node = self.body();
        for index in path {
            match self.doc.element_children(node).nth(*index) {
                Some(child) => node = child,
                None => break,
            }
        }
        node
    }

    pub fn path_of(&self, node: NodeId) -> Option<Vec<usize>> {
        self.doc.element_path(self.body(), node)
    }

    /// Apply one event, returning what the host should do.
    pub fn apply(&mut self, event: ViewEvent) -> Vec<Effect> {
        let host =
            |m: Option<HostMessage>| -> Vec<Effect> { m.map(Effect::Host).into_iter().collect() };
        let script =
            |c: Option<ViewCommand>| -> Vec<Effect> { c.map(Effect::Script).into_iter().collect() };

        match event {
            ViewEvent::LinkOver(href) => vec![Effect::Host(self.link_over(&href))],
            ViewEvent::LinkLeave => vec![Effect::Host(self.link_leave())],
            ViewEvent::LinkClick(href) => host(self.link_click(&href)),
            ViewEvent::Wheel { ctrl, delta_y } => host(self.wheel(ctrl, delta_y)),
            ViewEvent::TogglePointing => vec![Effect::Script(self.toggle_pointing())],
            ViewEvent::PointerOver(path) => script(self.pointer_over(&path)),
            ViewEvent::PointerLeave => script(self.pointer_leave()),
            ViewEvent::PointerDown(path) => host(self.pointer_down(&path)),
            ViewEvent::FormulaFailed { path, message } => {
                self.fail_formula(&path, &message);
                Vec::new()
            }
            ViewEvent::DiagramRendered { index, markup } => {
                script(self.attach_diagram(index, &markup))
            }
            ViewEvent::DiagramFailed { index, message } => {
                self.fail_diagram(index, &message);
                Vec::new()
            }
            ViewEvent::Rendered => vec![Effect::Host(self.render_complete())],
        }
    }

    /// Decode and apply one raw page message.
    pub fn dispatch(&mut self, raw: &str) -> Result<Vec<Effect>, MessageError> {
        let event: ViewEvent = raw.parse()?;
        Ok(self.apply(event))
    }
}

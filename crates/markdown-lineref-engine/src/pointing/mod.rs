//! Pointing: from a click target to a source line and a short description.
//!
//! [`resolve`] climbs from whatever was clicked to the nearest element worth
//! referencing; [`describe`] summarises it in a line short enough to paste
//! into a prompt. Both are pure functions of the DOM snapshot.

mod describe;
mod resolve;
pub mod text;

pub use describe::describe;
pub use resolve::{line_of, resolve};

use markdown_lineref_markup::NodeId;

use crate::diagram::DiagramMark;

/// Holds the failure message of a formula or diagram that did not render.
pub const RENDER_ERROR_ATTR: &str = "data-render-error";
/// Source line of a render failure, when the engine reported one.
pub const RENDER_ERROR_LINE_ATTR: &str = "data-render-error-line";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointableKind {
    RenderError,
    /// 1-based row among all rows of the table, 1-based column.
    TableCell { row: usize, col: usize },
    TableRow { row: usize },
    Table,
    CodeLine,
    CodeBlock,
    DiagramNode(DiagramMark),
    DiagramContainer,
    Formula,
    Heading { level: usize },
    List { ordered: bool },
    ListItem,
    BlockQuote,
    ThematicBreak,
    Other,
}

/// An element resolved from a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointable {
    pub node: NodeId,
    /// 1-based source line; `None` when nothing in the ancestry carries one.
    pub line: Option<usize>,
    pub kind: PointableKind,
}

//! Line-tracked markdown rendering and pointing.
//!
//! [`Assembler`] turns markdown into a self-contained page whose blocks carry
//! `data-line`. A [`DocumentView`] mirrors that page as a DOM snapshot and
//! answers the page's events: diagrams are correlated back to their source
//! lines as they arrive, clicks in pointing mode resolve to a line plus a
//! short description, and render failures are collected for the host.

pub mod assemble;
pub mod diagram;
pub mod io;
pub mod messages;
pub mod parsing;
pub mod pointing;
pub mod render;
pub mod view;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use assemble::{AssembleError, AssembledDocument, Assembler};
pub use diagram::{CorrelationReport, DiagramKind, DiagramMark, correlate};
pub use io::*;
pub use messages::*;
pub use pointing::{Pointable, PointableKind, describe, resolve};
pub use render::{RenderOptions, RendererRegistry, render_markdown};
pub use view::{DocumentView, Effect, ViewCommand, ViewEvent};

//! # markdown-lineref-markup
//!
//! A DOM snapshot for rendered documents: a [Logos] tokenizer for HTML and
//! SVG markup feeding a permissive tree builder, producing a mutable
//! arena-backed [`Document`].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## What is a Snapshot?
//!
//! Diagram correlation, click resolution and content description all run as
//! functions of a DOM and a target node, outside the browser. The snapshot is
//! that DOM: one [`Document`] per open view, nothing global.
//!
//! ## Pipeline
//!
//! ```text
//! Markup → Lexer → Tokens → TreeBuilder → Document ⇄ serialize
//!          (Logos)
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use markdown_lineref_markup::parse;
//!
//! let doc = parse(r#"<p data-line="3">See <a href="http://example.com">text</a>.</p>"#);
//! let p = doc.find(doc.root(), |e| e.is("p")).unwrap();
//!
//! assert_eq!(doc.attr(p, "data-line"), Some("3"));
//! assert_eq!(doc.text_content(p), "See text.");
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! markdown-lineref-markup/
//! ├── lib.rs        # This file - public API
//! ├── lexer.rs      # Logos-based lossless tokenizer
//! ├── parser.rs     # Permissive tree builder
//! ├── dom.rs        # Arena Document, NodeId, Element
//! ├── serialize.rs  # outer_html / inner_html
//! └── geometry.rs   # Estimated SVG bounding boxes
//! ```

pub mod dom;
pub mod geometry;
pub mod lexer;
pub mod parser;
mod serialize;

pub use dom::{Attribute, Document, Element, NodeData, NodeId};
pub use geometry::{BoundingBox, bounding_box};
pub use parser::{parse, parse_fragment_into};

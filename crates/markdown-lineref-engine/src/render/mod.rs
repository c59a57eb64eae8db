//! Line-tracking HTML renderer.
//!
//! Every block is emitted by a [`BlockRenderer`] looked up by its
//! [`BlockTag`] in a [`RendererRegistry`]. The renderers installed by
//! [`RendererRegistry::line_tracking`] tag each element with
//! `data-line="<0-based line + 1>"`; extension renderers follow the same
//! convention.
//!
//! ## Output Shape
//!
//! ```text
//! # Hi            →  <h1 data-line="1">Hi</h1>
//!
//! ```rust         →  <pre data-line="3"><code class="language-rust">
//! let x = 1;      →  <span class="code-line" data-line="4">let x = 1;</span>
//! ```             →  </code></pre>
//! ```
//!
//! Inline content is passed through pulldown-cmark's own HTML writer after
//! math and footnote events have been swapped for pre-rendered markup.

pub mod blocks;
pub mod extensions;
pub mod inline;
pub mod registry;

pub use registry::{BlockRenderer, RendererRegistry};

use markdown_lineref_config::RenderSection;
use pulldown_cmark::Event;

use crate::parsing::{BlockNode, Child, FootnoteNumbers, ParseOptions, ParsedDoc, parse_document};

/// 1-based source line of a rendered block.
pub const LINE_ATTR: &str = "data-line";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub parse: ParseOptions,
    /// Fence info string that marks a code block as a diagram.
    pub diagram_language: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            diagram_language: "mermaid".to_string(),
        }
    }
}

impl From<&RenderSection> for RenderOptions {
    fn from(section: &RenderSection) -> Self {
        Self {
            parse: ParseOptions::from(section),
            diagram_language: section.diagram_language.clone(),
        }
    }
}

impl RenderOptions {
    pub fn is_diagram_language(&self, language: Option<&str>) -> bool {
        language.is_some_and(|l| l.eq_ignore_ascii_case(&self.diagram_language))
    }
}

/// Output buffer plus what renderers need to recurse.
pub struct RenderContext<'r> {
    registry: &'r RendererRegistry,
    pub options: &'r RenderOptions,
    pub footnotes: &'r FootnoteNumbers,
    out: String,
}

impl<'r> RenderContext<'r> {
    pub fn new(
        registry: &'r RendererRegistry,
        options: &'r RenderOptions,
        footnotes: &'r FootnoteNumbers,
    ) -> Self {
        Self {
            registry,
            options,
            footnotes,
            out: String::new(),
        }
    }

    pub fn write(&mut self, s: &str) {
        self.out.push_str(s);
    }

    pub fn write_escaped(&mut self, text: &str) {
        self.out.push_str(&html_escape::encode_text(text));
    }

    /// ` name="value"` with the value escaped.
    pub fn write_attr(&mut self, name: &str, value: &str) {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out
            .push_str(&html_escape::encode_double_quoted_attribute(value));
        self.out.push('"');
    }

    pub fn write_line_attr(&mut self, node: &BlockNode<'_>) {
        self.write_attr(LINE_ATTR, &node.data_line().to_string());
    }

    /// Dispatch to the registered renderer, or render the children in place
    /// when none is registered for this kind.
    pub fn render_block(&mut self, node: &BlockNode<'_>) {
        let registry = self.registry;
        match registry.get(node.kind.tag()) {
            Some(renderer) => renderer.render(node, self),
            None => self.render_children(node),
        }
    }

    pub fn render_children(&mut self, node: &BlockNode<'_>) {
        for child in &node.children {
            match child {
                Child::Block(block) => self.render_block(block),
                Child::Inline(events) => self.render_inline(events),
            }
        }
    }

    pub fn render_inline(&mut self, events: &[Event<'_>]) {
        inline::push_inline(&mut self.out, events, self.footnotes);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

pub fn render_html(
    doc: &ParsedDoc<'_>,
    registry: &RendererRegistry,
    options: &RenderOptions,
) -> String {
    let mut cx = RenderContext::new(registry, options, &doc.footnotes);
    for block in &doc.blocks {
        cx.render_block(block);
    }
    cx.finish()
}

/// Parse and render with the core renderers plus the enabled extensions.
pub fn render_markdown(markdown: &str, options: &RenderOptions) -> String {
    let doc = parse_document(markdown, &options.parse);
    let registry = RendererRegistry::for_options(options);
    render_html(&doc, &registry, options)
}

//! Markdown to a line-annotated block tree.
//!
//! pulldown-cmark does the parsing; its offset iterator gives every event a
//! byte range, which [`LineIndex`] turns into a 0-based line. The resulting
//! [`ParsedDoc`] keeps inline content as raw events so the renderer can hand
//! it straight back to pulldown-cmark's HTML writer.

pub mod builder;
pub mod lines;
pub mod types;

pub use builder::BlockBuilder;
pub use lines::LineIndex;
pub use types::{BlockKind, BlockNode, BlockTag, Child, FootnoteNumbers, ParsedDoc};

use markdown_lineref_config::RenderSection;
use pulldown_cmark::{Options, Parser};

/// Markdown extensions to enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub heading_attributes: bool,
    pub math: bool,
    pub alerts: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            tasklists: true,
            heading_attributes: true,
            math: true,
            alerts: true,
        }
    }
}

impl From<&RenderSection> for ParseOptions {
    fn from(section: &RenderSection) -> Self {
        Self {
            tables: section.tables,
            footnotes: section.footnotes,
            strikethrough: section.strikethrough,
            tasklists: section.tasklists,
            heading_attributes: section.heading_attributes,
            math: section.math,
            alerts: section.alerts,
        }
    }
}

impl ParseOptions {
    pub fn pulldown_options(&self) -> Options {
        let mut options = Options::empty();
        for (enabled, flag) in [
            (self.tables, Options::ENABLE_TABLES),
            (self.footnotes, Options::ENABLE_FOOTNOTES),
            (self.strikethrough, Options::ENABLE_STRIKETHROUGH),
            (self.tasklists, Options::ENABLE_TASKLISTS),
            (self.heading_attributes, Options::ENABLE_HEADING_ATTRIBUTES),
            (self.math, Options::ENABLE_MATH),
            (self.alerts, Options::ENABLE_GFM),
        ] {
            if enabled {
                options.insert(flag);
            }
        }
        options
    }
}

/// Parse `markdown` into blocks. Never fails; malformed input degrades to
/// paragraphs.
pub fn parse_document<'a>(markdown: &'a str, options: &ParseOptions) -> ParsedDoc<'a> {
    let lines = LineIndex::new(markdown);
    let mut builder = BlockBuilder::new(&lines);
    for (event, range) in Parser::new_ext(markdown, options.pulldown_options()).into_offset_iter() {
        builder.push(event, range);
    }
    builder.finish()
}

use std::fmt;
use std::sync::Arc;

use super::{RenderContext, RenderOptions, blocks, extensions};
use crate::parsing::{BlockNode, BlockTag};

/// Emits the HTML for one kind of block.
pub trait BlockRenderer: Send + Sync {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>);
}

/// Ordered `(tag, renderer)` pairs. Lookup takes the first entry for a tag,
/// and [`insert`](Self::insert) puts new entries first after dropping any
/// existing entry for the same tag, so later phases override earlier ones
/// tag by tag without disturbing the rest.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    entries: Vec<(BlockTag, Arc<dyn BlockRenderer>)>,
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The core set: every block kind CommonMark itself produces.
    pub fn line_tracking() -> Self {
        let mut registry = Self::new();
        registry.insert(BlockTag::Paragraph, blocks::ParagraphRenderer);
        registry.insert(BlockTag::Heading, blocks::HeadingRenderer);
        registry.insert(BlockTag::CodeBlock, blocks::CodeBlockRenderer);
        registry.insert(BlockTag::List, blocks::ListRenderer);
        registry.insert(BlockTag::ListItem, blocks::ListItemRenderer);
        registry.insert(BlockTag::BlockQuote, blocks::BlockQuoteRenderer);
        registry.insert(BlockTag::ThematicBreak, blocks::ThematicBreakRenderer);
        registry.insert(BlockTag::HtmlBlock, blocks::HtmlBlockRenderer);
        registry
    }

    /// Second phase: renderers for the enabled markdown extensions.
    pub fn install_extensions(&mut self, options: &RenderOptions) {
        let parse = &options.parse;
        if parse.tables {
            self.insert(BlockTag::Table, extensions::TableRenderer);
            self.insert(BlockTag::TableRow, extensions::TableRowRenderer);
            self.insert(BlockTag::TableCell, extensions::TableCellRenderer);
        }
        if parse.math {
            self.insert(BlockTag::MathBlock, extensions::MathBlockRenderer);
        }
        if parse.alerts {
            self.insert(BlockTag::Alert, extensions::AlertRenderer);
        }
        if parse.footnotes {
            self.insert(
                BlockTag::FootnoteDefinition,
                extensions::FootnoteDefinitionRenderer,
            );
        }
    }

    /// Core plus every extension enabled in `options`.
    pub fn for_options(options: &RenderOptions) -> Self {
        let mut registry = Self::line_tracking();
        registry.install_extensions(options);
        registry
    }

    pub fn insert(&mut self, tag: BlockTag, renderer: impl BlockRenderer + 'static) {
        self.insert_arc(tag, Arc::new(renderer));
    }

    pub fn insert_arc(&mut self, tag: BlockTag, renderer: Arc<dyn BlockRenderer>) {
        self.entries.retain(|(t, _)| *t != tag);
        self.entries.insert(0, (tag, renderer));
    }

    pub fn remove(&mut self, tag: BlockTag) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(t, _)| *t != tag);
        self.entries.len() != before
    }

    pub fn get(&self, tag: BlockTag) -> Option<&dyn BlockRenderer> {
        self.entries
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, r)| r.as_ref())
    }

    /// Tags in priority order, highest first.
    pub fn tags(&self) -> Vec<BlockTag> {
        self.entries.iter().map(|(t, _)| *t).collect()
    }
}

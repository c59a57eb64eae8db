use pulldown_cmark::{Alignment, BlockQuoteKind, CowStr, Event, HeadingLevel};
use std::collections::HashMap;
use std::ops::Range;

/// Discriminant of [`BlockKind`], used as the key for renderer lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockTag {
    Paragraph,
    Heading,
    CodeBlock,
    List,
    ListItem,
    BlockQuote,
    ThematicBreak,
    HtmlBlock,
    Table,
    TableRow,
    TableCell,
    MathBlock,
    Alert,
    FootnoteDefinition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind<'a> {
    Paragraph,
    Heading {
        level: HeadingLevel,
        id: Option<CowStr<'a>>,
        classes: Vec<CowStr<'a>>,
        attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    },
    CodeBlock {
        /// First word of the fence info string; `None` for indented blocks
        /// and bare fences.
        language: Option<String>,
        fenced: bool,
        text: String,
    },
    List {
        /// Start number for ordered lists.
        start: Option<u64>,
    },
    ListItem,
    BlockQuote,
    Alert(BlockQuoteKind),
    ThematicBreak,
    HtmlBlock {
        raw: String,
    },
    Table {
        alignments: Vec<Alignment>,
    },
    TableRow {
        header: bool,
    },
    TableCell {
        header: bool,
        alignment: Alignment,
    },
    MathBlock {
        tex: String,
    },
    FootnoteDefinition {
        label: CowStr<'a>,
        number: usize,
    },
}

impl BlockKind<'_> {
    pub fn tag(&self) -> BlockTag {
        match self {
            BlockKind::Paragraph => BlockTag::Paragraph,
            BlockKind::Heading { .. } => BlockTag::Heading,
            BlockKind::CodeBlock { .. } => BlockTag::CodeBlock,
            BlockKind::List { .. } => BlockTag::List,
            BlockKind::ListItem => BlockTag::ListItem,
            BlockKind::BlockQuote => BlockTag::BlockQuote,
            BlockKind::Alert(_) => BlockTag::Alert,
            BlockKind::ThematicBreak => BlockTag::ThematicBreak,
            BlockKind::HtmlBlock { .. } => BlockTag::HtmlBlock,
            BlockKind::Table { .. } => BlockTag::Table,
            BlockKind::TableRow { .. } => BlockTag::TableRow,
            BlockKind::TableCell { .. } => BlockTag::TableCell,
            BlockKind::MathBlock { .. } => BlockTag::MathBlock,
            BlockKind::FootnoteDefinition { .. } => BlockTag::FootnoteDefinition,
        }
    }
}

/// A block with the 0-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode<'a> {
    pub kind: BlockKind<'a>,
    pub line: usize,
    /// Byte range in the source.
    pub span: Range<usize>,
    pub children: Vec<Child<'a>>,
}

impl<'a> BlockNode<'a> {
    pub fn new(kind: BlockKind<'a>, line: usize, span: Range<usize>) -> Self {
        Self {
            kind,
            line,
            span,
            children: Vec::new(),
        }
    }

    /// The value emitted as `data-line`.
    pub fn data_line(&self) -> usize {
        self.line + 1
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BlockNode<'a>> {
        self.children.iter().filter_map(|c| match c {
            Child::Block(b) => Some(b),
            Child::Inline(_) => None,
        })
    }

    /// Every block in this subtree, preorder, including `self`.
    pub fn walk(&self) -> Vec<&BlockNode<'a>> {
        let mut out = vec![self];
        for child in self.blocks() {
            out.extend(child.walk());
        }
        out
    }
}

/// Blocks interleave with runs of inline events (tight list items hold
/// inline text directly, next to nested lists).
#[derive(Debug, Clone, PartialEq)]
pub enum Child<'a> {
    Block(BlockNode<'a>),
    Inline(Vec<Event<'a>>),
}

/// Footnote numbers in order of first appearance, reference or definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FootnoteNumbers {
    numbers: HashMap<String, usize>,
}

impl FootnoteNumbers {
    pub fn number(&mut self, label: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(label.to_string()).or_insert(next)
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.numbers.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDoc<'a> {
    pub blocks: Vec<BlockNode<'a>>,
    pub footnotes: FootnoteNumbers,
}

impl<'a> ParsedDoc<'a> {
    /// Every block in document order.
    pub fn walk(&self) -> Vec<&BlockNode<'a>> {
        self.blocks.iter().flat_map(|b| b.walk()).collect()
    }
}

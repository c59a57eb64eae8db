use pulldown_cmark::{Alignment, CodeBlockKind, Event, Tag, TagEnd};
use std::ops::Range;

use super::lines::LineIndex;
use super::types::{BlockKind, BlockNode, Child, FootnoteNumbers, ParsedDoc};

/// Folds the flat pulldown-cmark event stream into a tree of [`BlockNode`]s,
/// stamping each with the line its byte range starts on.
pub struct BlockBuilder<'a, 'l> {
    lines: &'l LineIndex,
    stack: Vec<BlockNode<'a>>,
    out: Vec<BlockNode<'a>>,
    footnotes: FootnoteNumbers,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl<'a, 'l> BlockBuilder<'a, 'l> {
    pub fn new(lines: &'l LineIndex) -> Self {
        Self {
            lines,
            stack: Vec::new(),
            out: Vec::new(),
            footnotes: FootnoteNumbers::default(),
            alignments: Vec::new(),
            cell_index: 0,
        }
    }

    pub fn push(&mut self, event: Event<'a>, range: Range<usize>) {
        match event {
            Event::Start(tag) => match self.open_kind(tag) {
                Ok(kind) => {
                    let line = self.lines.line_of(range.start);
                    self.stack.push(BlockNode::new(kind, line, range));
                }
                Err(tag) => self.push_inline(Event::Start(tag)),
            },
            Event::End(end) if is_block_end(&end) => self.close(),
            Event::Rule => {
                let line = self.lines.line_of(range.start);
                self.attach(BlockNode::new(BlockKind::ThematicBreak, line, range));
            }
            Event::Text(text) if self.in_code_block() => {
                if let Some(BlockKind::CodeBlock { text: body, .. }) =
                    self.stack.last_mut().map(|n| &mut n.kind)
                {
                    body.push_str(&text);
                }
            }
            Event::Html(html) | Event::Text(html) if self.in_html_block() => {
                if let Some(BlockKind::HtmlBlock { raw }) =
                    self.stack.last_mut().map(|n| &mut n.kind)
                {
                    raw.push_str(&html);
                }
            }
            Event::FootnoteReference(label) => {
                self.footnotes.number(&label);
                self.push_inline(Event::FootnoteReference(label));
            }
            other => self.push_inline(other),
        }
    }

    pub fn finish(mut self) -> ParsedDoc<'a> {
        while !self.stack.is_empty() {
            self.close();
        }
        ParsedDoc {
            blocks: self.out,
            footnotes: self.footnotes,
        }
    }

    /// Block-level tags become a [`BlockKind`]; inline tags are handed back.
    fn open_kind(&mut self, tag: Tag<'a>) -> Result<BlockKind<'a>, Tag<'a>> {
        let kind = match tag {
            Tag::Paragraph => BlockKind::Paragraph,
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => BlockKind::Heading {
                level,
                id,
                classes,
                attrs,
            },
            Tag::BlockQuote(None) => BlockKind::BlockQuote,
            Tag::BlockQuote(Some(kind)) => BlockKind::Alert(kind),
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => BlockKind::CodeBlock {
                language: info_language(&info),
                fenced: true,
                text: String::new(),
            },
            Tag::CodeBlock(CodeBlockKind::Indented) => BlockKind::CodeBlock {
                language: None,
                fenced: false,
                text: String::new(),
            },
            Tag::HtmlBlock => BlockKind::HtmlBlock { raw: String::new() },
            Tag::List(start) => BlockKind::List { start },
            Tag::Item => BlockKind::ListItem,
            Tag::FootnoteDefinition(label) => {
                let number = self.footnotes.number(&label);
                BlockKind::FootnoteDefinition { label, number }
            }
            Tag::Table(alignments) => {
                self.alignments = alignments.clone();
                BlockKind::Table { alignments }
            }
            Tag::TableHead => {
                self.cell_index = 0;
                BlockKind::TableRow { header: true }
            }
            Tag::TableRow => {
                self.cell_index = 0;
                BlockKind::TableRow { header: false }
            }
            Tag::TableCell => {
                let header = matches!(
                    self.stack.last().map(|n| &n.kind),
                    Some(BlockKind::TableRow { header: true })
                );
                let alignment = self
                    .alignments
                    .get(self.cell_index)
                    .copied()
                    .unwrap_or(Alignment::None);
                self.cell_index += 1;
                BlockKind::TableCell { header, alignment }
            }
            other => return Err(other),
        };
        Ok(kind)
    }

    fn close(&mut self) {
        let Some(mut node) = self.stack.pop() else {
            log::debug!("unbalanced block end ignored");
            return;
        };
        if node.kind == BlockKind::Paragraph
            && let Some(tex) = sole_display_math(&node.children)
        {
            node.kind = BlockKind::MathBlock { tex };
            node.children.clear();
        }
        self.attach(node);
    }

    fn attach(&mut self, node: BlockNode<'a>) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Child::Block(node)),
            None => self.out.push(node),
        }
    }

    fn push_inline(&mut self, event: Event<'a>) {
        let Some(parent) = self.stack.last_mut() else {
            log::debug!("inline event outside any block: {event:?}");
            return;
        };
        match parent.children.last_mut() {
            Some(Child::Inline(run)) => run.push(event),
            _ => parent.children.push(Child::Inline(vec![event])),
        }
    }

    fn in_code_block(&self) -> bool {
        matches!(
            self.stack.last().map(|n| &n.kind),
            Some(BlockKind::CodeBlock { .. })
        )
    }

    fn in_html_block(&self) -> bool {
        matches!(
            self.stack.last().map(|n| &n.kind),
            Some(BlockKind::HtmlBlock { .. })
        )
    }
}

fn is_block_end(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::CodeBlock
            | TagEnd::HtmlBlock
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::FootnoteDefinition
            | TagEnd::Table
            | TagEnd::TableHead
            | TagEnd::TableRow
            | TagEnd::TableCell
    )
}

/// `rust,ignore` and `python {.numberLines}` both yield the bare language.
fn info_language(info: &str) -> Option<String> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .filter(|word| !word.is_empty())
        .map(str::to_string)
}

fn sole_display_math(children: &[Child<'_>]) -> Option<String> {
    let mut found = None;
    for child in children {
        let Child::Inline(events) = child else {
            return None;
        };
        for event in events {
            match event {
                Event::SoftBreak | Event::HardBreak => {}
                Event::Text(t) if t.trim().is_empty() => {}
                Event::DisplayMath(tex) if found.is_none() => found = Some(tex.to_string()),
                _ => return None,
            }
        }
    }
    found
}

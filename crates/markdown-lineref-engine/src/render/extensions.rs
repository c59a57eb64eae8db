//! Renderers for the markdown extensions: tables, display math, alert
//! containers and footnote definitions. Installed after the core set.

use pulldown_cmark::{Alignment, BlockQuoteKind};

use super::RenderContext;
use super::registry::BlockRenderer;
use crate::parsing::{BlockKind, BlockNode};

pub struct TableRenderer;

impl BlockRenderer for TableRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        let is_header = |row: &&BlockNode<'_>| matches!(row.kind, BlockKind::TableRow { header: true });

        cx.write("<table");
        cx.write_line_attr(node);
        cx.write(">\n<thead>\n");
        for row in node.blocks().filter(is_header) {
            cx.render_block(row);
        }
        cx.write("</thead>\n");

        let mut body = node.blocks().filter(|r| !is_header(r)).peekable();
        if body.peek().is_some() {
            cx.write("<tbody>\n");
            for row in body {
                cx.render_block(row);
            }
            cx.write("</tbody>\n");
        }
        cx.write("</table>\n");
    }
}

pub struct TableRowRenderer;

impl BlockRenderer for TableRowRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        cx.write("<tr");
        cx.write_line_attr(node);
        cx.write(">");
        cx.render_children(node);
        cx.write("</tr>\n");
    }
}

/// Cells carry no line of their own; the row's `data-line` covers them.
pub struct TableCellRenderer;

impl BlockRenderer for TableCellRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        let (header, alignment) = match node.kind {
            BlockKind::TableCell { header, alignment } => (header, alignment),
            _ => (false, Alignment::None),
        };
        let tag = if header { "th" } else { "td" };

        cx.write("<");
        cx.write(tag);
        match alignment {
            Alignment::None => {}
            Alignment::Left => cx.write_attr("style", "text-align: left"),
            Alignment::Center => cx.write_attr("style", "text-align: center"),
            Alignment::Right => cx.write_attr("style", "text-align: right"),
        }
        cx.write(">");
        cx.render_children(node);
        cx.write("</");
        cx.write(tag);
        cx.write(">");
    }
}

pub struct MathBlockRenderer;

impl BlockRenderer for MathBlockRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        let BlockKind::MathBlock { tex } = &node.kind else {
            return cx.render_children(node);
        };
        cx.write("<div class=\"math math-display\"");
        cx.write_line_attr(node);
        cx.write_attr("data-math", tex);
        cx.write(">");
        cx.write_escaped(tex);
        cx.write("</div>\n");
    }
}

/// GitHub-style `> [!NOTE]` containers.
pub struct AlertRenderer;

impl BlockRenderer for AlertRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        let BlockKind::Alert(kind) = node.kind else {
            return cx.render_children(node);
        };
        let (class, title) = match kind {
            BlockQuoteKind::Note => ("note", "Note"),
            BlockQuoteKind::Tip => ("tip", "Tip"),
            BlockQuoteKind::Important => ("important", "Important"),
            BlockQuoteKind::Warning => ("warning", "Warning"),
            BlockQuoteKind::Caution => ("caution", "Caution"),
        };

        cx.write("<blockquote");
        cx.write_attr("class", &format!("markdown-alert markdown-alert-{class}"));
        cx.write_line_attr(node);
        cx.write(">\n<p class=\"markdown-alert-title\">");
        cx.write(title);
        cx.write("</p>\n");
        cx.render_children(node);
        cx.write("</blockquote>\n");
    }
}

pub struct FootnoteDefinitionRenderer;

impl BlockRenderer for FootnoteDefinitionRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        let BlockKind::FootnoteDefinition { label, number } = &node.kind else {
            return cx.render_children(node);
        };
        cx.write("<div class=\"footnote-definition\"");
        cx.write_attr("id", &format!("fn-{label}"));
        cx.write_line_attr(node);
        cx.write("><sup class=\"footnote-definition-label\">");
        cx.write(&number.to_string());
        cx.write("</sup>\n");
        cx.render_children(node);
        cx.write("</div>\n");
    }
}

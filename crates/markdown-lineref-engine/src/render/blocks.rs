//! Line-tracking renderers for the CommonMark block kinds.

use super::registry::BlockRenderer;
use super::{LINE_ATTR, RenderContext};
use crate::parsing::{BlockKind, BlockNode};

pub struct ParagraphRenderer;

impl BlockRenderer for ParagraphRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        cx.write("<p");
        cx.write_line_attr(node);
        cx.write(">");
        cx.render_children(node);
        cx.write("</p>\n");
    }
}

pub struct HeadingRenderer;

impl BlockRenderer for HeadingRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        let BlockKind::Heading {
            level,
            id,
            classes,
            attrs,
        } = &node.kind
        else {
            return cx.render_children(node);
        };
        let tag = format!("h{}", *level as usize);

        cx.write("<");
        cx.write(&tag);
        cx.write_line_attr(node);
        if let Some(id) = id {
            cx.write_attr("id", id);
        }
        if !classes.is_empty() {
            let joined: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
            cx.write_attr("class", &joined.join(" "));
        }
        for (name, value) in attrs {
            cx.write_attr(name, value.as_deref().unwrap_or(""));
        }
        cx.write(">");
        cx.render_children(node);
        cx.write("</");
        cx.write(&tag);
        cx.write(">\n");
    }
}

/// Plain code gets one `span.code-line` per source line; fences in the
/// diagram language become a `pre.diagram` container for the diagram
/// library, with the raw source kept in `data-source`.
pub struct CodeBlockRenderer;

impl BlockRenderer for CodeBlockRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        let BlockKind::CodeBlock {
            language,
            fenced,
            text,
        } = &node.kind
        else {
            return cx.render_children(node);
        };

        if *fenced && cx.options.is_diagram_language(language.as_deref()) {
            cx.write("<pre class=\"diagram\"");
            cx.write_line_attr(node);
            cx.write_attr("data-source", text);
            cx.write(">");
            cx.write_escaped(text);
            cx.write("</pre>\n");
            return;
        }

        cx.write("<pre");
        cx.write_line_attr(node);
        cx.write("><code");
        if let Some(language) = language {
            cx.write_attr("class", &format!("language-{language}"));
        }
        cx.write(">");

        // Content starts on the line after an opening fence.
        let first = node.data_line() + usize::from(*fenced);
        for (i, line) in text.lines().enumerate() {
            if i > 0 {
                cx.write("\n");
            }
            cx.write("<span class=\"code-line\"");
            cx.write_attr(LINE_ATTR, &(first + i).to_string());
            cx.write(">");
            cx.write_escaped(line);
            cx.write("</span>");
        }
        cx.write("</code></pre>\n");
    }
}

pub struct ListRenderer;

impl BlockRenderer for ListRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        let start = match node.kind {
            BlockKind::List { start } => start,
            _ => None,
        };
        let tag = if start.is_some() { "ol" } else { "ul" };

        cx.write("<");
        cx.write(tag);
        cx.write_line_attr(node);
        if let Some(start) = start
            && start != 1
        {
            cx.write_attr("start", &start.to_string());
        }
        cx.write(">\n");
        cx.render_children(node);
        cx.write("</");
        cx.write(tag);
        cx.write(">\n");
    }
}

pub struct ListItemRenderer;

impl BlockRenderer for ListItemRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        cx.write("<li");
        cx.write_line_attr(node);
        cx.write(">");
        cx.render_children(node);
        cx.write("</li>\n");
    }
}

pub struct BlockQuoteRenderer;

impl BlockRenderer for BlockQuoteRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        cx.write("<blockquote");
        cx.write_line_attr(node);
        cx.write(">\n");
        cx.render_children(node);
        cx.write("</blockquote>\n");
    }
}

pub struct ThematicBreakRenderer;

impl BlockRenderer for ThematicBreakRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        cx.write("<hr");
        cx.write_line_attr(node);
        cx.write(" />\n");
    }
}

/// Raw HTML passes through untouched inside a line-tagged wrapper.
pub struct HtmlBlockRenderer;

impl BlockRenderer for HtmlBlockRenderer {
    fn render(&self, node: &BlockNode<'_>, cx: &mut RenderContext<'_>) {
        let BlockKind::HtmlBlock { raw } = &node.kind else {
            return cx.render_children(node);
        };
        cx.write("<div class=\"html-block\"");
        cx.write_line_attr(node);
        cx.write(">");
        cx.write(raw);
        cx.write("</div>\n");
    }
}

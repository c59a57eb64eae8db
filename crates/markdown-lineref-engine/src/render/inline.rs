use pulldown_cmark::{CowStr, Event, html};

use crate::parsing::FootnoteNumbers;

/// Render inline events, swapping in our own markup for math and footnote
/// references before pulldown-cmark's writer sees them.
pub fn push_inline(out: &mut String, events: &[Event<'_>], footnotes: &FootnoteNumbers) {
    let mapped = events.iter().cloned().map(|event| match event {
        Event::InlineMath(tex) => Event::InlineHtml(math_span("math math-inline", &tex).into()),
        Event::DisplayMath(tex) => Event::InlineHtml(math_span("math math-display", &tex).into()),
        Event::FootnoteReference(label) => {
            Event::InlineHtml(footnote_reference(&label, footnotes).into())
        }
        other => other,
    });
    html::push_html(out, mapped);
}

fn math_span(class: &str, tex: &str) -> String {
    format!(
        "<span class=\"{class}\" data-math=\"{}\">{}</span>",
        html_escape::encode_double_quoted_attribute(tex),
        html_escape::encode_text(tex)
    )
}

fn footnote_reference(label: &CowStr<'_>, footnotes: &FootnoteNumbers) -> String {
    let label_attr = html_escape::encode_double_quoted_attribute(label.as_ref());
    let number = footnotes.get(label).unwrap_or(0);
    format!(
        "<sup class=\"footnote-reference\"><a href=\"#fn-{label_attr}\" id=\"fnref-{label_attr}\">{number}</a></sup>"
    )
}

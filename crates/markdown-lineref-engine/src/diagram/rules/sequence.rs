use regex::Regex;
use std::sync::LazyLock;

use super::has_class_prefix;
use crate::diagram::DiagramMark;
use crate::diagram::source_map::{Arrow, SourceLine, SourceMaps};
use crate::diagram::stamp::{Stamper, has_class, text_of};

static PARTICIPANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:participant|actor)\s+(.+?)(?:\s+as\s+(.+))?$")
        .expect("Invalid participant regex")
});

static MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^:]+?)\s*(<<-->>|<<->>|-->>|->>|-->|->|--x|-x|--\)|-\))\s*[+-]?\s*([^:]+?)\s*:\s*(.*)$")
        .expect("Invalid message regex")
});

static NOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^note\s+(?:left of|right of|over)\s+[^:]+:\s*(.+)$")
        .expect("Invalid note regex")
});

static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:loop|alt|else|opt|par|and|critical|option|break)\b\s*(.*)$")
        .expect("Invalid block regex")
});

pub fn scan(maps: &mut SourceMaps, line: &SourceLine<'_>) {
    if line.header {
        return;
    }
    let n = line.number;

    if let Some(caps) = PARTICIPANT.captures(line.text) {
        maps.add_node(&caps[1], n);
        if let Some(alias) = caps.get(2) {
            maps.add_node(alias.as_str(), n);
        }
    } else if let Some(caps) = NOTE.captures(line.text) {
        maps.add_label(&format!("note:{}", caps[1].trim()), n);
    } else if let Some(caps) = MESSAGE.captures(line.text) {
        let (from, to, text) = (caps[1].trim(), caps[3].trim(), caps[4].trim());
        maps.add_node(from, n);
        maps.add_node(to, n);
        maps.add_link(Arrow::new(n, from, to, &caps[2]).with_label(Some(text)));
        if !text.is_empty() {
            maps.add_label(&format!("seq:{text}"), n);
        }
    } else if let Some(caps) = BLOCK.captures(line.text) {
        let text = caps[1].trim();
        if !text.is_empty() {
            maps.add_label(&format!("seq-block:{text}"), n);
        }
    }
}

pub fn stamp(maps: &SourceMaps, stamper: &mut Stamper<'_>) {
    // Actors are drawn twice, above and below the lifelines.
    for actor in stamper.select(|e| e.attr("name").is_some() && has_class_prefix(e, "actor")) {
        let name = stamper.doc().attr(actor, "name").unwrap_or("").to_string();
        if let Some(line) = maps.node_line(&name) {
            stamper.stamp(actor, line, DiagramMark::Node, &name);
        }
    }
    for text in stamper.select(|e| e.is("text") && has_class(e, "actor")) {
        let name = text_of(stamper.doc(), text);
        if let Some(line) = maps.node_line(&name) {
            stamper.stamp(text, line, DiagramMark::Node, &name);
        }
    }

    let messages = stamper.select(|e| e.is("text") && has_class(e, "messageText"));
    for (text, link) in messages.into_iter().zip(&maps.links) {
        let value = text_of(stamper.doc(), text);
        stamper.stamp(text, link.line, DiagramMark::Message, &value);
    }

    let arrows =
        stamper.select(|e| has_class(e, "messageLine0") || has_class(e, "messageLine1"));
    for (arrow, link) in arrows.into_iter().zip(&maps.links) {
        stamper.stamp_link(arrow, DiagramMark::Arrow, link);
    }

    for note in stamper.select(|e| e.is("text") && has_class(e, "noteText")) {
        let text = text_of(stamper.doc(), note);
        if let Some(line) = maps.label_line(&format!("note:{text}")) {
            stamper.stamp(note, line, DiagramMark::Label, &text);
        }
    }

    for block in stamper.select(|e| e.is("text") && has_class(e, "loopText")) {
        let raw = text_of(stamper.doc(), block);
        let text = raw.trim_start_matches('[').trim_end_matches(']').trim();
        if let Some(line) = maps.label_line(&format!("seq-block:{text}")) {
            stamper.stamp(block, line, DiagramMark::Label, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::diagram::{DiagramKind, SOURCE_LINE_ATTR, SourceMaps, correlate};
    use markdown_lineref_markup::parse;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "sequenceDiagram
    participant A as Alice
    participant B
    A->>B: Hello
    Note right of B: Thinking
    B-->>A: Hi back
    loop Every minute
      A-)B: ping
    end
";

    #[test]
    fn test_scans_participants_messages_and_notes() {
        let maps = SourceMaps::build(DiagramKind::Sequence, SOURCE, 4);

        assert_eq!(maps.node_line("A"), Some(6));
        assert_eq!(maps.node_line("Alice"), Some(6));
        assert_eq!(maps.node_line("B"), Some(7));
        assert_eq!(
            maps.links
                .iter()
                .map(|l| (l.line, l.kind.as_str()))
                .collect::<Vec<_>>(),
            vec![(8, "->>"), (10, "-->>"), (12, "-)")]
        );
        assert_eq!(maps.label_line("seq:Hello"), Some(8));
        assert_eq!(maps.label_line("note:Thinking"), Some(9));
        assert_eq!(maps.label_line("seq-block:Every minute"), Some(11));
    }

    #[test]
    fn test_stamps_actors_messages_by_order_and_notes() {
        let mut doc = parse(
            r#"<svg><g><rect x="0" y="0" width="150" height="65" name="A" class="actor actor-top"></rect><text x="75" y="32" class="actor"><tspan>Alice</tspan></text></g><g><rect x="200" y="0" width="150" height="65" name="B" class="actor actor-top"></rect><text class="actor"><tspan>B</tspan></text></g><text class="messageText">Hello</text><line x1="75" y1="100" x2="275" y2="100" class="messageLine0"></line><g><rect class="note"></rect><text class="noteText"><tspan>Thinking</tspan></text></g><text class="messageText">Hi back</text><line x1="275" y1="150" x2="75" y2="150" class="messageLine1"></line><g><text class="loopText"><tspan>[Every minute]</tspan></text></g></svg>"#,
        );
        let root = doc.root();

        let report = correlate(SOURCE, 4, &mut doc, root);

        let line_at = |attr: &str, value: &str| {
            let node = doc.find(root, |e| e.attr(attr) == Some(value)).unwrap();
            doc.attr(node, SOURCE_LINE_ATTR).map(str::to_string)
        };
        assert_eq!(line_at("name", "A"), Some("6".into()));
        assert_eq!(line_at("x", "75"), Some("6".into()));
        assert_eq!(line_at("class", "messageLine1"), Some("10".into()));
        assert_eq!(line_at("class", "noteText"), Some("9".into()));
        assert_eq!(line_at("class", "loopText"), Some("11".into()));

        let reply = doc.find(root, |e| e.attr("class") == Some("messageLine1")).unwrap();
        assert_eq!(doc.attr(reply, "data-mermaid-from"), Some("B"));
        assert_eq!(doc.attr(reply, "data-mermaid-to"), Some("A"));
        assert_eq!(report.overlays, 2);
    }
}

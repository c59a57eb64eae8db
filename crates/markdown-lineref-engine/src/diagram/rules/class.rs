use regex::Regex;
use std::sync::LazyLock;

use super::rendered_name;
use crate::diagram::DiagramMark;
use crate::diagram::source_map::{Arrow, Member, ScanState, SourceLine, SourceMaps};
use crate::diagram::stamp::{Stamper, has_class, text_of};

static CLASS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class\s+(\w+)(?:~[^~]*~)?(?:\s*\[[^\]]*\])?\s*(\{)?\s*(\})?\s*$")
        .expect("Invalid class declaration regex")
});

static RELATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(\w+)\s*(?:"[^"]*"\s*)?(<\|--|--\|>|\*--|--\*|o--|--o|<--|-->|<\|\.\.|\.\.\|>|<\.\.|\.\.>|--|\.\.)\s*(?:"[^"]*"\s*)?(\w+)\s*(?::\s*(.+))?$"#,
    )
    .expect("Invalid relation regex")
});

/// `Owner : +member` shorthand outside a class body.
static MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*:\s*(.+)$").expect("Invalid member regex"));

static RENDERED_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^classId-(.+)-\d+$").expect("Invalid class id regex"));

static RENDERED_RELATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^id_(.+)_\d+$").expect("Invalid relation id regex"));

pub fn scan(maps: &mut SourceMaps, line: &SourceLine<'_>, state: &mut ScanState) {
    if line.header {
        return;
    }
    let n = line.number;

    if let Some(owner) = state.open_block.clone() {
        if line.text.starts_with('}') {
            state.open_block = None;
        } else if !line.text.starts_with("<<") {
            maps.members.push(member(n, &owner, line.text));
        }
        return;
    }

    if let Some(caps) = CLASS_DECL.captures(line.text) {
        maps.add_node(&caps[1], n);
        if caps.get(2).is_some() && caps.get(3).is_none() {
            state.open_block = Some(caps[1].to_string());
        }
    } else if let Some(caps) = RELATION.captures(line.text) {
        let label = caps.get(4).map(|m| m.as_str());
        maps.add_node(&caps[1], n);
        maps.add_node(&caps[3], n);
        maps.add_link(Arrow::new(n, &caps[1], &caps[3], &caps[2]).with_label(label));
        if let Some(label) = label {
            maps.add_label(label, n);
        }
    } else if let Some(caps) = MEMBER.captures(line.text) {
        maps.add_node(&caps[1], n);
        maps.members.push(member(n, &caps[1], caps[2].trim()));
    }
}

fn member(line: usize, owner: &str, text: &str) -> Member {
    Member {
        line,
        owner: owner.to_string(),
        text: text.to_string(),
        method: text.contains('('),
    }
}

pub fn stamp(maps: &SourceMaps, stamper: &mut Stamper<'_>) {
    for node in stamper.select(|e| e.is("g") && has_class(e, "node")) {
        let Some(name) = stamper
            .doc()
            .element(node)
            .and_then(|e| rendered_name(e, &RENDERED_CLASS))
        else {
            continue;
        };
        if let Some(line) = maps.node_line(&name) {
            stamper.stamp(node, line, DiagramMark::Class, &name);
        }

        for (group_class, method) in [("members-group", false), ("methods-group", true)] {
            let doc = stamper.doc();
            let Some(group) = doc.find(node, |e| has_class(e, group_class)) else {
                continue;
            };
            let rows: Vec<_> = doc.element_children(group).collect();
            let declared = maps
                .members
                .iter()
                .filter(|m| m.owner == name && m.method == method);
            for (row, member) in rows.into_iter().zip(declared) {
                stamper.stamp(row, member.line, DiagramMark::Member, &member.text);
            }
        }
    }

    let relations = stamper.select(|e| e.is("path") && has_class(e, "relation"));
    for (i, relation) in relations.into_iter().enumerate() {
        let by_id = stamper
            .doc()
            .attr(relation, "id")
            .and_then(|id| RENDERED_RELATION.captures(id))
            .and_then(|caps| caps.get(1))
            .and_then(|body| {
                let body = body.as_str();
                body.match_indices('_')
                    .find_map(|(at, _)| maps.arrow(&body[..at], &body[at + 1..]))
            });
        if let Some(arrow) = by_id.or_else(|| maps.links.get(i)) {
            stamper.stamp_link(relation, DiagramMark::Relation, arrow);
        }
    }

    for label in stamper.select(|e| e.is("g") && has_class(e, "edgeLabel")) {
        let text = text_of(stamper.doc(), label);
        if let Some(line) = maps.label_line(&text) {
            stamper.stamp(label, line, DiagramMark::Label, &text);
        }
    }
}

use regex::Regex;
use std::sync::LazyLock;

use super::{rendered_name, unquote};
use crate::diagram::DiagramMark;
use crate::diagram::source_map::{Arrow, Member, ScanState, SourceLine, SourceMaps};
use crate::diagram::stamp::{Stamper, has_class, text_of};

static ENTITY_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w-]+)(?:\s*\[[^\]]*\])?\s*\{\s*$").expect("Invalid entity regex")
});

static RELATIONSHIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w-]+)\s*([|}{o]{2}(?:--|\.\.)[|}{o]{2})\s*([\w-]+)\s*:\s*(.+)$")
        .expect("Invalid relationship regex")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w()\[\],-]+\s+([\w-]+)").expect("Invalid attribute regex")
});

static BARE_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w-]+)$").expect("Invalid entity regex"));

static RENDERED_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^entity-(.+?)-\d+$").expect("Invalid entity id regex"));

static RENDERED_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:text-)?entity-(.+?)-\d+-attr-(\d+)-").expect("Invalid attribute id regex")
});

pub fn scan(maps: &mut SourceMaps, line: &SourceLine<'_>, state: &mut ScanState) {
    if line.header {
        return;
    }
    let n = line.number;

    if let Some(owner) = state.open_block.clone() {
        if line.text.starts_with('}') {
            state.open_block = None;
        } else if let Some(caps) = ATTRIBUTE.captures(line.text) {
            maps.members.push(Member {
                line: n,
                owner,
                text: caps[1].to_string(),
                method: false,
            });
        }
        return;
    }

    if let Some(caps) = RELATIONSHIP.captures(line.text) {
        let label = unquote(&caps[4]);
        maps.add_node(&caps[1], n);
        maps.add_node(&caps[3], n);
        maps.add_link(Arrow::new(n, &caps[1], &caps[3], &caps[2]).with_label(Some(label)));
        maps.add_label(&format!("er:{label}"), n);
    } else if let Some(caps) = ENTITY_OPEN.captures(line.text) {
        maps.add_node(&caps[1], n);
        state.open_block = Some(caps[1].to_string());
    } else if let Some(caps) = BARE_ENTITY.captures(line.text) {
        maps.add_node(&caps[1], n);
    }
}

pub fn stamp(maps: &SourceMaps, stamper: &mut Stamper<'_>) {
    let entities = stamper.select(|e| {
        e.is("g")
            && (e.attr("data-id").is_some()
                || e.attr("id").is_some_and(|id| RENDERED_ENTITY.is_match(id)))
    });
    for entity in entities {
        let name = stamper
            .doc()
            .element(entity)
            .and_then(|e| rendered_name(e, &RENDERED_ENTITY));
        if let Some(name) = name
            && let Some(line) = maps.node_line(&name)
        {
            stamper.stamp(entity, line, DiagramMark::Entity, &name);
        }
    }

    let is_attribute = |id: Option<&str>| id.is_some_and(|id| RENDERED_ATTRIBUTE.is_match(id));

    let titles = stamper.select(|e| {
        e.is("text") && has_class(e, "entityLabel") && !is_attribute(e.attr("id"))
    });
    for title in titles {
        let name = text_of(stamper.doc(), title);
        if let Some(line) = maps.node_line(&name) {
            stamper.stamp(title, line, DiagramMark::Entity, &name);
        }
    }

    for attribute in stamper.select(|e| is_attribute(e.attr("id"))) {
        let found = stamper
            .doc()
            .attr(attribute, "id")
            .and_then(|id| RENDERED_ATTRIBUTE.captures(id))
            .and_then(|caps| {
                let owner = caps.get(1)?.as_str().to_string();
                let index: usize = caps.get(2)?.as_str().parse().ok()?;
                Some((owner, index))
            })
            .and_then(|(owner, index)| {
                maps.members
                    .iter()
                    .filter(|m| m.owner == owner)
                    .nth(index.checked_sub(1)?)
            });
        if let Some(member) = found {
            let value = format!("{}.{}", member.owner, member.text);
            stamper.stamp(attribute, member.line, DiagramMark::Attribute, &value);
        }
    }

    let lines = stamper.select(|e| has_class(e, "relationshipLine"));
    for (path, link) in lines.into_iter().zip(&maps.links) {
        stamper.stamp_link(path, DiagramMark::Relationship, link);
    }

    for label in stamper.select(|e| has_class(e, "relationshipLabel")) {
        let text = text_of(stamper.doc(), label);
        if let Some(line) = maps.label_line(&format!("er:{text}")) {
            stamper.stamp(label, line, DiagramMark::Label, &text);
        }
    }
}

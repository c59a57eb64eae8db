use regex::Regex;
use std::sync::LazyLock;

use crate::diagram::DiagramMark;
use crate::diagram::source_map::{Item, SourceLine, SourceMaps};
use crate::diagram::stamp::{Stamper, has_class, text_of};

static COMMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(commit|merge|cherry-pick)\b\s*(.*)$").expect("Invalid commit regex")
});

static COMMIT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bid:\s*"([^"]+)""#).expect("Invalid commit id regex"));

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\btag:\s*"([^"]+)""#).expect("Invalid tag regex"));

static BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^branch\s+(\S+)").expect("Invalid branch regex"));

const DEFAULT_BRANCH: &str = "main";

pub fn scan(maps: &mut SourceMaps, line: &SourceLine<'_>) {
    let n = line.number;
    if line.header {
        maps.add_label(&format!("branch:{DEFAULT_BRANCH}"), n);
        return;
    }

    if let Some(caps) = COMMIT.captures(line.text) {
        let rest = &caps[2];
        let id = COMMIT_ID.captures(rest).map(|c| c[1].to_string());
        if let Some(tag) = TAG.captures(rest) {
            maps.add_label(&format!("tag:{}", &tag[1]), n);
        }
        if let Some(id) = &id {
            maps.add_label(&format!("commit:{id}"), n);
        }
        let text = match (id, &caps[1]) {
            (Some(id), _) => id,
            (None, "commit") => "commit".to_string(),
            // `merge feature` and `cherry-pick id: ...` read best in full
            (None, _) => line.text.to_string(),
        };
        maps.items.push(Item { line: n, text });
    } else if let Some(caps) = BRANCH.captures(line.text) {
        maps.add_label(&format!("branch:{}", &caps[1]), n);
    }
}

pub fn stamp(maps: &SourceMaps, stamper: &mut Stamper<'_>) {
    // Merge commits are drawn as two concentric circles; position identifies
    // the commit.
    let circles = stamper.select(|e| e.is("circle") && has_class(e, "commit"));
    let mut positions: Vec<(String, String)> = Vec::new();
    for circle in circles {
        let doc = stamper.doc();
        let position = (
            doc.attr(circle, "cx").unwrap_or("").to_string(),
            doc.attr(circle, "cy").unwrap_or("").to_string(),
        );
        let index = match positions.iter().position(|p| *p == position) {
            Some(index) => index,
            None => {
                positions.push(position);
                positions.len() - 1
            }
        };
        if let Some(commit) = maps.items.get(index) {
            stamper.stamp(circle, commit.line, DiagramMark::Commit, &commit.text);
        }
    }

    let labels = stamper.select(|e| e.is("text") && has_class(e, "commit-label"));
    for (label, commit) in labels.into_iter().zip(&maps.items) {
        stamper.stamp(label, commit.line, DiagramMark::Commit, &commit.text);
    }

    for branch in stamper.select(|e| e.is("g") && has_class(e, "branchLabel")) {
        let name = text_of(stamper.doc(), branch);
        if let Some(line) = maps.label_line(&format!("branch:{name}")) {
            stamper.stamp(branch, line, DiagramMark::Branch, &name);
        }
    }

    for tag in stamper.select(|e| e.is("text") && has_class(e, "tag-label")) {
        let name = text_of(stamper.doc(), tag);
        if let Some(line) = maps.label_line(&format!("tag:{name}")) {
            stamper.stamp(tag, line, DiagramMark::Label, &name);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::diagram::{DiagramKind, SOURCE_LINE_ATTR, SourceMaps, correlate};
    use markdown_lineref_markup::parse;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"gitGraph
    commit id: "init"
    branch feature
    commit id: "work" tag: "v0.1"
    checkout main
    merge feature
"#;

    #[test]
    fn test_scans_commits_branches_and_tags() {
        let maps = SourceMaps::build(DiagramKind::Git, SOURCE, 0);

        assert_eq!(
            maps.items
                .iter()
                .map(|c| (c.line, c.text.as_str()))
                .collect::<Vec<_>>(),
            vec![(2, "init"), (4, "work"), (6, "merge feature")]
        );
        assert_eq!(maps.label_line("branch:main"), Some(1));
        assert_eq!(maps.label_line("branch:feature"), Some(3));
        assert_eq!(maps.label_line("tag:v0.1"), Some(4));
        assert_eq!(maps.label_line("commit:work"), Some(4));
    }

    #[test]
    fn test_merge_circles_share_their_commit_line() {
        let mut doc = parse(
            r#"<svg><g class="commit-bullets"><circle id="c0" cx="10" cy="10" r="10" class="commit init commit0"></circle><circle id="c1" cx="60" cy="40" r="10" class="commit work commit1"></circle><circle id="c2" cx="110" cy="10" r="9" class="commit m commit-merge commit0"></circle><circle id="c3" cx="110" cy="10" r="6" class="commit commit-merge"></circle></g><g class="commit-labels"><text id="t0" class="commit-label">init</text><text id="t1" class="commit-label">work</text></g><g class="branchLabel"><g class="label branch-label1"><text><tspan>feature</tspan></text></g></g><text class="tag-label">v0.1</text></svg>"#,
        );
        let root = doc.root();

        correlate(SOURCE, 0, &mut doc, root);

        let line = |id: &str| {
            let node = doc.find(root, |e| e.attr("id") == Some(id)).unwrap();
            doc.attr(node, SOURCE_LINE_ATTR)
        };
        assert_eq!(line("c0"), Some("2"));
        assert_eq!(line("c1"), Some("4"));
        assert_eq!(line("c2"), Some("6"));
        assert_eq!(line("c3"), Some("6"));
        assert_eq!(line("t1"), Some("4"));

        let branch = doc.find(root, |e| e.attr("class") == Some("branchLabel")).unwrap();
        assert_eq!(doc.attr(branch, "data-mermaid-branch"), Some("feature"));
        let tag = doc.find(root, |e| e.attr("class") == Some("tag-label")).unwrap();
        assert_eq!(doc.attr(tag, SOURCE_LINE_ATTR), Some("4"));
    }
}

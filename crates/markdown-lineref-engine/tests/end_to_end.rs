use markdown_lineref_engine::{
    Assembler, DocumentView, Effect, HostMessage, LinkTarget, ViewCommand,
};
use markdown_lineref_markup::NodeId;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

const FLOWCHART_SVG: &str = r#"<svg id="lineref-diagram-0"><g class="root"><g class="edgePaths"><path d="M20,30L20,70" id="L-A-B-0" class="flowchart-link LS-A LE-B"></path></g><g class="nodes"><g class="node default" id="flowchart-A-0"><rect x="0" y="0" width="40" height="30"></rect><text>Start</text></g><g class="node default" id="flowchart-B-1"><rect x="0" y="70" width="40" height="30"></rect><text>End</text></g></g></g></svg>"#;

fn view_of(markdown: &str) -> DocumentView {
    let page = Assembler::default().assemble(markdown, Path::new("/notes"));
    DocumentView::from_assembled(&page)
}

fn path_to(view: &DocumentView, pred: impl Fn(&markdown_lineref_markup::Element) -> bool) -> Vec<usize> {
    let doc = view.document();
    let node: NodeId = doc.find(doc.root(), pred).unwrap();
    view.path_of(node).unwrap()
}

#[test]
fn heading_paragraph_and_link() {
    // Given the rendered page
    let mut view = view_of("# Hi\n\nSee [text](http://example.com).\n");
    let doc = view.document();
    let h1 = doc.find(doc.root(), |e| e.is("h1")).unwrap();
    let p = doc.find(doc.root(), |e| e.is("p")).unwrap();
    assert_eq!(doc.attr(h1, "data-line"), Some("1"));
    assert_eq!(doc.attr(p, "data-line"), Some("3"));
    let p_path = view.path_of(p).unwrap();

    // When the link is clicked outside pointing mode
    let effects = view.dispatch("link-click:http://example.com").unwrap();

    // Then the host is told to follow it
    let [Effect::Host(click)] = effects.as_slice() else {
        panic!("expected one host message, got {effects:?}");
    };
    assert_eq!(click.to_string(), "click:http://example.com");

    // And in pointing mode the paragraph describes itself
    view.dispatch("toggle-pointing:").unwrap();
    let effects = view
        .dispatch(&format!(
            "pointer-down:{}",
            p_path.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
        ))
        .unwrap();
    assert_eq!(
        effects,
        vec![Effect::Host(HostMessage::Point {
            line: Some(3),
            description: "See text.".into()
        })]
    );
    assert_eq!(
        HostMessage::Point {
            line: Some(3),
            description: "See text.".into()
        }
        .to_string(),
        "point:3|See text."
    );
}

#[test]
fn diagram_output_is_stamped_then_pointable() {
    let mut view = view_of("Intro\n\n```mermaid\nflowchart TD\nA[Start] --> B[End]\n```\n");

    let effects = view
        .dispatch(&format!("diagram-rendered:0|{FLOWCHART_SVG}"))
        .unwrap();
    let [Effect::Script(ViewCommand::ReplaceDiagram { markup, .. })] = effects.as_slice() else {
        panic!("expected a diagram replacement, got {effects:?}");
    };
    assert_eq!(markup.matches(r#"data-source-line="5""#).count(), 4);

    view.set_pointing(true);
    let edge = path_to(&view, |e| e.attr("id") == Some("L-A-B-0"));
    assert_eq!(
        view.pointer_down(&edge),
        Some(HostMessage::Point {
            line: Some(5),
            description: "mermaid edge: A --> B".into()
        })
    );

    // The diagram background still resolves to the container
    let background = path_to(&view, |e| e.attr("class") == Some("root"));
    assert_eq!(
        view.pointer_down(&background),
        Some(HostMessage::Point {
            line: Some(3),
            description: "mermaid diagram: flowchart TD".into()
        })
    );
}

#[test]
fn render_errors_are_reported_once_everything_has_run() {
    let mut view = view_of("# T\n\nInline $\\bad$ here.\n\n```mermaid\nflowchart TD\nA -->\n```\n");
    let formula = path_to(&view, |e| e.classes().any(|c| c == "math"));
    let formula = formula
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    view.dispatch(&format!("formula-failed:{formula}|Undefined control sequence: \\bad"))
        .unwrap();
    view.dispatch("diagram-failed:0|Parse error on line 2:\nA -->\n----^")
        .unwrap();
    let effects = view.dispatch("rendered:").unwrap();

    let [Effect::Host(HostMessage::RenderComplete(errors))] = effects.as_slice() else {
        panic!("expected render-complete, got {effects:?}");
    };
    assert_eq!(
        errors,
        &vec![
            "[KaTeX Line 3] Undefined control sequence: \\bad".to_string(),
            "[Mermaid Line 7] Parse error on line 2:\nA -->\n----^".to_string(),
        ]
    );
}

#[test]
fn scroll_lands_on_the_last_block_at_or_before_the_line() {
    let view = view_of("# A\n\npara one\n\n## B\n\npara two\n");

    let h2 = path_to(&view, |e| e.is("h2"));
    assert_eq!(view.scroll_to(6), Some(ViewCommand::ScrollTo(h2)));
}

#[test]
fn rendering_twice_differs_only_in_nonce() {
    let md = std::fs::read_to_string(format!(
        "{}/tests/fixtures/tour.md",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    let assembler = Assembler::default();

    let first = assembler.assemble(&md, Path::new("/notes"));
    let second = assembler.assemble(&md, Path::new("/notes"));

    assert_ne!(first.nonce, second.nonce);
    assert_eq!(
        first.html.replace(&first.nonce, "N"),
        second.html.replace(&second.nonce, "N")
    );
}

#[test]
fn assembles_files_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.md");
    std::fs::write(&path, "# From disk\n").unwrap();

    let page = Assembler::default().assemble_file(&path).unwrap();

    assert!(page.html.contains("<h1 data-line=\"1\">From disk</h1>"));
    assert!(Assembler::default().assemble_file(&dir.path().join("missing.md")).is_err());
}

#[test]
fn clicked_links_split_into_local_and_external() {
    let base = Path::new("/notes");

    assert_eq!(
        LinkTarget::classify("sub/next.md#part", base),
        LinkTarget::Local(PathBuf::from("/notes/sub/next.md"))
    );
    assert!(matches!(
        LinkTarget::classify("https://example.com/x", base),
        LinkTarget::External(_)
    ));
}

// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with a [link](other.md) and $x^2$.\n\n- Bullet point\n  - Nested item\n- Another item\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n```mermaid\nflowchart TD\n  A[Start] --> B{Check}\n  B -->|yes| C[Done]\n```\n\n";
    base.repeat(size)
}

/// Library-shaped output for the flowchart in [`generate_markdown_content`].
#[allow(dead_code)]
pub const FLOWCHART_SVG: &str = r#"<svg><g class="root"><g class="edgePaths"><path d="M20,30L20,70" id="L-A-B-0" class="flowchart-link LS-A LE-B"></path><path d="M20,100L80,140" id="L-B-C-0" class="flowchart-link LS-B LE-C"></path></g><g class="edgeLabels"><g class="edgeLabel"><span class="edgeLabel">yes</span></g></g><g class="nodes"><g class="node default" id="flowchart-A-0"><rect x="0" y="0" width="40" height="30"></rect><text>Start</text></g><g class="node default" id="flowchart-B-1"><polygon points="20,70 40,85 20,100 0,85"></polygon><text>Check</text></g><g class="node default" id="flowchart-C-2"><rect x="60" y="140" width="40" height="30"></rect><text>Done</text></g></g></g></svg>"#;

//! Turns markdown into a complete, self-contained HTML page.
//!
//! ## Page Layout
//!
//! ```text
//! <head>   CSP (nonce-scoped scripts + pinned libraries), <base>, stylesheet,
//!          formula and diagram libraries
//! <body>   <main id="content"> rendered blocks </main>
//!          interaction.js   link hover/click, ctrl+wheel zoom, host callbacks
//!          pointing.js      pointer targets while pointing mode is on
//!          postload.js      formulas, then diagrams, then "rendered:"
//! ```
//!
//! Every call to [`Assembler::assemble`] mints a fresh nonce; the page's
//! inline scripts carry it and the policy allows nothing else inline.

mod svg;

pub use svg::inline_local_svgs;

use markdown_lineref_config::{AssetsSection, Config};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use url::Url;
use uuid::Uuid;

use crate::io::{IoError, RetryPolicy, read_markdown};
use crate::parsing::parse_document;
use crate::render::{RenderOptions, RendererRegistry, render_html};

const STYLE: &str = include_str!("../../assets/style.css");
const INTERACTION_JS: &str = include_str!("../../assets/interaction.js");
const POINTING_JS: &str = include_str!("../../assets/pointing.js");
const POSTLOAD_JS: &str = include_str!("../../assets/postload.js");

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("Cannot determine the directory containing {0}")]
    NoParent(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    pub html: String,
    /// Nonce shared by every inline script of this page.
    pub nonce: String,
}

#[derive(Debug, Clone)]
pub struct Assembler {
    options: RenderOptions,
    registry: RendererRegistry,
    assets: AssetsSection,
    retry: RetryPolicy,
    diagram_theme: String,
    pointing: bool,
    user_css: Option<String>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Assembler {
    /// Build from configuration. A configured stylesheet that cannot be read
    /// is logged and skipped.
    pub fn new(config: &Config) -> Self {
        let options = RenderOptions::from(&config.render);
        let user_css = config
            .user_stylesheet
            .as_ref()
            .and_then(|path| match fs::read_to_string(path) {
                Ok(css) => Some(css),
                Err(e) => {
                    log::warn!("ignoring stylesheet {}: {e}", path.display());
                    None
                }
            });

        Self {
            registry: RendererRegistry::for_options(&options),
            options,
            assets: config.assets.clone(),
            retry: RetryPolicy::from(&config.io),
            diagram_theme: config.view.diagram_theme.clone(),
            pointing: config.view.pointing_by_default,
            user_css,
        }
    }

    /// Replace the renderer set, e.g. with extra overrides installed.
    pub fn with_registry(mut self, registry: RendererRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    pub fn assemble(&self, markdown: &str, base_dir: &Path) -> AssembledDocument {
        let started = Instant::now();
        let doc = parse_document(markdown, &self.options.parse);
        let body = render_html(&doc, &self.registry, &self.options);
        let body = inline_local_svgs(&body, base_dir);

        let nonce = Uuid::new_v4().simple().to_string();
        let html = self.page(&body, &nonce, base_dir);
        log::debug!(
            "assembled {} blocks into {} bytes in {:?}",
            doc.blocks.len(),
            html.len(),
            started.elapsed()
        );
        AssembledDocument { html, nonce }
    }

    /// Read `path` (retrying brief locks) and assemble it against its own
    /// directory.
    pub fn assemble_file(&self, path: &Path) -> Result<AssembledDocument, AssembleError> {
        let markdown = read_markdown(path, &self.retry)?;
        let base_dir = path
            .parent()
            .ok_or_else(|| AssembleError::NoParent(path.to_path_buf()))?;
        Ok(self.assemble(&markdown, base_dir))
    }

    pub fn content_security_policy(&self, nonce: &str) -> String {
        let scripts = [&self.assets.katex_script, &self.assets.mermaid_script];
        let fonts: Vec<String> = [&self.assets.katex_stylesheet]
            .into_iter()
            .filter_map(|u| Url::parse(u).ok())
            .map(|u| u.origin().ascii_serialization())
            .collect();

        format!(
            "default-src 'none'; \
             script-src 'nonce-{nonce}' {scripts}; \
             style-src 'unsafe-inline' {stylesheet}; \
             img-src file: data: https: http:; \
             font-src data: {fonts}; \
             connect-src 'none'; \
             base-uri file:",
            scripts = scripts.map(String::as_str).join(" "),
            stylesheet = self.assets.katex_stylesheet,
            fonts = fonts.join(" "),
        )
    }

    fn page(&self, body: &str, nonce: &str, base_dir: &Path) -> String {
        let attr = |v: &str| html_escape::encode_double_quoted_attribute(v).into_owned();
        let mut html = String::with_capacity(body.len() + STYLE.len() + 16 * 1024);

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<meta http-equiv=\"Content-Security-Policy\" content=\"{}\">\n",
            attr(&self.content_security_policy(nonce))
        ));
        if let Some(href) = base_href(base_dir) {
            html.push_str(&format!("<base href=\"{}\">\n", attr(&href)));
        }

        html.push_str("<style>\n");
        html.push_str(STYLE);
        if let Some(css) = &self.user_css {
            html.push_str(css);
        }
        html.push_str("</style>\n");
        html.push_str(&format!(
            "<link rel=\"stylesheet\" href=\"{}\">\n",
            attr(&self.assets.katex_stylesheet)
        ));
        for src in [&self.assets.katex_script, &self.assets.mermaid_script] {
            html.push_str(&format!(
                "<script nonce=\"{nonce}\" src=\"{}\"></script>\n",
                attr(src)
            ));
        }
        html.push_str("</head>\n");

        html.push_str(&format!(
            "<body data-diagram-theme=\"{}\" data-pointing=\"{}\">\n<main id=\"content\">\n",
            attr(&self.diagram_theme),
            self.pointing
        ));
        html.push_str(body);
        html.push_str("</main>\n");
        for script in [INTERACTION_JS, POINTING_JS, POSTLOAD_JS] {
            html.push_str(&format!("<script nonce=\"{nonce}\">\n"));
            html.push_str(script);
            html.push_str("</script>\n");
        }
        html.push_str("</body>\n</html>\n");
        html
    }
}

/// `file://` URL of `base_dir` with a trailing slash, so relative links
/// resolve inside it.
fn base_href(base_dir: &Path) -> Option<String> {
    let absolute = std::path::absolute(base_dir).ok()?;
    Url::from_directory_path(absolute).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_dir, create_test_file};
    use markdown_lineref_markup as markup;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scripts_carry_the_nonce() {
        let page = Assembler::default().assemble("# Hi\n", Path::new("/notes"));

        let doc = markup::parse(&page.html);
        let scripts = doc.find_all(doc.root(), |e| e.is("script"));
        assert_eq!(scripts.len(), 5);
        for script in scripts {
            assert_eq!(doc.attr(script, "nonce"), Some(page.nonce.as_str()));
        }
        assert!(page.html.contains(&format!("'nonce-{}'", page.nonce)));
    }

    #[test]
    fn test_each_render_gets_a_fresh_nonce_and_is_otherwise_identical() {
        let assembler = Assembler::default();
        let md = "# Hi\n\n| a |\n|---|\n| 1 |\n\n```mermaid\npie\n\"A\" : 1\n```\n";

        let first = assembler.assemble(md, Path::new("/notes"));
        let second = assembler.assemble(md, Path::new("/notes"));

        assert_ne!(first.nonce, second.nonce);
        assert_eq!(
            first.html.replace(&first.nonce, "NONCE"),
            second.html.replace(&second.nonce, "NONCE")
        );
    }

    #[test]
    fn test_policy_only_allows_pinned_remote_scripts() {
        let assembler = Assembler::default();
        let csp = assembler.content_security_policy("abc");

        assert!(csp.starts_with("default-src 'none'; script-src 'nonce-abc' https://cdn.jsdelivr.net/npm/katex@"));
        assert!(csp.contains("mermaid@"));
        assert!(!csp.contains("unsafe-eval"));
        assert!(!csp.contains("script-src *"));
    }

    #[test]
    fn test_base_href_points_at_directory() {
        let page = Assembler::default().assemble("x\n", Path::new("/notes/project"));
        assert!(page.html.contains("<base href=\"file:///notes/project/\">"));
    }

    #[test]
    fn test_body_is_line_tracked_and_svgs_inlined() {
        let dir = create_test_dir();
        create_test_file(&dir, "pic.svg", "<svg viewBox=\"0 0 1 1\"></svg>");

        let page = Assembler::default().assemble("Intro\n\n![A picture](pic.svg)\n", dir.path());

        assert!(page.html.contains("<main id=\"content\">\n<p data-line=\"1\">Intro</p>"));
        assert!(page.html.contains("<p data-line=\"3\"><svg viewBox=\"0 0 1 1\" role=\"img\" aria-label=\"A picture\""));
    }

    #[test]
    fn test_assemble_file_uses_parent_directory() {
        let dir = create_test_dir();
        create_test_file(&dir, "docs/pic.svg", "<svg></svg>");
        let path = create_test_file(&dir, "docs/readme.md", "![p](pic.svg)\n");

        let page = Assembler::default().assemble_file(&path).unwrap();

        assert!(page.html.contains("<svg role=\"img\""));
    }

    #[test]
    fn test_missing_file_is_a_hard_failure() {
        let dir = create_test_dir();
        let err = Assembler::default()
            .assemble_file(&dir.path().join("gone.md"))
            .unwrap_err();
        assert!(matches!(err, AssembleError::Io(IoError::NotFound(_))));
    }

    #[test]
    fn test_user_stylesheet_and_view_settings() {
        let dir = create_test_dir();
        let css = create_test_file(&dir, "extra.css", "main { max-width: 40em; }");
        let mut config = Config::default();
        config.user_stylesheet = Some(css);
        config.view.pointing_by_default = true;
        config.view.diagram_theme = "dark".to_string();

        let page = Assembler::new(&config).assemble("x\n", dir.path());

        assert!(page.html.contains("main { max-width: 40em; }</style>"));
        assert!(page.html.contains("<body data-diagram-theme=\"dark\" data-pointing=\"true\">"));
    }
}

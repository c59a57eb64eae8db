//! Replace `<img>` references to local `.svg` files with the SVG markup
//! itself, so text and embedded fonts render and stay clickable.

use markdown_lineref_markup as markup;
use regex::{Captures, Regex};
use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

use crate::io::drive_path;

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("Invalid img regex"));

/// Inline every local SVG image in `html`. Remote, missing, unreadable or
/// malformed images keep their original `<img>` tag.
pub fn inline_local_svgs(html: &str, base_dir: &Path) -> String {
    IMG_TAG
        .replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            inline_one(tag, base_dir).unwrap_or_else(|| tag.to_string())
        })
        .into_owned()
}

fn inline_one(tag: &str, base_dir: &Path) -> Option<String> {
    let img_doc = markup::parse(tag);
    let img = img_doc.find(img_doc.root(), |e| e.is("img"))?;
    let path = local_svg_path(img_doc.attr(img, "src")?, base_dir)?;

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) => {
            log::debug!("leaving <img> for {}: {e}", path.display());
            return None;
        }
    };

    // Taking only the <svg> element drops any XML prolog, doctype or
    // leading comments.
    let mut doc = markup::parse(&source);
    let Some(svg) = doc.find(doc.root(), |e| e.is("svg")) else {
        log::debug!("leaving <img> for {}: no <svg> element", path.display());
        return None;
    };

    doc.set_attr(svg, "role", "img");
    let alt = img_doc.attr(img, "alt").map(str::trim).unwrap_or("");
    if !alt.is_empty() {
        doc.set_attr(svg, "aria-label", alt);
    }
    for dimension in ["width", "height"] {
        if let Some(value) = img_doc.attr(img, dimension) {
            doc.set_attr(svg, dimension, value);
        }
    }
    doc.add_class(svg, "inline-svg");

    Some(doc.outer_html(svg))
}

/// Resolve an image `src` to a local `.svg` path, or `None` for anything
/// remote or not an SVG.
fn local_svg_path(src: &str, base_dir: &Path) -> Option<PathBuf> {
    let src = src.trim();
    if src.starts_with("data:") || src.starts_with("//") {
        return None;
    }
    let without_suffix = src.split(['?', '#']).next().unwrap_or(src);

    let path = if let Some(path) = drive_path(without_suffix) {
        urlencoding::decode(without_suffix)
            .map(|p| PathBuf::from(p.as_ref()))
            .unwrap_or(path)
    } else if let Ok(url) = Url::parse(without_suffix) {
        if url.scheme() != "file" {
            return None;
        }
        url.to_file_path().ok()?
    } else {
        let decoded = urlencoding::decode(without_suffix).ok()?;
        let path = Path::new(decoded.as_ref());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            RelativePath::new(decoded.as_ref()).to_logical_path(base_dir)
        }
    };

    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
        .then_some(path)
}

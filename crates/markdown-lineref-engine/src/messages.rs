//! Messages from a rendered document to its host.
//!
//! The wire format is a single string `"<tag>:<payload>"`, posted by the
//! page scripts and decoded here. [`HostMessage`] round-trips through
//! `Display`/`FromStr` so the host can match on a typed value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

use crate::io::drive_path;

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Message has no tag separator: {0:?}")]
    Malformed(String),
    #[error("Unknown message tag: {0:?}")]
    UnknownTag(String),
    #[error("Invalid zoom direction: {0:?}")]
    InvalidZoom(String),
    #[error("Invalid point payload: {0:?}")]
    InvalidPoint(String),
    #[error("Invalid element path: {0:?}")]
    InvalidPath(String),
    #[error("Invalid diagram payload: {0:?}")]
    InvalidDiagram(String),
    #[error("Invalid wheel payload: {0:?}")]
    InvalidWheel(String),
    #[error("Invalid render error report: {0}")]
    InvalidErrorReport(#[from] serde_json::Error),
}

/// The library that failed while rendering part of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engine {
    KaTeX,
    Mermaid,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::KaTeX => f.write_str("KaTeX"),
            Engine::Mermaid => f.write_str("Mermaid"),
        }
    }
}

/// A formula or diagram that failed to render.
///
/// `line` is `None` when no `data-line` could be found for the failing
/// element; it displays as `?`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderError {
    pub engine: Engine,
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{} Line {}] {}", self.engine, line, self.message),
            None => write!(f, "[{} Line ?] {}", self.engine, self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zoom {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMessage {
    /// Pointer entered a link.
    Hover(String),
    /// Pointer left a link.
    Leave,
    Click(String),
    Zoom(Zoom),
    /// Pointing mode resolved an element. The host copies both parts to the
    /// clipboard.
    Point {
        line: Option<usize>,
        description: String,
    },
    /// Every formula and diagram has finished; carries the formatted errors.
    RenderComplete(Vec<String>),
}

impl HostMessage {
    pub fn tag(&self) -> &'static str {
        match self {
            HostMessage::Hover(_) => "hover",
            HostMessage::Leave => "leave",
            HostMessage::Click(_) => "click",
            HostMessage::Zoom(_) => "zoom",
            HostMessage::Point { .. } => "point",
            HostMessage::RenderComplete(_) => "render-complete",
        }
    }

    pub fn render_complete(errors: &[RenderError]) -> Self {
        HostMessage::RenderComplete(errors.iter().map(ToString::to_string).collect())
    }
}

impl fmt::Display for HostMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.tag())?;
        match self {
            HostMessage::Hover(url) | HostMessage::Click(url) => f.write_str(url),
            HostMessage::Leave => Ok(()),
            HostMessage::Zoom(Zoom::In) => f.write_str("in"),
            HostMessage::Zoom(Zoom::Out) => f.write_str("out"),
            HostMessage::Point { line, description } => match line {
                Some(line) => write!(f, "{line}|{description}"),
                None => write!(f, "?|{description}"),
            },
            HostMessage::RenderComplete(errors) => {
                let json = serde_json::to_string(errors).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl FromStr for HostMessage {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, payload) = s
            .split_once(':')
            .ok_or_else(|| MessageError::Malformed(s.to_string()))?;

        match tag {
            "hover" => Ok(HostMessage::Hover(payload.to_string())),
            "leave" => Ok(HostMessage::Leave),
            "click" => Ok(HostMessage::Click(payload.to_string())),
            "zoom" => match payload {
                "in" => Ok(HostMessage::Zoom(Zoom::In)),
                "out" => Ok(HostMessage::Zoom(Zoom::Out)),
                other => Err(MessageError::InvalidZoom(other.to_string())),
            },
            "point" => {
                let (line, description) = payload
                    .split_once('|')
                    .ok_or_else(|| MessageError::InvalidPoint(payload.to_string()))?;
                let line = match line {
                    "?" => None,
                    n => Some(
                        n.parse()
                            .map_err(|_| MessageError::InvalidPoint(payload.to_string()))?,
                    ),
                };
                Ok(HostMessage::Point {
                    line,
                    description: description.to_string(),
                })
            }
            "render-complete" => Ok(HostMessage::RenderComplete(serde_json::from_str(payload)?)),
            other => Err(MessageError::UnknownTag(other.to_string())),
        }
    }
}

/// Where a clicked link should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// A file on disk; the host opens it as a new document.
    Local(PathBuf),
    /// Anything with a non-file scheme; the host opens it externally.
    External(Url),
}

impl LinkTarget {
    /// Classify a `click:` payload. Relative references resolve against
    /// `base_dir`, and any `#fragment` or `?query` is dropped from local paths.
    pub fn classify(href: &str, base_dir: &Path) -> Self {
        let path = href.split(['#', '?']).next().unwrap_or(href);
        let decoded = urlencoding::decode(path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| path.to_string());

        if let Some(drive) = drive_path(&decoded) {
            return LinkTarget::Local(drive);
        }
        if let Ok(url) = Url::parse(href) {
            if url.scheme() != "file" {
                return LinkTarget::External(url);
            }
            if let Ok(path) = url.to_file_path() {
                return LinkTarget::Local(path);
            }
        }
        LinkTarget::Local(base_dir.join(decoded))
    }
}

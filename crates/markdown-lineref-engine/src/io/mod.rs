use markdown_lineref_config::IoSection;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

static DRIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("Invalid drive path regex"));

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read {path} after {attempts} attempt(s): {source}")]
    Read {
        path: PathBuf,
        attempts: u32,
        source: io::Error,
    },
}

/// How hard to try when a file is briefly locked by another process
/// (an editor mid-save, a sync client).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; zero is treated as one.
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(50),
        }
    }
}

impl From<&IoSection> for RetryPolicy {
    fn from(section: &IoSection) -> Self {
        Self {
            attempts: section.read_attempts,
            delay: Duration::from_millis(section.retry_delay_ms),
        }
    }
}

/// Read a markdown file, retrying transient failures.
pub fn read_markdown(path: &Path, policy: &RetryPolicy) -> Result<String, IoError> {
    read_with_retry(path, policy, |p| fs::read_to_string(p))
}

fn read_with_retry<F>(path: &Path, policy: &RetryPolicy, mut read: F) -> Result<String, IoError>
where
    F: FnMut(&Path) -> io::Result<String>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match read(path) {
            Ok(content) => return Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IoError::NotFound(path.to_path_buf()));
            }
            Err(e) if attempt < attempts && is_transient(&e) => {
                log::debug!(
                    "read of {} failed ({e}), retrying ({attempt}/{attempts})",
                    path.display()
                );
                thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(source) => {
                log::warn!("giving up on {} after {attempt} attempt(s)", path.display());
                return Err(IoError::Read {
                    path: path.to_path_buf(),
                    attempts: attempt,
                    source,
                });
            }
        }
    }
}

/// `C:/notes/a.md` or `C:\img\a.svg` as a path. URL parsing would take the
/// drive letter for a scheme.
pub(crate) fn drive_path(reference: &str) -> Option<PathBuf> {
    DRIVE_PATH
        .is_match(reference)
        .then(|| PathBuf::from(reference))
}

/// Lock contention shows up as one of these depending on the platform.
fn is_transient(err: &io::Error) -> bool {
    #[cfg(windows)]
    {
        // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
        if matches!(err.raw_os_error(), Some(32) | Some(33)) {
            return true;
        }
    }
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::Interrupted
            | io::ErrorKind::TimedOut
            | io::ErrorKind::ResourceBusy
    )
}

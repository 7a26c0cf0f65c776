//! Collector for per-file problems.
//!
//! Every issue is logged through `tracing` and kept, so a caller can count
//! or inspect what was skipped once the build returns.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::{FileNameError, LongNameError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Filename does not follow the time-series convention.
    FileName(FileNameError),
    /// `long_name` could not be read for the file's variable.
    LongName(LongNameError),
    /// Another file of the same (component, variable) already failed its
    /// `long_name` read; the error names that file.
    LongNameInherited(LongNameError),
    /// Path below the archive root is not valid UTF-8, so it cannot be
    /// written to the catalog.
    NonUtf8Path,
    /// File sits directly in the archive root, so it has no component.
    NotInComponent,
    /// Directory entry that could not be read during the walk.
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub path: PathBuf,
    pub kind: IssueKind,
}

/// Thread-safe sink for [`Issue`]s. Shared by reference across the build.
#[derive(Debug, Default)]
pub struct Diagnostics {
    issues: Mutex<Vec<Issue>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, path: &Path, kind: IssueKind) {
        match &kind {
            IssueKind::FileName(e)    => warn!(path = %path.display(), "skipping: {e}"),
            IssueKind::LongName(e)    => warn!(path = %path.display(), "skipping: {e}"),
            IssueKind::LongNameInherited(e) => {
                warn!(path = %path.display(), "skipping: long_name lookup for this variable already failed ({e})")
            }
            IssueKind::NonUtf8Path    => warn!(path = %path.display(), "skipping: path is not valid UTF-8"),
            IssueKind::NotInComponent => warn!(path = %path.display(), "skipping: not inside a component directory"),
            IssueKind::Unreadable(e)  => warn!(path = %path.display(), "skipping unreadable entry: {e}"),
        }
        self.lock().push(Issue { path: path.to_path_buf(), kind });
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of everything reported so far, in report order.
    pub fn issues(&self) -> Vec<Issue> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Issue>> {
        // a panic while holding the lock leaves the Vec intact
        self.issues.lock().unwrap_or_else(|p| p.into_inner())
    }
}

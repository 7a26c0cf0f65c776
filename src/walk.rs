//! Discover candidate output files under an archive root.

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::CatalogError;
use crate::report::{Diagnostics, IssueKind};

/// Directory under the archive root that holds the catalog itself.
pub const INTAKE_DIR: &str = "intake";

/// A matched file, as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path:     PathBuf, // archive_root joined with `relative`
    pub relative: PathBuf,
}

impl Candidate {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|s| s.to_str())
    }

    /// First directory below the archive root, i.e. the component.
    pub fn component(&self) -> Option<&str> {
        let mut parts = self.relative.components();
        let first = parts.next()?;
        // a bare file name has nothing after it
        parts.next()?;
        first.as_os_str().to_str()
    }
}

/// `<case>*.<ext>`, with the case name taken literally.
pub fn file_pattern(case: &str, extension: &str) -> Result<Pattern, CatalogError> {
    Ok(Pattern::new(&format!("{}*.{}", Pattern::escape(case), Pattern::escape(extension)))?)
}

/// Recursively list files under `root` whose name matches `pattern`,
/// sorted by path. `intake/` is skipped. Unreadable entries below the root
/// go to `diag`; an unreadable root is fatal.
pub fn discover(root: &Path, pattern: &Pattern, diag: &Diagnostics) -> Result<Vec<Candidate>, CatalogError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_type().is_dir() && e.file_name() == INTAKE_DIR));

    let mut out = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) if err.depth() == 0 => {
                return Err(CatalogError::Walk { root: root.to_path_buf(), source: err });
            }
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                diag.report(&path, IssueKind::Unreadable(err.to_string()));
                continue;
            }
        };
        // file links count as files; directory links are never descended
        let is_file = if entry.path_is_symlink() {
            entry.path().is_file()
        } else {
            entry.file_type().is_file()
        };
        if !is_file {
            continue;
        }
        let matched = entry.file_name().to_str().is_some_and(|n| pattern.matches(n));
        if !matched {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(r) => r.to_path_buf(),
            Err(_) => continue,
        };
        debug!(path = %entry.path().display(), "found");
        out.push(Candidate { path: entry.path().to_path_buf(), relative });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, b"").unwrap();
    }

    #[test]
    fn finds_matching_files_in_sorted_order() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(root, "ocn/CASE1.pop.h.SST.0001-0010.nc");
        touch(root, "atm/proc/tseries/CASE1.cam.h0.TS.0001-0010.nc");
        touch(root, "atm/CASE1.cam.h0.TS.0001-0010.txt");
        touch(root, "atm/OTHER.cam.h0.TS.0001-0010.nc");
        touch(root, "intake/CASE1.old.nc");

        let diag = Diagnostics::new();
        let pattern = file_pattern("CASE1", "nc").unwrap();
        let found = discover(root, &pattern, &diag).unwrap();
        let rel: Vec<_> = found.iter().map(|c| c.relative.clone()).collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("atm/proc/tseries/CASE1.cam.h0.TS.0001-0010.nc"),
                PathBuf::from("ocn/CASE1.pop.h.SST.0001-0010.nc"),
            ]
        );
        assert_eq!(found[0].component(), Some("atm"));
        assert!(diag.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_kept_but_linked_dirs_are_not_walked() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let store = tmp.path().join("store");
        touch(&store, "CASE1.cam.h0.TS.0001-0010.nc");
        touch(&store, "hist/CASE1.cam.h0.Q.0001-0010.nc");

        let root = tmp.path().join("archive");
        touch(&root, "atm/CASE1.cam.h0.PRECT.0001-0010.nc");
        symlink(store.join("CASE1.cam.h0.TS.0001-0010.nc"), root.join("atm/CASE1.cam.h0.TS.0001-0010.nc")).unwrap();
        symlink(store.join("hist"), root.join("atm/hist")).unwrap();
        symlink(store.join("gone.nc"), root.join("atm/CASE1.cam.h0.U.0001-0010.nc")).unwrap();

        let diag = Diagnostics::new();
        let pattern = file_pattern("CASE1", "nc").unwrap();
        let found = discover(&root, &pattern, &diag).unwrap();
        let rel: Vec<_> = found.iter().map(|c| c.relative.clone()).collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("atm/CASE1.cam.h0.PRECT.0001-0010.nc"),
                PathBuf::from("atm/CASE1.cam.h0.TS.0001-0010.nc"),
            ]
        );
    }

    #[test]
    fn case_name_is_not_a_glob() {
        let pattern = file_pattern("run[1]", "nc").unwrap();
        assert!(pattern.matches("run[1].atm.TS.1-2.nc"));
        assert!(!pattern.matches("run1.atm.TS.1-2.nc"));
    }

    #[test]
    fn root_level_file_has_no_component() {
        let c = Candidate { path: PathBuf::from("/a/CASE.x.nc"), relative: PathBuf::from("CASE.x.nc") };
        assert_eq!(c.component(), None);
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let pattern = file_pattern("CASE1", "nc").unwrap();
        let err = discover(&tmp.path().join("nope"), &pattern, &Diagnostics::new()).unwrap_err();
        assert!(matches!(err, CatalogError::Walk { .. }));
    }
}

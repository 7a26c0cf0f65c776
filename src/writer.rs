//! gzip'd CSV output.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;

use crate::catalog::{CatalogEntry, COLUMNS};
use crate::error::CatalogError;
use crate::walk::INTAKE_DIR;

pub const CATALOG_FILE: &str = "cesm_catalog.csv.gz";

/// `<root>/intake/cesm_catalog.csv.gz`
pub fn catalog_path(root: &Path) -> PathBuf {
    root.join(INTAKE_DIR).join(CATALOG_FILE)
}

/// Write `rows` (header first) as gzip'd CSV to `w`.
pub fn write_rows<W: Write>(w: W, rows: &[CatalogEntry]) -> csv::Result<W> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(GzEncoder::new(w, Compression::default()));
    // header written by hand so an empty catalog still has one
    wtr.write_record(COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    let gz = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(gz.finish()?)
}

/// I/O failures name the catalog file; encoding failures stay CSV errors.
fn write_error(path: &Path, err: csv::Error) -> CatalogError {
    if !err.is_io_error() {
        return CatalogError::Csv(err);
    }
    let source = match err.into_kind() {
        csv::ErrorKind::Io(e) => e,
        other => std::io::Error::other(format!("{other:?}")),
    };
    CatalogError::Write { path: path.to_path_buf(), source }
}

/// Write the catalog for `root`, creating `intake/` if needed. The file
/// only appears once it is complete.
pub fn write_catalog(root: &Path, rows: &[CatalogEntry]) -> Result<PathBuf, CatalogError> {
    let dir = root.join(INTAKE_DIR);
    let out = catalog_path(root);
    let io_err = |source: std::io::Error| CatalogError::Write { path: out.clone(), source };

    fs::create_dir_all(&dir).map_err(io_err)?;
    let tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
    let tmp = write_rows(tmp, rows).map_err(|e| write_error(&out, e))?;
    tmp.persist(&out).map_err(|e| io_err(e.error))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn row(variable: &str) -> CatalogEntry {
        CatalogEntry {
            case:               "CASE1".into(),
            component:          "atm".into(),
            stream:             "atm.h0".into(),
            variable:           variable.into(),
            long_name:          format!("{variable}, long"),
            start_date:         "1850".into(),
            end_date:           "1860".into(),
            path:               format!("../atm/CASE1.atm.h0.{variable}.1850-1860.nc"),
            parent_branch_year: "-1".into(),
            child_branch_year:  "-1".into(),
            parent_case:        "-".into(),
        }
    }

    fn gunzip(bytes: &[u8]) -> String {
        let mut s = String::new();
        GzDecoder::new(bytes).read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn header_then_rows_in_column_order() {
        let bytes = write_rows(Vec::new(), &[row("TS"), row("PRECT")]).unwrap();
        let text = gunzip(&bytes);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "case,component,stream,variable,long_name,start_date,end_date,path,parent_branch_year,child_branch_year,parent_case");
        assert_eq!(lines[1], "CASE1,atm,atm.h0,TS,\"TS, long\",1850,1860,../atm/CASE1.atm.h0.TS.1850-1860.nc,-1,-1,-");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_catalog_keeps_header() {
        let text = gunzip(&write_rows(Vec::new(), &[]).unwrap());
        assert_eq!(text.trim_end(), COLUMNS.join(","));
    }

    #[derive(Debug)]
    struct Full;

    impl Write for Full {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_failure_names_the_catalog_file() {
        let err = write_rows(Full, &[row("TS")]).unwrap_err();
        assert!(err.is_io_error());

        let path = Path::new("/archive/intake").join(CATALOG_FILE);
        match write_error(&path, err) {
            CatalogError::Write { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected a write error, got {other:?}"),
        }
    }

    #[test]
    fn creates_intake_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = write_catalog(tmp.path(), &[row("TS")]).unwrap();
        assert_eq!(out, tmp.path().join("intake").join(CATALOG_FILE));
        let text = gunzip(&fs::read(&out).unwrap());
        assert_eq!(text.lines().count(), 2);
        // no leftover temp files
        assert_eq!(fs::read_dir(tmp.path().join("intake")).unwrap().count(), 1);
    }
}

//! DISCOVER CASE CONTEXT → LOCATE DATA ROOT → WALK + PARSE + ENRICH → SERIALIZE

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::catalog::Assembler;
use crate::context::{CaseContextProvider, DataRoot};
use crate::error::CatalogError;
use crate::long_name::LongNameSource;
use crate::report::Diagnostics;
use crate::walk::{discover, file_pattern};
use crate::writer::write_catalog;

/// Knobs that are not part of the case itself.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Extension of the files to catalog, without the dot.
    pub extension: String,
    /// Parse and read metadata on the rayon pool.
    pub parallel:  bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { extension: "nc".to_string(), parallel: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub catalog:         PathBuf,
    pub rows:            usize,
    pub skipped:         usize,
    pub long_names_read: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Written(BuildSummary),
    /// Only time-slice output exists; nothing is written for it.
    TimeSliceUnsupported(PathBuf),
}

/// Run one catalog build end to end.
///
/// Fatal problems come back as `Err`; per-file problems land in `diag`
/// and only shrink the catalog.
pub fn build_catalog<P, S>(
    provider: &P,
    source:   &S,
    options:  &BuildOptions,
    diag:     &Diagnostics,
) -> Result<BuildOutcome, CatalogError>
where
    P: CaseContextProvider + ?Sized,
    S: LongNameSource + ?Sized,
{
    let t0 = Instant::now();
    let ctx = provider.case_context()?;

    let root = match ctx.data_root()? {
        DataRoot::TimeSeries(root) => root,
        DataRoot::TimeSlice(root) => {
            warn!(root = %root.display(), "only time-slice output found; it is not cataloged");
            return Ok(BuildOutcome::TimeSliceUnsupported(root));
        }
    };
    info!(root = %root.display(), case = %ctx.run.case, "will catalog files");

    let before = diag.len();
    let pattern = file_pattern(&ctx.run.case, &options.extension)?;
    let files = discover(&root, &pattern, diag)?;
    info!(found = files.len(), "matched files");

    let assembler = Assembler::new(&ctx.run, source, diag);
    let rows = assembler.assemble(&files, options.parallel);

    let catalog = write_catalog(&root, &rows)?;
    let summary = BuildSummary {
        catalog,
        rows:            rows.len(),
        skipped:         diag.len() - before,
        long_names_read: assembler.long_names_read(),
    };
    info!(
        catalog = %summary.catalog.display(),
        rows = summary.rows,
        skipped = summary.skipped,
        long_names = summary.long_names_read,
        elapsed = ?t0.elapsed(),
        "created catalog"
    );
    Ok(BuildOutcome::Written(summary))
}

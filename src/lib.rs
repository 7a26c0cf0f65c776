//! Build an intake-esm catalog (`intake/cesm_catalog.csv.gz`) of a CESM
//! case's time-series output.

pub mod catalog;
pub mod context;
pub mod error;
pub mod filename;
pub mod long_name;
pub mod pipeline;
pub mod report;
pub mod walk;
pub mod writer;

pub use catalog::{CatalogEntry, Lineage, COLUMNS};
pub use context::{CaseContext, CaseContextProvider, CimeCase, FixtureCase, RunConfig};
pub use error::{CatalogError, ContextError, FileNameError, LongNameError};
pub use long_name::{LongNameSource, LookupError, NetcdfLongNames};
pub use pipeline::{build_catalog, BuildOptions, BuildOutcome, BuildSummary};
pub use report::{Diagnostics, Issue, IssueKind};
pub use writer::CATALOG_FILE;

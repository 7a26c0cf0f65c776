//! Catalog rows and how they are assembled from discovered files.

use rayon::prelude::*;
use serde::Serialize;

use crate::context::RunConfig;
use crate::filename::parse_file_name;
use crate::long_name::{LongNameCache, LongNameSource, LookupError};
use crate::report::{Diagnostics, IssueKind};
use crate::walk::Candidate;

/// Catalog columns, in output order.
pub const COLUMNS: [&str; 11] = [
    "case",
    "component",
    "stream",
    "variable",
    "long_name",
    "start_date",
    "end_date",
    "path",
    "parent_branch_year",
    "child_branch_year",
    "parent_case",
];

pub const NO_PARENT_CASE: &str = "-";
pub const NO_BRANCH_YEAR: &str = "-1";

/// One row of the catalog. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub case:               String,
    pub component:          String,
    pub stream:             String,
    pub variable:           String,
    pub long_name:          String,
    pub start_date:         String,
    pub end_date:           String,
    /// Relative to the `intake/` directory holding the catalog.
    pub path:               String,
    pub parent_branch_year: String,
    pub child_branch_year:  String,
    pub parent_case:        String,
}

/// Parent-case fields shared by every row of one catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    pub parent_case:        String,
    pub parent_branch_year: String,
    pub child_branch_year:  String,
}

impl Lineage {
    pub fn from_run(run: &RunConfig) -> Self {
        if run.get_refcase {
            Self {
                parent_case:        run.run_refcase.clone(),
                parent_branch_year: run.run_refdate.clone(),
                child_branch_year:  run.run_startdate.clone(),
            }
        } else {
            Self::none()
        }
    }

    pub fn none() -> Self {
        Self {
            parent_case:        NO_PARENT_CASE.to_string(),
            parent_branch_year: NO_BRANCH_YEAR.to_string(),
            child_branch_year:  NO_BRANCH_YEAR.to_string(),
        }
    }
}

/// Turns discovered files into rows for one case.
pub struct Assembler<'a, S: LongNameSource + ?Sized> {
    case:    &'a str,
    lineage: Lineage,
    names:   LongNameCache<'a, S>,
    diag:    &'a Diagnostics,
}

impl<'a, S: LongNameSource + ?Sized> Assembler<'a, S> {
    pub fn new(run: &'a RunConfig, source: &'a S, diag: &'a Diagnostics) -> Self {
        Self {
            case:    &run.case,
            lineage: Lineage::from_run(run),
            names:   LongNameCache::new(source),
            diag,
        }
    }

    /// Rows for `files`, in the same order. Files that fail are reported
    /// and left out.
    pub fn assemble(&self, files: &[Candidate], parallel: bool) -> Vec<CatalogEntry> {
        if parallel {
            files.par_iter().filter_map(|c| self.entry(c)).collect()
        } else {
            files.iter().filter_map(|c| self.entry(c)).collect()
        }
    }

    /// Distinct (component, variable) pairs looked up so far.
    pub fn long_names_read(&self) -> usize {
        self.names.len()
    }

    fn entry(&self, file: &Candidate) -> Option<CatalogEntry> {
        let Some(relative) = file.relative.to_str() else {
            self.diag.report(&file.path, IssueKind::NonUtf8Path);
            return None;
        };
        let (Some(name), Some(component)) = (file.file_name(), file.component()) else {
            self.diag.report(&file.path, IssueKind::NotInComponent);
            return None;
        };

        let parsed = match parse_file_name(name, self.case) {
            Ok(p) => p,
            Err(e) => {
                self.diag.report(&file.path, IssueKind::FileName(e));
                return None;
            }
        };

        let long_name = match self.names.get(component, &parsed.variable, &file.path) {
            Ok(l) => l,
            Err(LookupError::Read(e)) => {
                self.diag.report(&file.path, IssueKind::LongName(e));
                return None;
            }
            Err(LookupError::Cached(e)) => {
                self.diag.report(&file.path, IssueKind::LongNameInherited(e));
                return None;
            }
        };

        Some(CatalogEntry {
            case:               self.case.to_string(),
            component:          component.to_string(),
            stream:             parsed.stream,
            variable:           parsed.variable,
            long_name,
            start_date:         parsed.start_date,
            end_date:           parsed.end_date,
            path:               format!("..{}{relative}", std::path::MAIN_SEPARATOR),
            parent_branch_year: self.lineage.parent_branch_year.clone(),
            child_branch_year:  self.lineage.child_branch_year.clone(),
            parent_case:        self.lineage.parent_case.clone(),
        })
    }
}

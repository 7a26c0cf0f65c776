//! Run configuration and where it comes from.
//!
//! The build only ever sees a [`CaseContext`]; how it was obtained (a CIME
//! case directory, a TOML fixture) is hidden behind [`CaseContextProvider`].

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use crate::error::{ContextError, FixtureError};

/// Case settings threaded read-only through one build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    pub case: String,
    /// Case was branched or hybrid-started from a reference case.
    #[serde(default, deserialize_with = "cime_bool")]
    pub get_refcase: bool,
    #[serde(default)]
    pub run_refcase: String,
    #[serde(default)]
    pub run_refdate: String,
    #[serde(default)]
    pub run_startdate: String,
}

/// Everything the catalog build needs to know about a case.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaseContext {
    #[serde(flatten)]
    pub run: RunConfig,
    /// Short-term archive (time-slice output), if archiving is on.
    #[serde(default)]
    pub dout_s_root: Option<PathBuf>,
    /// Post-processed time-series output.
    #[serde(default)]
    pub timeseries_root: Option<PathBuf>,
}

/// Which kind of output the catalog will be built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataRoot {
    TimeSeries(PathBuf),
    TimeSlice(PathBuf),
}

impl CaseContext {
    /// Time-series output wins over time-slice output.
    pub fn data_root(&self) -> Result<DataRoot, ContextError> {
        match (&self.timeseries_root, &self.dout_s_root) {
            (Some(ts), _)   => Ok(DataRoot::TimeSeries(ts.clone())),
            (None, Some(s)) => Ok(DataRoot::TimeSlice(s.clone())),
            (None, None)    => Err(ContextError::NoDataRoot(self.run.case.clone())),
        }
    }
}

pub trait CaseContextProvider {
    fn case_context(&self) -> Result<CaseContext, ContextError>;
}

// ─────────────────────────────────────────────────────────────────────
// CIME case directory
// ─────────────────────────────────────────────────────────────────────

/// Queries a CIME case through its `xmlquery` (and, when post-processing
/// is set up, `postprocess/pp_config`) scripts.
#[derive(Debug, Clone)]
pub struct CimeCase {
    caseroot: PathBuf,
}

impl CimeCase {
    pub fn new(caseroot: impl Into<PathBuf>) -> Self {
        Self { caseroot: normalize_caseroot(caseroot.into()) }
    }

    pub fn caseroot(&self) -> &Path {
        &self.caseroot
    }

    fn xmlquery(&self, var: &'static str) -> Result<Option<String>, ContextError> {
        run_query(&self.caseroot, "xmlquery", &["--value", var])
    }

    fn required(&self, var: &'static str) -> Result<String, ContextError> {
        self.xmlquery(var)?.ok_or(ContextError::MissingValue(var))
    }
}

impl CaseContextProvider for CimeCase {
    fn case_context(&self) -> Result<CaseContext, ContextError> {
        if !self.caseroot.is_dir() {
            return Err(ContextError::CaseRootMissing(self.caseroot.clone()));
        }
        if !self.caseroot.join("xmlquery").is_file() {
            return Err(ContextError::XmlQueryMissing(self.caseroot.clone()));
        }

        let run = RunConfig {
            case:          self.required("CASE")?,
            get_refcase:   self.xmlquery("GET_REFCASE")?.is_some_and(|v| is_cime_true(&v)),
            run_refcase:   self.xmlquery("RUN_REFCASE")?.unwrap_or_default(),
            run_refdate:   self.xmlquery("RUN_REFDATE")?.unwrap_or_default(),
            run_startdate: self.xmlquery("RUN_STARTDATE")?.unwrap_or_default(),
        };

        let dout_s_root = if self.xmlquery("DOUT_S")?.is_some_and(|v| is_cime_true(&v)) {
            self.xmlquery("DOUT_S_ROOT")?.map(PathBuf::from)
        } else {
            None
        };

        let pp_dir = self.caseroot.join("postprocess");
        let timeseries_root = if pp_dir.is_dir() {
            run_query(&pp_dir, "pp_config", &["--value", "--get", "TIMESERIES_OUTPUT_ROOTDIR"])?
                .map(PathBuf::from)
        } else {
            None
        };

        info!(case = %run.case, caseroot = %self.caseroot.display(), "read case context");
        Ok(CaseContext { run, dout_s_root, timeseries_root })
    }
}

/// Run the script `dir/program args..` from `dir`; trimmed stdout, `None`
/// when empty.
fn run_query(dir: &Path, program: &str, args: &[&str]) -> Result<Option<String>, ContextError> {
    let command = format!("./{program} {}", args.join(" "));
    debug!(dir = %dir.display(), %command, "querying case");
    let fail = |reason: String| ContextError::Query { command: command.clone(), dir: dir.to_path_buf(), reason };

    // absolute, so resolution does not depend on which cwd the platform uses
    let script = dir.join(program).canonicalize().map_err(|e| fail(e.to_string()))?;
    let out = Command::new(script)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| fail(e.to_string()))?;
    if !out.status.success() {
        return Err(fail(format!("{}: {}", out.status, String::from_utf8_lossy(&out.stderr).trim())));
    }
    let value = String::from_utf8_lossy(&out.stdout).trim().to_string();
    Ok((!value.is_empty()).then_some(value))
}

fn normalize_caseroot(p: PathBuf) -> PathBuf {
    let s = p.to_string_lossy();
    let trimmed = s.trim_end_matches('/');
    if trimmed.is_empty() && !s.is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(trimmed)
    }
}

fn is_cime_true(v: &str) -> bool {
    v.trim().eq_ignore_ascii_case("true")
}

fn cime_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }
    Ok(match Flag::deserialize(d)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => is_cime_true(&s),
    })
}

// ─────────────────────────────────────────────────────────────────────
// TOML fixture
// ─────────────────────────────────────────────────────────────────────

/// A case context written down in a TOML file, for sites without CIME
/// and for tests.
///
/// ```toml
/// case = "CASE1"
/// get_refcase = "TRUE"
/// run_refcase = "PARENT"
/// run_refdate = "0101-01-01"
/// run_startdate = "0001-01-01"
/// timeseries_root = "/glade/scratch/me/archive/CASE1"
/// ```
#[derive(Debug, Clone)]
pub struct FixtureCase {
    path: PathBuf,
}

impl FixtureCase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse(text: &str) -> Result<CaseContext, toml::de::Error> {
        toml::from_str(text)
    }
}

impl CaseContextProvider for FixtureCase {
    fn case_context(&self) -> Result<CaseContext, ContextError> {
        let wrap = |source: FixtureError| ContextError::Fixture { path: self.path.clone(), source };
        let text = fs::read_to_string(&self.path).map_err(|e| wrap(e.into()))?;
        Self::parse(&text).map_err(|e| wrap(e.into()))
    }
}

impl CaseContextProvider for CaseContext {
    fn case_context(&self) -> Result<CaseContext, ContextError> {
        Ok(self.clone())
    }
}

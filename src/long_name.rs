//! Descriptive labels for variables, read from file metadata at most once
//! per (component, variable).

use std::path::Path;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::debug;

use crate::error::LongNameError;

pub const LONG_NAME_ATTR: &str = "long_name";

/// Where a variable's `long_name` comes from.
pub trait LongNameSource: Sync {
    fn read_long_name(&self, path: &Path, variable: &str) -> Result<String, LongNameError>;
}

/// Reads the attribute straight from a netCDF file. The file is closed
/// before returning.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetcdfLongNames;

#[cfg(feature = "netcdf")]
impl LongNameSource for NetcdfLongNames {
    fn read_long_name(&self, path: &Path, variable: &str) -> Result<String, LongNameError> {
        let file = netcdf::open(path).map_err(|e| LongNameError::Open {
            path:   path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let var = file.variable(variable).ok_or_else(|| LongNameError::MissingVariable {
            path:     path.to_path_buf(),
            variable: variable.to_string(),
        })?;
        let attr = var.attribute(LONG_NAME_ATTR).ok_or_else(|| LongNameError::MissingAttribute {
            path:     path.to_path_buf(),
            variable: variable.to_string(),
        })?;
        match attr.value() {
            Ok(netcdf::AttributeValue::Str(s)) => Ok(s),
            Ok(netcdf::AttributeValue::Strs(v)) if !v.is_empty() => Ok(v.join(" ")),
            _ => Err(LongNameError::NotText { path: path.to_path_buf(), variable: variable.to_string() }),
        }
    }
}

#[cfg(not(feature = "netcdf"))]
impl LongNameSource for NetcdfLongNames {
    fn read_long_name(&self, _path: &Path, _variable: &str) -> Result<String, LongNameError> {
        Err(LongNameError::Unsupported)
    }
}

type Slot = Arc<OnceLock<Result<String, LongNameError>>>;

/// A failed lookup, split by whether this call did the read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// This call read the file and it failed.
    Read(LongNameError),
    /// An earlier read for the same (component, variable) failed; the
    /// error names that earlier file.
    Cached(LongNameError),
}

/// Memoizing cache keyed by (component, variable).
///
/// The slot for a key is created under the map's shard lock, but the read
/// itself runs outside it, inside the slot's `OnceLock`. Concurrent callers
/// for the same key block on that slot and see the same result, success or
/// failure.
pub struct LongNameCache<'a, S: LongNameSource + ?Sized> {
    source: &'a S,
    slots:  DashMap<(String, String), Slot>,
}

impl<'a, S: LongNameSource + ?Sized> LongNameCache<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source, slots: DashMap::new() }
    }

    /// Label for `variable` in `component`, reading `path` on first use.
    pub fn get(&self, component: &str, variable: &str, path: &Path) -> Result<String, LookupError> {
        let slot: Slot = self
            .slots
            .entry((component.to_string(), variable.to_string()))
            .or_default()
            .clone();
        let mut read_here = false;
        let result = slot.get_or_init(|| {
            read_here = true;
            debug!(component, variable, path = %path.display(), "reading long_name");
            self.source.read_long_name(path, variable)
        });
        match result {
            Ok(label) => Ok(label.clone()),
            Err(e) if read_here => Err(LookupError::Read(e.clone())),
            Err(e) => Err(LookupError::Cached(e.clone())),
        }
    }

    /// Number of distinct (component, variable) pairs seen.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    impl LongNameSource for Counting {
        fn read_long_name(&self, _path: &Path, variable: &str) -> Result<String, LongNameError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            if variable == "BAD" {
                return Err(LongNameError::MissingAttribute { path: "x.nc".into(), variable: variable.into() });
            }
            Ok(format!("long {variable}"))
        }
    }

    #[test]
    fn reads_once_per_pair() {
        let src = Counting(AtomicUsize::new(0));
        let cache = LongNameCache::new(&src);
        assert_eq!(cache.get("atm", "TS", Path::new("a.nc")).unwrap(), "long TS");
        assert_eq!(cache.get("atm", "TS", Path::new("b.nc")).unwrap(), "long TS");
        assert_eq!(cache.get("lnd", "TS", Path::new("c.nc")).unwrap(), "long TS");
        assert_eq!(src.0.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_cached_too() {
        let src = Counting(AtomicUsize::new(0));
        let cache = LongNameCache::new(&src);
        assert!(matches!(cache.get("atm", "BAD", Path::new("a.nc")), Err(LookupError::Read(_))));
        assert!(matches!(cache.get("atm", "BAD", Path::new("b.nc")), Err(LookupError::Cached(_))));
        assert_eq!(src.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_callers_share_one_read() {
        let src = Counting(AtomicUsize::new(0));
        let cache = LongNameCache::new(&src);
        let labels: Vec<String> = (0..256)
            .into_par_iter()
            .map(|i| {
                let var = if i % 2 == 0 { "TS" } else { "PRECT" };
                cache.get("atm", var, Path::new("f.nc")).unwrap()
            })
            .collect();
        assert_eq!(src.0.load(Ordering::SeqCst), 2);
        assert!(labels.iter().all(|l| l == "long TS" || l == "long PRECT"));
    }

    #[cfg(feature = "netcdf")]
    mod netcdf_file {
        use super::*;
        use tempfile::TempDir;

        fn write_sample(path: &Path) {
            let mut nc = netcdf::create(path).unwrap();
            nc.add_dimension("time", 2).unwrap();
            {
                let mut v = nc.add_variable::<f32>("TS", &["time"]).unwrap();
                v.put_attribute(LONG_NAME_ATTR, "Surface temperature (radiative)").unwrap();
                v.put_attribute("units", "K").unwrap();
            }
            {
                let mut v = nc.add_variable::<f32>("PRECT", &["time"]).unwrap();
                v.put_attribute("units", "m/s").unwrap();
            }
        }

        #[test]
        fn reads_long_name_attribute() {
            let tmp = TempDir::new().unwrap();
            let path = tmp.path().join("CASE1.cam.h0.TS.0001-0010.nc");
            write_sample(&path);
            assert_eq!(
                NetcdfLongNames.read_long_name(&path, "TS").unwrap(),
                "Surface temperature (radiative)"
            );
        }

        #[test]
        fn variable_without_long_name() {
            let tmp = TempDir::new().unwrap();
            let path = tmp.path().join("sample.nc");
            write_sample(&path);
            assert_eq!(
                NetcdfLongNames.read_long_name(&path, "PRECT"),
                Err(LongNameError::MissingAttribute { path: path.clone(), variable: "PRECT".into() })
            );
        }

        #[test]
        fn variable_not_in_file() {
            let tmp = TempDir::new().unwrap();
            let path = tmp.path().join("sample.nc");
            write_sample(&path);
            assert_eq!(
                NetcdfLongNames.read_long_name(&path, "Q"),
                Err(LongNameError::MissingVariable { path: path.clone(), variable: "Q".into() })
            );
        }

        #[test]
        fn unopenable_file() {
            let tmp = TempDir::new().unwrap();
            let path = tmp.path().join("empty.nc");
            std::fs::write(&path, b"").unwrap();
            assert!(matches!(NetcdfLongNames.read_long_name(&path, "TS"), Err(LongNameError::Open { .. })));
        }
    }
}

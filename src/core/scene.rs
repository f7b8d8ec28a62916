//! Scene discovery: resolves a feature's data reference to its on-disk SAFE
//! container and enumerates the polarisations it carries.
use std::fs;
use std::path::{Path, PathBuf};

use geojson::Feature;

use crate::error::{Error, Result};
use crate::io::metadata::scene_id;

/// Locates SAFE containers under a fixed input root, keyed by the feature's
/// scene id property.
#[derive(Debug, Clone)]
pub struct SceneLocator {
    input_root: PathBuf,
}

impl SceneLocator {
    pub fn new(input_root: impl Into<PathBuf>) -> Self {
        SceneLocator {
            input_root: input_root.into(),
        }
    }

    /// Full path of the scene container, e.g.
    /// `<input_root>/<scene_id>/S1B_IW_GRDH_..._4EA4.SAFE`. When more than one
    /// `*.SAFE` directory is present the lexicographically first one wins; the
    /// layout contract promises exactly one.
    pub fn scene_directory(&self, feature: &Feature) -> Result<PathBuf> {
        let id = scene_id(feature)?;
        first_safe_container(&self.input_root.join(id))
    }
}

fn first_safe_container(dir: &Path) -> Result<PathBuf> {
    let not_found = || Error::SceneNotFound {
        path: dir.to_path_buf(),
    };
    if !dir.is_dir() {
        return Err(not_found());
    }
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_dir() && path.extension().is_some_and(|ext| ext == "SAFE")
        })
        .collect();
    matches.sort();
    matches.into_iter().next().ok_or_else(not_found)
}

/// Scan the measurement rasters and extract their polarisation codes: the
/// fourth hyphen-delimited token of the file stem, upper-cased. The naming
/// convention is an external contract of the SAFE format; files that do not
/// follow it yield whatever sits in that position.
pub fn discover_polarisations(safe_dir: &Path) -> Result<Vec<String>> {
    let measurement = safe_dir.join("measurement");
    let mut pols = Vec::new();
    if !measurement.is_dir() {
        return Ok(pols);
    }
    for entry in fs::read_dir(&measurement)? {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "tiff") {
            continue;
        }
        if let Some(token) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.split('-').nth(3))
        {
            pols.push(token.to_ascii_uppercase());
        }
    }
    pols.sort();
    Ok(pols)
}

/// True iff every requested polarisation is available. Order-insensitive,
/// duplicates carry no weight, no partial credit.
pub fn validate_polarisations(requested: &[String], available: &[String]) -> bool {
    requested.iter().all(|pol| available.contains(pol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn pols(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn validate_is_a_subset_test() {
        let cases: &[(&[&str], &[&str], bool)] = &[
            (&["VV"], &["VV"], true),
            (&["HH"], &["HH"], true),
            (&["VV"], &["HH"], false),
            (&["VV", "VH"], &["VV", "VH"], true),
            (&["VV", "VH"], &["HH", "HV"], false),
            (&["VV", "VH"], &["VV"], false),
            (&["HH"], &["HH", "HV"], true),
        ];
        for (requested, available, expected) in cases {
            assert_eq!(
                validate_polarisations(&pols(requested), &pols(available)),
                *expected,
                "requested {requested:?} available {available:?}"
            );
        }
    }

    #[test]
    fn discovers_polarisations_from_measurement_names() {
        let tmp = TempDir::new().unwrap();
        let safe = tmp.path().join("scene.SAFE");
        let measurement = safe.join("measurement");
        fs::create_dir_all(&measurement).unwrap();
        for name in [
            "s1b-iw-grd-vh-20190220t050359-20190220t050424-015025-01c12f-002.tiff",
            "s1b-iw-grd-vv-20190220t050359-20190220t050424-015025-01c12f-001.tiff",
        ] {
            File::create(measurement.join(name)).unwrap();
        }
        File::create(measurement.join("notes.txt")).unwrap();

        assert_eq!(discover_polarisations(&safe).unwrap(), pols(&["VH", "VV"]));
    }

    #[test]
    fn missing_measurement_dir_yields_no_polarisations() {
        let tmp = TempDir::new().unwrap();
        assert!(discover_polarisations(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn zero_containers_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = first_safe_container(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::SceneNotFound { .. }));
    }

    #[test]
    fn first_container_wins_on_multiple_matches() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("b.SAFE")).unwrap();
        fs::create_dir(tmp.path().join("a.SAFE")).unwrap();
        let found = first_safe_container(tmp.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "a.SAFE");
    }
}

//! Feature-collection metadata: the `data.json` handoff read from the input
//! root and written to the output root, plus the capability-property rewrite
//! applied to every emitted feature.
use std::fs;
use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Input data-reference property: id of the directory holding the SAFE scene.
pub const SCENE_DATA_KEY: &str = "sentinel1.grd.scene_id";
/// Output artifact property: stacked GeoTIFF name relative to the output root.
pub const STACK_PATH_KEY: &str = "processed.stack_path";

/// The feature's scene id, required before processing.
pub fn scene_id(feature: &Feature) -> Result<String> {
    feature
        .property(SCENE_DATA_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(Error::MissingProperty {
            key: SCENE_DATA_KEY,
        })
}

/// Drop the input scene reference and record the stacked artifact instead.
pub fn set_output_capability(feature: &mut Feature, artifact: &str) {
    feature.remove_property(SCENE_DATA_KEY);
    feature.set_property(STACK_PATH_KEY, artifact);
}

/// Load `<input_root>/data.json`. A missing file yields an empty collection.
pub fn load_metadata(input_root: &Path) -> Result<FeatureCollection> {
    let path = input_root.join("data.json");
    if !path.exists() {
        debug!("{} does not exist, starting from an empty collection", path.display());
        return Ok(FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        });
    }
    match fs::read_to_string(&path)?.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        other => Err(Error::Metadata(format!(
            "{} holds a {} instead of a FeatureCollection",
            path.display(),
            match other {
                GeoJson::Geometry(_) => "Geometry",
                GeoJson::Feature(_) => "Feature",
                GeoJson::FeatureCollection(_) => unreachable!(),
            }
        ))),
    }
}

/// Write the emitted collection to `<output_root>/data.json`.
pub fn save_metadata(output_root: &Path, collection: &FeatureCollection) -> Result<()> {
    fs::create_dir_all(output_root)?;
    fs::write(
        output_root.join("data.json"),
        serde_json::to_string(collection)?,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn feature_with_scene(id: &str) -> Feature {
        let mut properties = geojson::JsonObject::new();
        properties.insert(SCENE_DATA_KEY.to_string(), json!(id));
        Feature {
            bbox: Some(vec![0.0, 0.0, 1.0, 1.0]),
            geometry: None,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    #[test]
    fn scene_id_reads_the_data_reference() {
        let feature = feature_with_scene("abc");
        assert_eq!(scene_id(&feature).unwrap(), "abc");
    }

    #[test]
    fn scene_id_missing_is_an_error() {
        let feature = Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: None,
            foreign_members: None,
        };
        assert!(matches!(
            scene_id(&feature).unwrap_err(),
            Error::MissingProperty { .. }
        ));
    }

    #[test]
    fn capability_rewrite_swaps_the_properties() {
        let mut feature = feature_with_scene("abc");
        set_output_capability(&mut feature, "abc.tif");
        assert!(feature.property(SCENE_DATA_KEY).is_none());
        assert_eq!(
            feature.property(STACK_PATH_KEY).and_then(Value::as_str),
            Some("abc.tif")
        );
    }

    #[test]
    fn metadata_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let collection = FeatureCollection {
            bbox: None,
            features: vec![feature_with_scene("abc")],
            foreign_members: None,
        };
        save_metadata(tmp.path(), &collection).unwrap();
        let loaded = load_metadata(tmp.path()).unwrap();
        assert_eq!(loaded.features.len(), 1);
        assert_eq!(scene_id(&loaded.features[0]).unwrap(), "abc");
    }

    #[test]
    fn missing_metadata_file_is_an_empty_collection() {
        let tmp = TempDir::new().unwrap();
        assert!(load_metadata(tmp.path()).unwrap().features.is_empty());
    }
}

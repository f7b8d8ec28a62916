//! Parameter resolution: turns the loosely-typed task parameters from the
//! environment into a fully-defaulted, validated `ParameterSet` shared
//! read-only across the whole run.
use geo_types::{Geometry, Rect, coord};
use serde::Deserialize;
use wkt::ToWkt;

use crate::error::{Error, Result};
use crate::types::{CalibrationBand, MaskDirection};

/// Used when `polarisations` is absent or empty.
pub const DEFAULT_POLARISATION: &str = "VV";

/// Task parameters exactly as they arrive in the environment JSON. Every
/// field is optional; several eras of configuration are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawParameters {
    pub mask: Option<Vec<MaskDirection>>,
    pub tcorrection: Option<bool>,
    pub calibration_band: Option<Vec<CalibrationBand>>,
    pub speckle_filter: Option<bool>,
    pub linear_to_db: Option<bool>,
    pub clip_to_aoi: Option<bool>,
    pub bbox: Option<Vec<f64>>,
    pub contains: Option<geojson::Geometry>,
    pub intersects: Option<geojson::Geometry>,
    pub polarisations: Option<Vec<String>>,
}

/// Resolved parameter set. Immutable after `resolve`.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    pub mask: Option<MaskDirection>,
    pub tcorrection: bool,
    pub calibration_band: CalibrationBand,
    pub speckle_filter: bool,
    pub linear_to_db: bool,
    pub clip_to_aoi: bool,
    pub polarisations: Vec<String>,
    bbox: Option<Vec<f64>>,
    contains: Option<geojson::Geometry>,
    intersects: Option<geojson::Geometry>,
}

impl ParameterSet {
    /// Apply defaults and validate the AOI flag against the geometry
    /// constraints. `clip_to_aoi=true` requires exactly one of bbox, contains
    /// or intersects; `clip_to_aoi=false` forbids all of them.
    pub fn resolve(raw: RawParameters) -> Result<Self> {
        let has_geometry =
            raw.bbox.is_some() || raw.contains.is_some() || raw.intersects.is_some();
        let clip_to_aoi = raw.clip_to_aoi.unwrap_or(false);
        if clip_to_aoi && !has_geometry {
            return Err(Error::AoiGeometryMissing);
        }
        if !clip_to_aoi && has_geometry {
            return Err(Error::AoiGeometryUnexpected);
        }

        let polarisations = match raw.polarisations {
            Some(pols) if !pols.is_empty() => pols,
            _ => vec![DEFAULT_POLARISATION.to_string()],
        };

        Ok(ParameterSet {
            mask: raw.mask.and_then(|m| m.first().copied()),
            tcorrection: raw.tcorrection.unwrap_or(true),
            calibration_band: raw
                .calibration_band
                .and_then(|b| b.first().copied())
                .unwrap_or(CalibrationBand::Sigma),
            speckle_filter: raw.speckle_filter.unwrap_or(true),
            linear_to_db: raw.linear_to_db.unwrap_or(true),
            clip_to_aoi,
            polarisations,
            bbox: raw.bbox,
            contains: raw.contains,
            intersects: raw.intersects,
        })
    }

    /// Well-known text of the configured AOI, if any. A bbox takes precedence
    /// over the contains/intersects geometries.
    pub fn aoi_wkt(&self) -> Result<Option<String>> {
        if let Some(bbox) = &self.bbox {
            if bbox.len() < 4 {
                return Err(Error::Geometry(format!(
                    "bbox must have 4 entries, got {}",
                    bbox.len()
                )));
            }
            let rect = Rect::new(
                coord! { x: bbox[0], y: bbox[1] },
                coord! { x: bbox[2], y: bbox[3] },
            );
            return Ok(Some(rect.to_polygon().wkt_string()));
        }

        match self.contains.as_ref().or(self.intersects.as_ref()) {
            Some(geojson_geom) => {
                let geom = Geometry::<f64>::try_from(geojson_geom.clone())
                    .map_err(|e| Error::Geometry(e.to_string()))?;
                Ok(Some(geom.wkt_string()))
            }
            None => Ok(None),
        }
    }
}

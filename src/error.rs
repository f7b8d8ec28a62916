//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, JSON, GDAL, and XML errors, and provides semantic
//! variants for parameter validation, scene lookup, graph manipulation, and
//! external-tool failure.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error(
        "When clip_to_aoi is set to true, one of bbox, contains or intersects must be supplied"
    )]
    AoiGeometryMissing,

    #[error("When clip_to_aoi is set to false, bbox, contains and intersects must be null")]
    AoiGeometryUnexpected,

    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("Feature has no '{key}' property")]
    MissingProperty { key: &'static str },

    #[error("Feature has no bounding box")]
    MissingBbox,

    #[error("No *.SAFE container found under {path}")]
    SceneNotFound { path: PathBuf },

    #[error("Requested polarisations {requested:?} not all available (found {available:?})")]
    MissingPolarisations {
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("Malformed graph template: {0}")]
    MalformedTemplate(String),

    #[error("Unknown template placeholder '${{{name}}}'")]
    UnknownPlaceholder { name: String },

    #[error("No substitution supplied for placeholder '${{{name}}}'")]
    UnresolvedPlaceholder { name: String },

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("gpt exited with status {code}")]
    ToolFailure { code: i32 },
}

impl Error {
    /// A recoverable error skips the current feature; everything else aborts
    /// the run. Only a polarisation mismatch is recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::MissingPolarisations { .. })
    }
}

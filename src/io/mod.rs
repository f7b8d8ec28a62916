//! I/O layer: feature-collection metadata handoff and GDAL-backed raster
//! assembly of the per-polarisation outputs.
pub mod metadata;
pub mod raster;

//! The canonical template for one run and its single cross-scene mutation:
//! the elevation-model override for scenes outside the default model's
//! latitude coverage.
use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::graph::{GraphDocument, TERRAIN_NODE};
use crate::error::{Error, Result};

/// Default SNAP elevation model and its alternate for high latitudes.
pub const DEFAULT_DEM: &str = "SRTM 3Sec";
pub const FALLBACK_DEM: &str = "ASTER 1sec GDEM";

/// Exclusive latitude band covered by the default elevation model.
pub const DEM_COVERAGE: (f64, f64) = (-56.0, 60.0);

const DEM_PARAM: &str = "demName";

/// Holds the canonical graph document for a run. Working copies are handed
/// out per invocation; the only mutation of the canonical document is the
/// elevation-model override, applied at most once and in effect for every
/// later scene of the run, including scenes back inside coverage.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    canonical: GraphDocument,
    dem_overridden: bool,
}

impl TemplateStore {
    pub fn new(canonical: GraphDocument) -> Self {
        TemplateStore {
            canonical,
            dem_overridden: false,
        }
    }

    /// The built-in polarimetry graph template.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(GraphDocument::parse(include_str!(
            "../../templates/polarimetry_graph.xml"
        ))?))
    }

    /// Load a template from disk.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(GraphDocument::parse(&fs::read_to_string(path)?)?))
    }

    /// A working copy of the canonical document.
    pub fn canonical(&self) -> GraphDocument {
        self.canonical.clone()
    }

    pub fn dem_overridden(&self) -> bool {
        self.dem_overridden
    }

    /// Swap the default elevation model for the fallback in the canonical
    /// document. Sticky for the rest of the run. Templates without a
    /// terrain-correction stage are left untouched.
    pub fn apply_elevation_override(&mut self) {
        if self.dem_overridden {
            return;
        }
        if self.canonical.node(TERRAIN_NODE).is_some() {
            // set_param cannot fail here, the node was just looked up
            let _ = self.canonical.set_param(TERRAIN_NODE, DEM_PARAM, FALLBACK_DEM);
            info!("{DEFAULT_DEM} has been replaced by {FALLBACK_DEM}.");
        }
        self.dem_overridden = true;
    }

    /// Apply the override when the scene's relevant latitude falls outside
    /// the default model's coverage.
    pub fn ensure_dem_for(&mut self, bbox: &[f64]) -> Result<()> {
        let latitude = relevant_latitude(bbox)?;
        if !(DEM_COVERAGE.0 < latitude && latitude < DEM_COVERAGE.1) {
            self.apply_elevation_override();
        }
        Ok(())
    }
}

/// Poleward latitude bound of an `[minX, minY, maxX, maxY]` bbox: the maximum
/// of the two latitude bounds on the northern hemisphere, the minimum on the
/// southern.
pub fn relevant_latitude(bbox: &[f64]) -> Result<f64> {
    if bbox.len() < 4 {
        return Err(Error::MissingBbox);
    }
    let (a, b) = (bbox[1], bbox[3]);
    Ok(if a < 0.0 && b < 0.0 { a.min(b) } else { a.max(b) })
}

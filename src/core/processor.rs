//! The per-feature processing loop: scene resolution, graph generation, gpt
//! invocation, output relocation, and the capability rewrite. One pass over
//! the collection; assembly of the relocated rasters happens afterwards,
//! driven by the bookkeeping map returned from here.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use geojson::{Feature, FeatureCollection};
use tracing::{info, warn};

use crate::core::gpt::GptRunner;
use crate::core::graph::{
    DB_NODE, GraphDocument, MASK_NODE, Placeholder, SPECKLE_NODE, SUBSET_NODE, Substitutions,
    TERRAIN_NODE,
};
use crate::core::params::ParameterSet;
use crate::core::scene::{self, SceneLocator};
use crate::core::template::TemplateStore;
use crate::error::{Error, Result};
use crate::io::metadata::{scene_id, set_output_capability};
use crate::io::raster::move_file;

/// Per-scene bookkeeping consumed by the assembly pass after the collection
/// has been fully visited. Not persisted beyond the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub id: String,
    /// Lower-case codes, which are also the band file stems in `directory`.
    pub polarisations: Vec<String>,
    pub directory: PathBuf,
}

/// The well-known directory layout shared with the external tool.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Holds `<scene_id>/<container>.SAFE` trees and the input `data.json`.
    pub input_root: PathBuf,
    /// Receives one directory per output id plus the output `data.json`.
    pub output_root: PathBuf,
    /// Scratch directory for generated graph documents.
    pub graph_dir: PathBuf,
}

impl Workspace {
    pub fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.input_root)?;
        fs::create_dir_all(&self.output_root)?;
        fs::create_dir_all(&self.graph_dir)?;
        Ok(())
    }
}

pub struct PolarimetryProcessor {
    params: ParameterSet,
    locator: SceneLocator,
    templates: TemplateStore,
    gpt: GptRunner,
    workspace: Workspace,
}

impl PolarimetryProcessor {
    pub fn new(
        params: ParameterSet,
        templates: TemplateStore,
        gpt: GptRunner,
        workspace: Workspace,
    ) -> Self {
        let locator = SceneLocator::new(workspace.input_root.clone());
        PolarimetryProcessor {
            params,
            locator,
            templates,
            gpt,
            workspace,
        }
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// One pass over the collection. Features whose requested polarisations
    /// are unavailable are skipped and left out of the result; any other
    /// failure aborts the pass. Each emitted feature has its scene reference
    /// replaced by the stacked-artifact reference, and a bookkeeping record
    /// keyed by output id is collected for the assembly pass.
    pub fn process(
        &mut self,
        collection: &FeatureCollection,
    ) -> Result<(FeatureCollection, BTreeMap<String, OutputRecord>)> {
        let mut results: Vec<Feature> = Vec::new();
        let mut records: BTreeMap<String, OutputRecord> = BTreeMap::new();

        for feature in &collection.features {
            let bbox = feature.bbox.as_deref().ok_or(Error::MissingBbox)?;
            self.templates.ensure_dem_for(bbox)?;

            match self.process_scene(feature) {
                Ok(outputs) => {
                    let id = scene_id(feature)?;
                    let out_dir = self.workspace.output_root.join(&id);
                    fs::create_dir_all(&out_dir)?;

                    let mut band_names = Vec::new();
                    for (pol, produced) in &outputs {
                        let band = pol.to_lowercase();
                        move_file(produced, &out_dir.join(format!("{band}.tif")))?;
                        band_names.push(band);
                    }

                    let mut out_feature = feature.clone();
                    set_output_capability(&mut out_feature, &format!("{id}.tif"));
                    results.push(out_feature);
                    records.insert(
                        id.clone(),
                        OutputRecord {
                            id,
                            polarisations: band_names,
                            directory: out_dir,
                        },
                    );
                }
                Err(e) if e.is_recoverable() => {
                    let id = scene_id(feature).unwrap_or_default();
                    warn!("{e}; skipping scene {id}");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((
            FeatureCollection {
                bbox: None,
                features: results,
                foreign_members: None,
            },
            records,
        ))
    }

    /// Generate a graph and run gpt for every requested polarisation of one
    /// scene, returning `(POL, produced raster path)` pairs. Generated graph
    /// documents are removed afterwards whether or not the scene succeeded.
    fn process_scene(&self, feature: &Feature) -> Result<Vec<(String, PathBuf)>> {
        let mut generated: Vec<PathBuf> = Vec::new();
        let result = self.run_scene(feature, &mut generated);
        for graph in &generated {
            let _ = fs::remove_file(graph);
        }
        result
    }

    fn run_scene(
        &self,
        feature: &Feature,
        generated: &mut Vec<PathBuf>,
    ) -> Result<Vec<(String, PathBuf)>> {
        let safe_dir = self.locator.scene_directory(feature)?;
        let available = scene::discover_polarisations(&safe_dir)?;
        let requested = &self.params.polarisations;
        if !scene::validate_polarisations(requested, &available) {
            return Err(Error::MissingPolarisations {
                requested: requested.clone(),
                available,
            });
        }

        let safe_name = safe_dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let safe_stem = safe_dir
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();

        let mut outputs = Vec::new();
        for pol in requested {
            // gpt's Write stage appends .tif to this base path
            let out_base = self
                .workspace
                .input_root
                .join(format!("{safe_stem}_{}", pol.to_lowercase()));
            let graph_path = self.workspace.graph_dir.join(format!("{safe_name}_{pol}.xml"));

            let doc = self.build_graph(&safe_dir, pol, &out_base)?;
            fs::write(&graph_path, doc.to_xml()?)?;
            generated.push(graph_path.clone());

            self.gpt.invoke(&graph_path, &safe_dir)?;

            let mut produced = out_base.into_os_string();
            produced.push(".tif");
            outputs.push((pol.clone(), PathBuf::from(produced)));
        }
        info!("SNAP processing is finished for {safe_name}.");
        Ok(outputs)
    }

    /// Working copy of the canonical template: disabled stages excised with
    /// the pipeline relinked, then per-scene placeholders substituted.
    fn build_graph(&self, safe_dir: &Path, pol: &str, out_base: &Path) -> Result<GraphDocument> {
        let mut doc = self.templates.canonical();

        for stage in disabled_stages(&self.params) {
            if doc.excise(stage) {
                info!("{stage} will be discarded.");
            }
        }

        let mut subs = Substitutions::default();
        subs.set(
            Placeholder::ManifestPath,
            safe_dir.join("manifest.safe").display().to_string(),
        )
        .set(Placeholder::OutputPath, out_base.display().to_string())
        .set(Placeholder::PolarisationUpper, pol.to_uppercase())
        .set(Placeholder::BandType, self.params.calibration_band.band_type());

        let (sigma, gamma, beta) = self.params.calibration_band.one_hot();
        subs.set(Placeholder::SigmaBand, sigma)
            .set(Placeholder::GammaBand, gamma)
            .set(Placeholder::BetaBand, beta);

        if let Some(mask) = self.params.mask {
            subs.set(Placeholder::MaskType, mask.land_mask_flag());
        }
        if let Some(wkt) = self.params.aoi_wkt()? {
            subs.set(Placeholder::AoiWkt, wkt);
        }

        doc.substitute(&subs)?;
        Ok(doc)
    }
}

/// Stage ids excised for the given parameter set.
fn disabled_stages(params: &ParameterSet) -> Vec<&'static str> {
    let mut stages = Vec::new();
    if !params.clip_to_aoi {
        stages.push(SUBSET_NODE);
    }
    if params.mask.is_none() {
        stages.push(MASK_NODE);
    }
    if !params.speckle_filter {
        stages.push(SPECKLE_NODE);
    }
    if !params.tcorrection {
        stages.push(TERRAIN_NODE);
    }
    if !params.linear_to_db {
        stages.push(DB_NODE);
    }
    stages
}

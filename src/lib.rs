#![doc = r#"
sarprep — Sentinel-1 polarimetric preprocessing orchestration for ESA SNAP.

This crate prepares Sentinel-1 SAFE (GRD) scenes for polarimetric calibration
by SNAP's `gpt` graph-processing tool and republishes the results: it builds
one XML processing graph per scene and polarisation from a canonical template,
invokes `gpt` as a subprocess, relocates the produced rasters, rewrites their
nodata tagging, stacks the polarisation bands into a single GeoTIFF, and
rewrites the feature-collection metadata to reference the new artifact. The
numerical remote-sensing work (calibration, speckle filtering, terrain
correction) happens entirely inside SNAP; this crate owns the orchestration
and the file lifecycle around it.

Requirements
------------
- GDAL development headers and runtime available on your system.
- An ESA SNAP installation providing the `gpt` binary (only needed at run
  time; the library is testable against a stub).

Quick start
-----------
```rust,no_run
use sarprep::{
    GptRunner, ParameterSet, PolarimetryProcessor, RawParameters, TemplateStore, Workspace,
};
use sarprep::io::metadata::{load_metadata, save_metadata};
use sarprep::io::raster::stack_and_finalize;

fn main() -> sarprep::Result<()> {
    let params = ParameterSet::resolve(RawParameters::default())?;
    let workspace = Workspace {
        input_root: "/tmp/input".into(),
        output_root: "/tmp/output".into(),
        graph_dir: "/tmp".into(),
    };
    workspace.ensure_exists()?;

    let collection = load_metadata(&workspace.input_root)?;
    let mut processor = PolarimetryProcessor::new(
        params,
        TemplateStore::builtin()?,
        GptRunner::default(),
        workspace.clone(),
    );
    let (result, records) = processor.process(&collection)?;

    save_metadata(&workspace.output_root, &result)?;
    for record in records.values() {
        stack_and_finalize(&record.directory, &record.polarisations)?;
    }
    Ok(())
}
```

Error handling
--------------
All public functions return [`Result`]; only a polarisation mismatch is
recoverable (the feature is skipped), every other error aborts the run. A
nonzero `gpt` exit surfaces as [`Error::ToolFailure`] carrying the child's
exit code so the caller can decide process-exit behavior.

Useful modules
--------------
- [`core`] — parameter resolution, scene discovery, graph generation,
  `gpt` invocation, and the per-feature processing loop.
- [`io`] — feature-collection metadata and GDAL-backed raster assembly.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
pub use core::gpt::GptRunner;
pub use core::params::{ParameterSet, RawParameters};
pub use core::processor::{OutputRecord, PolarimetryProcessor, Workspace};
pub use core::template::TemplateStore;
pub use error::{Error, Result};
pub use types::{CalibrationBand, MaskDirection};

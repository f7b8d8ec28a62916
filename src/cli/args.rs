use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sarprep", version, about = "Sentinel-1 polarimetric preprocessing via SNAP gpt")]
pub struct CliArgs {
    /// Input root holding <scene_id>/<container>.SAFE trees and data.json
    #[arg(long, default_value = "/tmp/input")]
    pub input_dir: PathBuf,

    /// Output root for the per-scene stacks and the emitted data.json
    #[arg(long, default_value = "/tmp/output")]
    pub output_dir: PathBuf,

    /// Scratch directory for generated graph documents
    #[arg(long, default_value = "/tmp")]
    pub graph_dir: PathBuf,

    /// Graph template file; the built-in polarimetry template is used when absent
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// SNAP graph processing tool binary
    #[arg(long, default_value = "gpt")]
    pub gpt: PathBuf,

    /// Inline JSON task parameters; overrides the SARPREP_TASK_PARAMS environment variable
    #[arg(long)]
    pub params: Option<String>,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}

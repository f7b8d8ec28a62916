use std::env;

use tracing::{error, info};

use sarprep::core::gpt::GptRunner;
use sarprep::core::params::{ParameterSet, RawParameters};
use sarprep::core::processor::{PolarimetryProcessor, Workspace};
use sarprep::core::template::TemplateStore;
use sarprep::io::metadata::{load_metadata, save_metadata};
use sarprep::io::raster::{post_process, stack_and_finalize};
use sarprep::Error;

use super::args::CliArgs;

/// Environment variable carrying the task parameters as a JSON object.
pub const PARAMS_ENV: &str = "SARPREP_TASK_PARAMS";

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    let raw = load_raw_params(args.params.as_deref())?;
    let params = ParameterSet::resolve(raw)?;
    let mask_enabled = params.mask.is_some();

    let workspace = Workspace {
        input_root: args.input_dir.clone(),
        output_root: args.output_dir.clone(),
        graph_dir: args.graph_dir.clone(),
    };
    workspace.ensure_exists()?;

    let templates = match &args.template {
        Some(path) => TemplateStore::open(path)?,
        None => TemplateStore::builtin()?,
    };

    let input_metadata = load_metadata(&args.input_dir)?;
    info!("Processing {} feature(s)", input_metadata.features.len());

    let mut processor = PolarimetryProcessor::new(
        params,
        templates,
        GptRunner::new(args.gpt.clone()),
        workspace,
    );
    let (result, records) = match processor.process(&input_metadata) {
        Ok(out) => out,
        Err(Error::ToolFailure { code }) => {
            error!("gpt failed with exit code {code}; aborting the run");
            std::process::exit(code);
        }
        Err(e) => return Err(e.into()),
    };

    save_metadata(&args.output_dir, &result)?;

    for record in records.values() {
        if mask_enabled {
            post_process(&record.directory, &record.polarisations)?;
        }
        let final_path = stack_and_finalize(&record.directory, &record.polarisations)?;
        info!("Wrote {}", final_path.display());
    }

    Ok(())
}

fn load_raw_params(inline: Option<&str>) -> Result<RawParameters, serde_json::Error> {
    let data = match inline {
        Some(json) => json.to_string(),
        None => env::var(PARAMS_ENV).unwrap_or_default(),
    };
    if data.trim().is_empty() {
        return Ok(RawParameters::default());
    }
    serde_json::from_str(&data)
}

//! Invocation of SNAP's graph processing tool (`gpt`) as a blocking
//! subprocess.
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{error, info};

use crate::error::{Error, Result};

pub const DEFAULT_GPT_BINARY: &str = "gpt";

/// Runs `<gpt> <graph> -e <scene>` and waits for it to exit. No timeout is
/// enforced; an unresponsive tool stalls the run.
#[derive(Debug, Clone)]
pub struct GptRunner {
    binary: PathBuf,
}

impl GptRunner {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        GptRunner {
            binary: binary.into(),
        }
    }

    /// A nonzero exit becomes `Error::ToolFailure` carrying the child's exit
    /// code. The driver decides whether that terminates the run; a malformed
    /// graph or missing binary is a configuration problem, not a per-scene
    /// one.
    pub fn invoke(&self, graph: &Path, scene: &Path) -> Result<()> {
        info!(
            "Running SNAP command: {} {} -e {}",
            self.binary.display(),
            graph.display(),
            scene.display()
        );
        let status = Command::new(&self.binary)
            .arg(graph)
            .arg("-e")
            .arg(scene)
            .status()?;

        if status.success() {
            return Ok(());
        }
        let code = status.code().unwrap_or(1);
        error!("gpt did not finish successfully, exit code {code}");
        Err(Error::ToolFailure { code })
    }
}

impl Default for GptRunner {
    fn default() -> Self {
        GptRunner::new(DEFAULT_GPT_BINARY)
    }
}

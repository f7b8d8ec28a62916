//! Command Line Interface (CLI) layer for sarprep.
//!
//! This module defines argument parsing (`args`) and the orchestration logic
//! (`runner`) for a full batch: load parameters and metadata, run the
//! polarimetry processor over the feature collection, save the emitted
//! collection, and assemble the stacked outputs.
//!
//! If you are embedding sarprep into another application, prefer using the
//! library API instead of calling the CLI code.
pub mod args;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;

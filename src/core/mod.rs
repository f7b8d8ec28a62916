//! Orchestration core: parameter resolution, scene discovery, graph-template
//! generation, external-tool invocation, and the per-feature processing loop.
pub mod gpt;
pub mod graph;
pub mod params;
pub mod processor;
pub mod scene;
pub mod template;

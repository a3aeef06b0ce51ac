//! Configuration for the decode pipeline.
//!
//! Provides `PipelineConfig` (top-level settings), one sub-config per
//! concern, `AppPaths` for cross-platform directories, and TOML persistence
//! via `PipelineConfig::load` / `PipelineConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{CodecBackend, DecodeConfig, OutputConfig, PipelineConfig, RecognizerConfig};

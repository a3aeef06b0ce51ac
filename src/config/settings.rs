//! Pipeline settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// CodecBackend
// ---------------------------------------------------------------------------

/// Which [`FrameCodec`](crate::audio::FrameCodec) implementation decodes.
///
/// | Variant  | Where frames are decoded                     |
/// |----------|----------------------------------------------|
/// | Inline   | caller's thread, lazily on each output poll  |
/// | Threaded | dedicated worker thread behind bounded queues |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecBackend {
    Inline,
    Threaded,
}

impl Default for CodecBackend {
    fn default() -> Self {
        Self::Inline
    }
}

// ---------------------------------------------------------------------------
// DecodeConfig
// ---------------------------------------------------------------------------

/// Settings for the frame decoder's poll loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    pub backend: CodecBackend,
    /// Upper bound for each feed / drain poll, in milliseconds.
    pub poll_timeout_ms: u64,
    /// Capacity of the codec's input and output queues.
    pub queue_capacity: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            backend: CodecBackend::default(),
            poll_timeout_ms: 10,
            queue_capacity: 8,
        }
    }
}

impl DecodeConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Shape of the two pipeline outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Sample rate handed to the recognizer.  Whisper needs 16 000.
    pub target_sample_rate: u32,
    /// Number of waveform bars per recording.
    pub waveform_bars: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16_000,
            waveform_bars: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// RecognizerConfig
// ---------------------------------------------------------------------------

/// Settings for the speech recognizer behind the `whisper` feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// GGML model file.  `None` means `<models_dir>/ggml-base.bin`.
    pub model_path: Option<PathBuf>,
    /// ISO-639-1 code, or `"auto"` for built-in language detection.
    pub language: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            language: "auto".into(),
        }
    }
}

impl RecognizerConfig {
    const DEFAULT_MODEL_FILE: &'static str = "ggml-base.bin";

    /// Model file to load: the configured path, else the default model in
    /// `paths.models_dir`.
    pub fn resolve_model_path(&self, paths: &AppPaths) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| paths.models_dir.join(Self::DEFAULT_MODEL_FILE))
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```toml
/// [decode]
/// backend = "threaded"
/// poll_timeout_ms = 10
/// queue_capacity = 8
///
/// [output]
/// target_sample_rate = 16000
/// waveform_bars = 60
///
/// [recognizer]
/// language = "auto"
/// ```
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_memo_audio::config::PipelineConfig;
///
/// // Load (returns Default when file is missing)
/// let config = PipelineConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub decode: DecodeConfig,
    pub output: OutputConfig,
    pub recognizer: RecognizerConfig,
}

impl PipelineConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(PipelineConfig::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.output.target_sample_rate == 0 {
            bail!("output.target_sample_rate must be > 0");
        }
        if self.output.waveform_bars == 0 {
            bail!("output.waveform_bars must be > 0");
        }
        if self.decode.queue_capacity == 0 {
            bail!("decode.queue_capacity must be > 0");
        }
        if self.decode.poll_timeout_ms == 0 {
            bail!("decode.poll_timeout_ms must be > 0");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Transcription parameters.
//!
//! [`TranscribeParams`] carries all settings that control a single inference
//! run.

use crate::config::RecognizerConfig;

// ---------------------------------------------------------------------------
// SamplingStrategy
// ---------------------------------------------------------------------------

/// Mirrors `whisper_rs::SamplingStrategy` but is owned and `Clone`.
///
/// Greedy is single-pass and fastest.  Beam search is slightly more accurate
/// at 2-4× the latency, which rarely pays off for short memos.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    /// Greedy (single-pass) decoding.
    Greedy {
        /// Number of candidate tokens evaluated per step.  1 is fastest.
        best_of: i32,
    },
    /// Beam-search decoding.
    BeamSearch {
        /// Number of beams to maintain in parallel.
        beam_size: i32,
        /// Beam-search patience factor (≥1.0 = standard beam search).
        patience: f32,
    },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Greedy { best_of: 1 }
    }
}

// ---------------------------------------------------------------------------
// TranscribeParams
// ---------------------------------------------------------------------------

/// All parameters for a single transcription run.
///
/// ```
/// use voice_memo_audio::stt::TranscribeParams;
///
/// let params = TranscribeParams {
///     language: "en".into(),
///     ..TranscribeParams::default()
/// };
/// assert!(params.n_threads >= 1);
/// ```
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// ISO-639-1 language code, or `"auto"` for built-in detection.
    pub language: String,

    pub strategy: SamplingStrategy,

    /// CPU threads handed to the model.  Defaults to [`optimal_threads()`].
    pub n_threads: i32,

    /// Suppress progress output to stderr.
    pub suppress_progress: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            language: "auto".into(),
            strategy: SamplingStrategy::default(),
            n_threads: optimal_threads(),
            suppress_progress: true,
        }
    }
}

impl TranscribeParams {
    /// Parameters for the configured recognizer section.
    pub fn from_config(config: &RecognizerConfig) -> Self {
        Self {
            language: config.language.clone(),
            ..Self::default()
        }
    }

    /// `None` for automatic detection, else the language code.
    pub fn language_hint(&self) -> Option<&str> {
        match self.language.as_str() {
            "" | "auto" => None,
            code => Some(code),
        }
    }
}

/// Number of CPU threads to use for inference, capped at 8.
pub fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

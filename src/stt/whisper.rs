//! whisper.cpp recognizer via `whisper-rs`.  Built with the `whisper`
//! feature.

use std::path::Path;

use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters};

use super::engine::{Recognizer, SttError, MIN_AUDIO_SAMPLES};
use super::transcribe::{SamplingStrategy, TranscribeParams};

/// Recognizer backed by a loaded GGML model.
///
/// Each call runs on its own `WhisperState`, so one instance can be shared
/// behind a [`RecognizerHandle`](super::RecognizerHandle).
pub struct WhisperRecognizer {
    ctx: WhisperContext,
    params: TranscribeParams,
}

impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// SAFETY: the context is only read after loading; all mutable inference
// state lives in the per-call `WhisperState`.
unsafe impl Send for WhisperRecognizer {}
unsafe impl Sync for WhisperRecognizer {}

impl WhisperRecognizer {
    /// Load the model at `model_path`.
    ///
    /// # Errors
    ///
    /// [`SttError::ModelNotFound`] for a missing or non-UTF-8 path,
    /// [`SttError::ContextInit`] when whisper cannot load the file.
    pub fn load(model_path: impl AsRef<Path>, params: TranscribeParams) -> Result<Self, SttError> {
        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(SttError::ModelNotFound(path.display().to_string()));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| SttError::ModelNotFound(format!("non-UTF-8 path: {}", path.display())))?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        log::info!("stt: loaded whisper model {}", path.display());
        Ok(Self { ctx, params })
    }

    fn full_params(&self) -> FullParams<'_, '_> {
        let strategy = match self.params.strategy {
            SamplingStrategy::Greedy { best_of } => whisper_rs::SamplingStrategy::Greedy { best_of },
            SamplingStrategy::BeamSearch {
                beam_size,
                patience,
            } => whisper_rs::SamplingStrategy::BeamSearch {
                beam_size,
                patience,
            },
        };

        let mut fp = FullParams::new(strategy);
        fp.set_language(self.params.language_hint());
        fp.set_n_threads(self.params.n_threads);
        if self.params.suppress_progress {
            fp.set_print_progress(false);
            fp.set_print_realtime(false);
        }
        fp
    }
}

impl Recognizer for WhisperRecognizer {
    fn transcribe(&self, audio: &[f32]) -> Result<String, SttError> {
        if audio.len() < MIN_AUDIO_SAMPLES {
            return Err(SttError::AudioTooShort);
        }

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;
        state
            .full(self.full_params(), audio)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;
        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;
            text.push_str(&segment);
        }
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "whisper"
    }
}

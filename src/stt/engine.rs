//! Recognizer trait, errors and transcript type.
//!
//! # Overview
//!
//! [`Recognizer`] is the seam between the decode pipeline and a speech model.
//! It is object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn Recognizer>` inside a [`RecognizerHandle`](super::RecognizerHandle).
//!
//! `WhisperRecognizer` (feature `whisper`) is the production implementation.
//!
//! [`MockRecognizer`] (available under `#[cfg(test)]`) returns a
//! pre-configured response, so pipeline tests need no model file.

use thiserror::Error;

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// All errors that can arise from the recognizer subsystem.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SttError {
    /// The GGML model file was not found at the given path.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The backend failed to load the model.
    #[error("Recognizer initialisation failed: {0}")]
    ContextInit(String),

    /// An error occurred during the inference pass.
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// The supplied audio buffer is shorter than 0.5 s at 16 kHz.
    #[error("Audio too short, minimum 0.5 s (8 000 samples at 16 kHz)")]
    AudioTooShort,

    /// `transcribe` was called on a handle that was never initialised or has
    /// been shut down.
    #[error("Recognizer not initialised")]
    NotInitialized,

    /// The crate was built without a recognizer backend.
    #[error("No recognizer backend compiled in (enable the `whisper` feature)")]
    BackendUnavailable,
}

// ---------------------------------------------------------------------------
// Recognizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech recognizers.
///
/// # Contract
///
/// - `audio` must be **16 kHz, mono, f32** PCM samples.
/// - Returns `Err(SttError::AudioTooShort)` when `audio.len() < 8_000`.
pub trait Recognizer: Send + Sync {
    /// Transcribe `audio` and return the text transcript.
    fn transcribe(&self, audio: &[f32]) -> Result<String, SttError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str {
        "recognizer"
    }
}

// Compile-time assertion: Box<dyn Recognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Recognizer>) {}
};

/// Minimum audio length: 0.5 s × 16 000 Hz = 8 000 samples.
pub(crate) const MIN_AUDIO_SAMPLES: usize = 8_000;

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// What the pipeline hands back for one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Recognized text, trimmed.
    Text(String),
    /// Nothing decodable or nothing said.
    NoSpeech,
}

impl Transcript {
    /// Wrap recognizer output, treating blank text as no speech.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Transcript::NoSpeech
        } else if trimmed.len() == text.len() {
            Transcript::Text(text)
        } else {
            Transcript::Text(trimmed.to_string())
        }
    }

    /// The text, or `""` for [`Transcript::NoSpeech`].
    pub fn as_str(&self) -> &str {
        match self {
            Transcript::Text(text) => text,
            Transcript::NoSpeech => "",
        }
    }
}

// ---------------------------------------------------------------------------
// MockRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// A test double that returns a pre-configured response without loading any
/// model file.  Records the length of every buffer it was handed.
#[cfg(test)]
pub struct MockRecognizer {
    response: Result<String, SttError>,
    pub calls: std::sync::Mutex<Vec<usize>>,
}

#[cfg(test)]
impl MockRecognizer {
    /// Create a mock that always returns `Ok(text)`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            calls: Default::default(),
        }
    }

    /// Create a mock that always returns `Err(error)`.
    pub fn err(error: SttError) -> Self {
        Self {
            response: Err(error),
            calls: Default::default(),
        }
    }
}

#[cfg(test)]
impl Recognizer for MockRecognizer {
    fn transcribe(&self, audio: &[f32]) -> Result<String, SttError> {
        self.calls.lock().unwrap().push(audio.len());
        if audio.len() < MIN_AUDIO_SAMPLES {
            return Err(SttError::AudioTooShort);
        }
        self.response.clone()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

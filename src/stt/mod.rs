//! Speech recognizer seam.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │ RecognizerHandle  (init / shutdown / transcribe)       │
//! │        │                                               │
//! │        ▼                                               │
//! │ Arc<dyn Recognizer> ◀── WhisperRecognizer (`whisper`)  │
//! │                     ◀── test doubles                   │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use voice_memo_audio::stt::{RecognizerHandle, TranscribeParams, WhisperRecognizer};
//!
//! let handle = RecognizerHandle::new();
//! handle
//!     .init(|| {
//!         let engine = WhisperRecognizer::load("models/ggml-base.bin", TranscribeParams::default())?;
//!         Ok(Arc::new(engine) as _)
//!     })
//!     .expect("model not found");
//!
//! // audio: 16 kHz, mono, f32 PCM from the pipeline
//! let text = handle.transcribe(&vec![0.0; 16_000]).unwrap();
//! println!("{text}");
//! handle.shutdown();
//! ```

pub mod engine;
pub mod handle;
pub mod transcribe;
#[cfg(feature = "whisper")]
pub mod whisper;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use engine::{Recognizer, SttError, Transcript};
pub use handle::RecognizerHandle;
pub use transcribe::{optimal_threads, SamplingStrategy, TranscribeParams};
#[cfg(feature = "whisper")]
pub use whisper::WhisperRecognizer;

#[cfg(test)]
pub use engine::MockRecognizer;

//! Per-recording entry points built on the [`crate::audio`] decode path.
//!
//! # Architecture
//!
//! ```text
//! AudioPipeline (PipelineConfig snapshot)
//!        │
//!        ├─ decode               → session::decode_file → DecodeOutcome
//!        ├─ transcription_input  → decode → resample(target rate)
//!        ├─ waveform             → decode → summarize(bars)   ◀── WaveformCache
//!        ├─ duration_ms          → probe_duration_ms (metadata only)
//!        └─ transcribe           → transcription_input → RecognizerHandle
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use voice_memo_audio::config::PipelineConfig;
//! use voice_memo_audio::pipeline::{AudioPipeline, WaveformCache};
//!
//! let pipeline = AudioPipeline::new(PipelineConfig::default());
//! let memo = Path::new("memo.m4a");
//!
//! let pcm_16k = pipeline.transcription_input(memo);
//! let bars = WaveformCache::new().get_or_compute(&pipeline, memo);
//! println!(
//!     "{} samples, {} bars, {} ms",
//!     pcm_16k.len(),
//!     bars.len(),
//!     pipeline.duration_ms(memo)
//! );
//! ```

pub mod cache;
pub mod outcome;
pub mod runner;
pub mod session;

#[cfg(test)]
pub(crate) mod fixtures;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use cache::WaveformCache;
pub use outcome::{DecodeOutcome, EmptyReason};
pub use runner::AudioPipeline;
pub use session::{decode_file, make_codec};

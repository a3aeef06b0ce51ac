//! Voice-memo audio pipeline.
//!
//! Turns a recorded memo file into the two things a recordings app needs:
//! 16 kHz mono `f32` PCM for the speech recognizer, and a short list of
//! normalized bar heights for drawing a waveform.
//!
//! - [`audio`]: demux, frame decoding, PCM normalization, resampling,
//!   waveform and duration helpers.
//! - [`pipeline`]: per-file entry points that never fail loudly.
//! - [`stt`]: the recognizer seam and its lifecycle handle.
//! - [`config`]: TOML-backed settings.

pub mod audio;
pub mod config;
pub mod pipeline;
pub mod stt;

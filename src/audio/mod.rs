//! Audio decode path: container → compressed chunks → PCM → mono `f32`.
//!
//! # Pipeline
//!
//! ```text
//! ContainerDemuxer ─CompressedChunk─▶ FrameDecoder(FrameCodec) ─DecodedFrame─▶ PcmBuffer
//!                                                                               │
//!                                              ┌────────────────────────────────┤
//!                                              ▼                                ▼
//!                                     resample_to_16k                      summarize
//!                                     (recognizer input)                   (waveform bars)
//!
//! probe_duration_ms  ← container metadata only, no decode
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use voice_memo_audio::audio::{
//!     CancelFlag, ContainerDemuxer, FrameDecoder, InlineCodec, PcmBuffer,
//! };
//!
//! let mut demuxer = ContainerDemuxer::open(Path::new("memo.m4a")).unwrap();
//! let mut decoder = FrameDecoder::configure(
//!     Box::new(InlineCodec::new(8)),
//!     demuxer.codec_params(),
//!     Duration::from_millis(10),
//! )
//! .unwrap();
//!
//! let mut pcm = PcmBuffer::new();
//! decoder
//!     .run(&mut demuxer, &CancelFlag::new(), |frame| {
//!         pcm.append_frame(frame.pcm(), frame.channel_count, frame.sample_rate_hz)
//!     })
//!     .unwrap();
//! println!("{} mono samples", pcm.len());
//! ```

pub mod cancel;
pub mod codec;
pub mod decoder;
pub mod demux;
pub mod duration;
pub mod pcm;
pub mod resample;
pub mod threaded;
pub mod waveform;

pub use cancel::CancelFlag;
pub use codec::{CodecError, CodecOutput, DecodedFrame, Fed, FrameCodec, InlineCodec};
pub use decoder::{DecodeError, DecodeStats, DecoderState, FrameDecoder};
pub use demux::{
    AudioTrackInfo, ChunkSource, CompressedChunk, ContainerDemuxer, DemuxError, DemuxedChunk,
};
pub use duration::probe_duration_ms;
pub use pcm::{normalize, DecodedAudio, PcmBuffer};
pub use resample::{resample, resample_to_16k, TARGET_SAMPLE_RATE};
pub use threaded::ThreadedCodec;
pub use waveform::{summarize, WaveformBars, DEFAULT_BAR_COUNT};

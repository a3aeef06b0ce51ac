//! Codec backends behind a queue-based, poll-driven contract.
//!
//! # Contract
//!
//! ```text
//!            queue_input(chunk, timeout)          dequeue_output(timeout)
//! demuxer ──────────────▶ [ input queue ] ─▶ codec ─▶ [ output queue ] ──────▶ normalizer
//!            Fed::Full(chunk) hands the          CodecOutput::TryAgain when
//!            chunk back when the queue is        nothing is ready yet
//!            still full after `timeout`
//! ```
//!
//! A backend must be configured before use, emits frames in feed order, and
//! signals [`CodecOutput::EndOfStream`] only after the end-of-stream chunk
//! has been consumed and every frame before it drained.  [`FrameCodec::stop`]
//! must be idempotent.
//!
//! Two backends ship with the crate:
//!
//! * [`InlineCodec`]: decodes on the caller's thread, lazily on dequeue.
//! * [`ThreadedCodec`](super::threaded::ThreadedCodec): decodes on a worker
//!   thread behind bounded channels.

use std::collections::VecDeque;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions};
use symphonia::core::formats::Packet;
use thiserror::Error;

use super::demux::CompressedChunk;

// ---------------------------------------------------------------------------
// CodecError
// ---------------------------------------------------------------------------

/// Errors raised by a codec backend.  All of them abort the session.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CodecError {
    /// The codec registry has no decoder for this track.
    #[error("no decoder for codec: {0}")]
    Unsupported(String),

    /// `queue_input` / `dequeue_output` called before `configure`.
    #[error("codec used before configure()")]
    NotConfigured,

    /// Input offered after the end-of-stream chunk.
    #[error("codec input already closed by end-of-stream")]
    InputClosed,

    /// The codec rejected a packet.
    #[error("frame decode failed: {0}")]
    Decode(String),

    /// The decode worker thread could not be started or died.
    #[error("decode worker failed: {0}")]
    Worker(String),
}

// ---------------------------------------------------------------------------
// DecodedFrame / queue results
// ---------------------------------------------------------------------------

/// One block of decoded PCM: interleaved signed 16-bit little-endian.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub interleaved_pcm16: Vec<u8>,
    /// Number of valid bytes in `interleaved_pcm16`.
    pub byte_count: usize,
    pub channel_count: u16,
    pub sample_rate_hz: u32,
    pub presentation_time_us: i64,
}

impl DecodedFrame {
    /// Valid PCM bytes of this frame.
    pub fn pcm(&self) -> &[u8] {
        &self.interleaved_pcm16[..self.byte_count.min(self.interleaved_pcm16.len())]
    }

    /// Give the backing buffer back so the codec can reuse it.
    pub fn into_buffer(self) -> Vec<u8> {
        self.interleaved_pcm16
    }
}

/// Outcome of offering a chunk to the codec input queue.
#[derive(Debug)]
pub enum Fed {
    Accepted,
    /// Queue stayed full for the whole timeout; ownership comes back.
    Full(CompressedChunk),
}

/// Outcome of polling the codec output queue.
#[derive(Debug)]
pub enum CodecOutput {
    Frame(DecodedFrame),
    TryAgain,
    EndOfStream,
}

// ---------------------------------------------------------------------------
// FrameCodec
// ---------------------------------------------------------------------------

/// A stateful codec instance driven by a single-threaded poll loop.
pub trait FrameCodec: Send {
    /// Build the decoder for `params`.  Must precede any queue call.
    fn configure(&mut self, params: &CodecParameters) -> Result<(), CodecError>;

    /// Offer one chunk to the input queue, waiting at most `timeout`.
    fn queue_input(&mut self, chunk: CompressedChunk, timeout: Duration)
        -> Result<Fed, CodecError>;

    /// Take one decoded frame, waiting at most `timeout`.
    fn dequeue_output(&mut self, timeout: Duration) -> Result<CodecOutput, CodecError>;

    /// Hand a drained frame buffer back for reuse.
    fn recycle(&mut self, _buffer: Vec<u8>) {}

    /// Stop decoding and release codec resources.  Idempotent.
    fn stop(&mut self);

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// SoftwareDecoder  (symphonia, shared by both backends)
// ---------------------------------------------------------------------------

/// A symphonia decoder that turns chunks into 16-bit PCM frames.
pub(crate) struct SoftwareDecoder {
    decoder: Box<dyn Decoder>,
    sample_buf: Option<SampleBuffer<i16>>,
    free: Vec<Vec<u8>>,
}

/// Upper bound on pooled frame buffers.
const MAX_POOLED_BUFFERS: usize = 8;

impl SoftwareDecoder {
    pub(crate) fn new(params: &CodecParameters) -> Result<Self, CodecError> {
        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| CodecError::Unsupported(e.to_string()))?;

        Ok(Self {
            decoder,
            sample_buf: None,
            free: Vec::new(),
        })
    }

    /// Decode one chunk.  Returns `None` for chunks that yield no audio
    /// (the bare end-of-stream marker, encoder priming packets).
    pub(crate) fn decode(
        &mut self,
        chunk: CompressedChunk,
    ) -> Result<Option<DecodedFrame>, CodecError> {
        if chunk.bytes.is_empty() {
            return Ok(None);
        }

        let presentation_time_us = chunk.presentation_time_us;
        let packet = Packet::new_from_boxed_slice(
            0,
            chunk.timestamp,
            chunk.duration,
            chunk.bytes.into_boxed_slice(),
        );

        let decoded = self
            .decoder
            .decode(&packet)
            .map_err(|e| CodecError::Decode(e.to_string()))?;

        if decoded.frames() == 0 {
            return Ok(None);
        }

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        let needed = decoded.frames() * channels;

        if self
            .sample_buf
            .as_ref()
            .is_some_and(|buf| buf.capacity() < needed)
        {
            self.sample_buf = None;
        }
        let sample_buf = self
            .sample_buf
            .get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, spec));
        sample_buf.copy_interleaved_ref(decoded);

        let mut bytes = self.free.pop().unwrap_or_default();
        bytes.clear();
        bytes.reserve(sample_buf.samples().len() * 2);
        for sample in sample_buf.samples() {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }

        Ok(Some(DecodedFrame {
            byte_count: bytes.len(),
            interleaved_pcm16: bytes,
            channel_count: channels as u16,
            sample_rate_hz: spec.rate,
            presentation_time_us,
        }))
    }

    pub(crate) fn recycle(&mut self, buffer: Vec<u8>) {
        if self.free.len() < MAX_POOLED_BUFFERS {
            self.free.push(buffer);
        }
    }
}

// ---------------------------------------------------------------------------
// InlineCodec
// ---------------------------------------------------------------------------

/// Software backend that decodes on the calling thread.
///
/// Nothing here ever blocks, so the poll timeouts are ignored.  Decoding is
/// lazy: each `dequeue_output` decodes at most one queued chunk, which gives
/// the same "output trails input" shape as an asynchronous codec.
pub struct InlineCodec {
    capacity: usize,
    decoder: Option<SoftwareDecoder>,
    input: VecDeque<CompressedChunk>,
    output: VecDeque<DecodedFrame>,
    input_closed: bool,
    eos_consumed: bool,
}

impl InlineCodec {
    /// `capacity` bounds the input and output queues (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            decoder: None,
            input: VecDeque::with_capacity(capacity),
            output: VecDeque::with_capacity(capacity),
            input_closed: false,
            eos_consumed: false,
        }
    }
}

impl FrameCodec for InlineCodec {
    fn configure(&mut self, params: &CodecParameters) -> Result<(), CodecError> {
        self.stop();
        self.decoder = Some(SoftwareDecoder::new(params)?);
        Ok(())
    }

    fn queue_input(
        &mut self,
        chunk: CompressedChunk,
        _timeout: Duration,
    ) -> Result<Fed, CodecError> {
        if self.decoder.is_none() {
            return Err(CodecError::NotConfigured);
        }
        if self.input_closed {
            return Err(CodecError::InputClosed);
        }
        if self.input.len() >= self.capacity {
            return Ok(Fed::Full(chunk));
        }

        self.input_closed = chunk.end_of_stream;
        self.input.push_back(chunk);
        Ok(Fed::Accepted)
    }

    fn dequeue_output(&mut self, _timeout: Duration) -> Result<CodecOutput, CodecError> {
        let decoder = self.decoder.as_mut().ok_or(CodecError::NotConfigured)?;

        if self.output.len() < self.capacity {
            if let Some(chunk) = self.input.pop_front() {
                let eos = chunk.end_of_stream;
                if let Some(frame) = decoder.decode(chunk)? {
                    self.output.push_back(frame);
                }
                self.eos_consumed |= eos;
            }
        }

        match self.output.pop_front() {
            Some(frame) => Ok(CodecOutput::Frame(frame)),
            None if self.eos_consumed && self.input.is_empty() => Ok(CodecOutput::EndOfStream),
            None => Ok(CodecOutput::TryAgain),
        }
    }

    fn recycle(&mut self, buffer: Vec<u8>) {
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.recycle(buffer);
        }
    }

    fn stop(&mut self) {
        self.input.clear();
        self.output.clear();
        self.input_closed = false;
        self.eos_consumed = false;
        self.decoder = None;
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::Channels;
    use symphonia::core::codecs::CODEC_TYPE_PCM_S16LE;

    fn mono_params() -> CodecParameters {
        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_PCM_S16LE)
            .with_sample_rate(8_000)
            .with_channels(Channels::FRONT_LEFT)
            .with_bits_per_coded_sample(16)
            .with_bits_per_sample(16)
            .with_max_frames_per_packet(1024);
        params
    }

    fn le_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn chunk_of(samples: &[i16], ts: u64) -> CompressedChunk {
        CompressedChunk {
            bytes: le_bytes(samples),
            presentation_time_us: ts as i64 * 125,
            timestamp: ts,
            duration: samples.len() as u64,
            end_of_stream: false,
        }
    }

    const T: Duration = Duration::from_millis(1);

    #[test]
    fn queue_before_configure_is_rejected() {
        let mut codec = InlineCodec::new(2);
        let err = codec.queue_input(chunk_of(&[1, 2], 0), T).unwrap_err();
        assert_eq!(err, CodecError::NotConfigured);
    }

    #[test]
    fn full_queue_hands_chunk_back() {
        let mut codec = InlineCodec::new(1);
        codec.configure(&mono_params()).unwrap();

        assert!(matches!(
            codec.queue_input(chunk_of(&[1], 0), T).unwrap(),
            Fed::Accepted
        ));
        match codec.queue_input(chunk_of(&[2], 1), T).unwrap() {
            Fed::Full(chunk) => assert_eq!(chunk.timestamp, 1),
            other => panic!("expected Full, got {other:?}"),
        }
    }

    #[test]
    fn pcm_passthrough_decodes_in_order() {
        let mut codec = InlineCodec::new(4);
        codec.configure(&mono_params()).unwrap();

        codec.queue_input(chunk_of(&[100, -100], 0), T).unwrap();
        codec.queue_input(chunk_of(&[200, -200], 2), T).unwrap();
        codec
            .queue_input(CompressedChunk::end_of_stream(500), T)
            .unwrap();

        let mut frames = Vec::new();
        loop {
            match codec.dequeue_output(T).unwrap() {
                CodecOutput::Frame(frame) => frames.push(frame),
                CodecOutput::TryAgain => continue,
                CodecOutput::EndOfStream => break,
            }
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].pcm(), le_bytes(&[100, -100]).as_slice());
        assert_eq!(frames[1].presentation_time_us, 250);
        assert_eq!(frames[0].channel_count, 1);
        assert_eq!(frames[0].sample_rate_hz, 8_000);
    }

    #[test]
    fn input_after_end_of_stream_is_rejected() {
        let mut codec = InlineCodec::new(4);
        codec.configure(&mono_params()).unwrap();
        codec
            .queue_input(CompressedChunk::end_of_stream(0), T)
            .unwrap();

        let err = codec.queue_input(chunk_of(&[1], 0), T).unwrap_err();
        assert_eq!(err, CodecError::InputClosed);
    }

    #[test]
    fn reconfigure_after_end_of_stream_accepts_input() {
        let mut codec = InlineCodec::new(2);
        codec.configure(&mono_params()).unwrap();
        codec
            .queue_input(CompressedChunk::end_of_stream(0), T)
            .unwrap();
        assert!(matches!(
            codec.dequeue_output(T).unwrap(),
            CodecOutput::EndOfStream
        ));

        codec.configure(&mono_params()).unwrap();
        assert!(matches!(
            codec.queue_input(chunk_of(&[7, 8], 0), T).unwrap(),
            Fed::Accepted
        ));
        match codec.dequeue_output(T).unwrap() {
            CodecOutput::Frame(frame) => assert_eq!(frame.pcm(), le_bytes(&[7, 8]).as_slice()),
            other => panic!("expected a frame, got {other:?}"),
        }
        assert!(matches!(
            codec.dequeue_output(T).unwrap(),
            CodecOutput::TryAgain
        ));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut codec = InlineCodec::new(2);
        codec.configure(&mono_params()).unwrap();
        codec.stop();
        codec.stop();
        assert!(matches!(
            codec.dequeue_output(T),
            Err(CodecError::NotConfigured)
        ));
    }
}

//! Frame decoder: drives a [`FrameCodec`] from a [`ChunkSource`] until the
//! end of the stream has been fed *and* drained.
//!
//! ```text
//! Configured ──run()──▶ Feeding ──EOS fed──▶ Draining ──EOS drained──▶ Finished
//! any state ──codec error / source error / cancel──▶ Failed
//! ```
//!
//! The loop is single-threaded and cooperative.  Each iteration checks the
//! [`CancelFlag`], offers at most one chunk to the codec and takes at most
//! one frame back, both bounded by the poll timeout.  The codec is stopped on
//! every exit path; [`Drop`] covers early returns and panics in the frame
//! callback.

use std::path::PathBuf;
use std::time::Duration;

use symphonia::core::codecs::CodecParameters;
use thiserror::Error;

use super::cancel::CancelFlag;
use super::codec::{CodecError, CodecOutput, DecodedFrame, Fed, FrameCodec};
use super::demux::{ChunkSource, CompressedChunk, DemuxError, DemuxedChunk};

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Why a decode session produced no audio.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("file not found: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("no audio track in container")]
    NoAudioTrack,

    /// Container or codec not recognized.
    #[error("unsupported media: {0}")]
    Unsupported(String),

    #[error("decode failed: {0}")]
    DecodeFailure(String),

    #[error("decode cancelled")]
    Cancelled,
}

impl From<DemuxError> for DecodeError {
    fn from(err: DemuxError) -> Self {
        match err {
            DemuxError::FileMissing(path) => DecodeError::FileMissing(path),
            DemuxError::NoAudioTrack => DecodeError::NoAudioTrack,
            DemuxError::Unsupported(what) => DecodeError::Unsupported(what),
            other => DecodeError::DecodeFailure(other.to_string()),
        }
    }
}

impl From<CodecError> for DecodeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Unsupported(what) => DecodeError::Unsupported(what),
            other => DecodeError::DecodeFailure(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// DecoderState
// ---------------------------------------------------------------------------

/// Lifecycle of one decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Codec configured, nothing fed yet.
    Configured,
    /// Source chunks are being fed.
    Feeding,
    /// End of stream fed; remaining frames are being drained.
    Draining,
    /// End of stream drained.  Terminal.
    Finished,
    /// Aborted by an error or cancellation.  Terminal.
    Failed,
}

impl DecoderState {
    /// `true` for states no further `run` can leave.
    ///
    /// ```
    /// use voice_memo_audio::audio::DecoderState;
    ///
    /// assert!(!DecoderState::Configured.is_terminal());
    /// assert!(!DecoderState::Draining.is_terminal());
    /// assert!(DecoderState::Finished.is_terminal());
    /// assert!(DecoderState::Failed.is_terminal());
    /// ```
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecoderState::Finished | DecoderState::Failed)
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            DecoderState::Configured => "configured",
            DecoderState::Feeding => "feeding",
            DecoderState::Draining => "draining",
            DecoderState::Finished => "finished",
            DecoderState::Failed => "failed",
        }
    }
}

/// Counters reported by a completed session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub chunks_fed: u64,
    pub frames_decoded: u64,
    pub pcm_bytes: u64,
}

// ---------------------------------------------------------------------------
// FrameDecoder
// ---------------------------------------------------------------------------

/// One decode session over a configured codec backend.
pub struct FrameDecoder {
    codec: Box<dyn FrameCodec>,
    state: DecoderState,
    poll_timeout: Duration,
}

impl FrameDecoder {
    /// Configure `codec` for `params`.  The codec is stopped again if
    /// configuration fails.
    pub fn configure(
        mut codec: Box<dyn FrameCodec>,
        params: &CodecParameters,
        poll_timeout: Duration,
    ) -> Result<Self, DecodeError> {
        if let Err(err) = codec.configure(params) {
            codec.stop();
            return Err(err.into());
        }

        log::debug!("decoder: {} backend configured", codec.name());
        Ok(Self {
            codec,
            state: DecoderState::Configured,
            poll_timeout,
        })
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Name of the codec backend in use.
    pub fn backend(&self) -> &'static str {
        self.codec.name()
    }

    /// Pump `source` through the codec, calling `on_frame` for every decoded
    /// frame in feed order.
    ///
    /// Returns once the end of stream has been drained.  On error or
    /// cancellation the state becomes [`DecoderState::Failed`] and the codec
    /// is stopped; frames already passed to `on_frame` are the caller's to
    /// discard.
    pub fn run<S, F>(
        &mut self,
        source: &mut S,
        cancel: &CancelFlag,
        mut on_frame: F,
    ) -> Result<DecodeStats, DecodeError>
    where
        S: ChunkSource + ?Sized,
        F: FnMut(&DecodedFrame),
    {
        if self.state != DecoderState::Configured {
            return Err(DecodeError::DecodeFailure(format!(
                "decoder cannot run from state {}",
                self.state.label()
            )));
        }

        let result = self.pump(source, cancel, &mut on_frame);
        self.codec.stop();

        match result {
            Ok(stats) => {
                self.transition(DecoderState::Finished);
                Ok(stats)
            }
            Err(err) => {
                self.transition(DecoderState::Failed);
                Err(err)
            }
        }
    }

    fn pump<S, F>(
        &mut self,
        source: &mut S,
        cancel: &CancelFlag,
        on_frame: &mut F,
    ) -> Result<DecodeStats, DecodeError>
    where
        S: ChunkSource + ?Sized,
        F: FnMut(&DecodedFrame),
    {
        let mut stats = DecodeStats::default();
        let mut pending: Option<CompressedChunk> = None;
        let mut last_pts = 0i64;

        self.transition(DecoderState::Feeding);

        loop {
            if cancel.is_cancelled() {
                return Err(DecodeError::Cancelled);
            }

            // Feed at most one chunk.
            if self.state == DecoderState::Feeding {
                let chunk = match pending.take() {
                    Some(chunk) => chunk,
                    None => match source.next_chunk()? {
                        DemuxedChunk::Chunk(chunk) => chunk,
                        DemuxedChunk::EndOfStream => CompressedChunk::end_of_stream(last_pts),
                    },
                };

                let eos = chunk.end_of_stream;
                let pts = chunk.presentation_time_us;
                match self.codec.queue_input(chunk, self.poll_timeout)? {
                    Fed::Accepted => {
                        last_pts = pts;
                        if eos {
                            self.transition(DecoderState::Draining);
                        } else {
                            stats.chunks_fed += 1;
                        }
                    }
                    Fed::Full(chunk) => pending = Some(chunk),
                }
            }

            // Drain at most one frame.
            match self.codec.dequeue_output(self.poll_timeout)? {
                CodecOutput::Frame(frame) => {
                    on_frame(&frame);
                    stats.frames_decoded += 1;
                    stats.pcm_bytes += frame.byte_count as u64;
                    self.codec.recycle(frame.into_buffer());
                }
                CodecOutput::TryAgain => {}
                CodecOutput::EndOfStream if self.state == DecoderState::Draining => {
                    return Ok(stats);
                }
                CodecOutput::EndOfStream => {
                    return Err(DecodeError::DecodeFailure(
                        "codec signalled end of stream before it was fed".into(),
                    ));
                }
            }
        }
    }

    fn transition(&mut self, next: DecoderState) {
        log::debug!("decoder: {} → {}", self.state.label(), next.label());
        self.state = next;
    }
}

impl Drop for FrameDecoder {
    fn drop(&mut self) {
        self.codec.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

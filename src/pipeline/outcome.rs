//! Typed result of a decode session.
//!
//! Callers above the pipeline get either audio or an explicit "empty" with
//! the reason attached for diagnostics.  They never have to handle an error
//! to stay safe: an empty outcome already behaves as "no data".

use crate::audio::{DecodeError, DecodedAudio};

/// Why an outcome carries no audio.
#[derive(Debug, Clone, PartialEq)]
pub enum EmptyReason {
    /// The session finished but produced no samples.
    NoSamples,
    /// The session failed; any partial PCM was discarded.
    Failed(DecodeError),
}

/// Decoded audio, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Decoded(DecodedAudio),
    Empty(EmptyReason),
}

impl DecodeOutcome {
    /// Absorb a session result, logging why it came back empty.
    pub fn from_result(result: Result<DecodedAudio, DecodeError>) -> Self {
        match result {
            Ok(audio) if audio.samples.is_empty() => {
                log::warn!("pipeline: decode produced no samples");
                DecodeOutcome::Empty(EmptyReason::NoSamples)
            }
            Ok(audio) => DecodeOutcome::Decoded(audio),
            Err(DecodeError::Cancelled) => {
                log::debug!("pipeline: decode cancelled");
                DecodeOutcome::Empty(EmptyReason::Failed(DecodeError::Cancelled))
            }
            Err(err) => {
                log::warn!("pipeline: decode failed: {err}");
                DecodeOutcome::Empty(EmptyReason::Failed(err))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DecodeOutcome::Empty(_))
    }

    pub fn audio(&self) -> Option<&DecodedAudio> {
        match self {
            DecodeOutcome::Decoded(audio) => Some(audio),
            DecodeOutcome::Empty(_) => None,
        }
    }

    pub fn into_audio(self) -> Option<DecodedAudio> {
        match self {
            DecodeOutcome::Decoded(audio) => Some(audio),
            DecodeOutcome::Empty(_) => None,
        }
    }

    /// Decoded samples, or an empty slice.
    pub fn samples(&self) -> &[f32] {
        match self {
            DecodeOutcome::Decoded(audio) => &audio.samples,
            DecodeOutcome::Empty(_) => &[],
        }
    }

    /// The error behind an empty outcome, if there was one.
    pub fn error(&self) -> Option<&DecodeError> {
        match self {
            DecodeOutcome::Empty(EmptyReason::Failed(err)) => Some(err),
            _ => None,
        }
    }
}

//! Metadata-only duration lookup.
//!
//! Reads the container header through the format probe and never builds a
//! codec, so it is cheap enough to call for every row of a recordings list.

use std::path::Path;

use symphonia::core::codecs::CodecParameters;

use super::demux::{probe_container, select_audio_track, DemuxError};

/// Duration of the first audio track in whole milliseconds.
///
/// Returns `0` when the file is missing, unreadable, has no audio track or
/// does not advertise its length.
pub fn probe_duration_ms(path: &Path) -> u64 {
    match try_probe_duration_ms(path) {
        Ok(Some(ms)) => ms,
        Ok(None) => {
            log::debug!("duration: {} has no length metadata", path.display());
            0
        }
        Err(e) => {
            log::debug!("duration: {}: {e}", path.display());
            0
        }
    }
}

fn try_probe_duration_ms(path: &Path) -> Result<Option<u64>, DemuxError> {
    let format = probe_container(path)?;
    let track = select_audio_track(format.tracks()).ok_or(DemuxError::NoAudioTrack)?;
    Ok(duration_from_params(&track.codec_params))
}

/// Length in ms from `n_frames`, via the time base when present and the
/// sample rate otherwise.
fn duration_from_params(params: &CodecParameters) -> Option<u64> {
    let frames = u128::from(params.n_frames?);

    let ms = match (params.time_base, params.sample_rate) {
        (Some(tb), _) if tb.denom > 0 => {
            frames * u128::from(tb.numer) * 1_000 / u128::from(tb.denom)
        }
        (_, Some(rate)) if rate > 0 => frames * 1_000 / u128::from(rate),
        _ => return None,
    };

    Some(u64::try_from(ms).unwrap_or(u64::MAX))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

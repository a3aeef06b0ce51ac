//! 16-bit PCM → mono `f32` normalization and the per-session sample buffer.

use super::demux::AudioTrackInfo;

/// Full-scale divisor for signed 16-bit samples.
const I16_SCALE: f32 = 32_768.0;

/// Convert interleaved signed 16-bit little-endian PCM to mono `f32`.
///
/// Mono input maps each sample to `s / 32768`.  Multi-channel input averages
/// every group of `channel_count` samples (integer mean, truncated toward
/// zero) before scaling.  A trailing odd byte or incomplete frame is
/// ignored, and `channel_count == 0` yields an empty vector.
///
/// ```
/// use voice_memo_audio::audio::normalize;
///
/// let bytes: Vec<u8> = [16_384i16, -16_384].iter().flat_map(|s| s.to_le_bytes()).collect();
/// assert_eq!(normalize(&bytes, 1), vec![0.5, -0.5]);
/// assert_eq!(normalize(&bytes, 2), vec![0.0]);
/// ```
pub fn normalize(bytes: &[u8], channel_count: u16) -> Vec<f32> {
    let channels = usize::from(channel_count);
    if channels == 0 {
        return Vec::new();
    }

    let frame_bytes = channels * 2;
    bytes
        .chunks_exact(frame_bytes)
        .map(|frame| {
            let sum: i32 = frame
                .chunks_exact(2)
                .map(|s| i32::from(i16::from_le_bytes([s[0], s[1]])))
                .sum();
            (sum / channels as i32) as f32 / I16_SCALE
        })
        .collect()
}

// ---------------------------------------------------------------------------
// PcmBuffer / DecodedAudio
// ---------------------------------------------------------------------------

/// Append-only mono buffer filled frame by frame during a decode session.
#[derive(Debug, Default)]
pub struct PcmBuffer {
    samples: Vec<f32>,
    sample_rate_hz: Option<u32>,
    frames: u64,
}

impl PcmBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize one decoded frame and append it.
    ///
    /// The first frame fixes the buffer's sample rate; frames reporting a
    /// different rate are still appended (the codec is authoritative) but
    /// logged.
    pub fn append_frame(&mut self, pcm: &[u8], channel_count: u16, sample_rate_hz: u32) {
        match self.sample_rate_hz {
            None => self.sample_rate_hz = Some(sample_rate_hz),
            Some(rate) if rate != sample_rate_hz => {
                log::warn!("pcm: frame rate changed mid-stream ({rate} → {sample_rate_hz} Hz)");
            }
            Some(_) => {}
        }

        self.samples.extend(normalize(pcm, channel_count));
        self.frames += 1;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Freeze the buffer into the session result.
    ///
    /// The decoded frames' rate wins over the container's advertised rate
    /// when they disagree (e.g. implicit SBR in AAC).
    pub fn finish(self, track: AudioTrackInfo) -> DecodedAudio {
        let sample_rate_hz = self.sample_rate_hz.unwrap_or(track.sample_rate_hz);
        DecodedAudio {
            track,
            sample_rate_hz,
            samples: self.samples,
            frames_decoded: self.frames,
        }
    }
}

/// Mono PCM for a whole recording at its source rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub track: AudioTrackInfo,
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
    pub frames_decoded: u64,
}

impl DecodedAudio {
    /// Length of the decoded audio in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate_hz as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn le(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn track(rate: u32) -> AudioTrackInfo {
        AudioTrackInfo {
            codec_identifier: "aac".into(),
            sample_rate_hz: rate,
            channel_count: 2,
        }
    }

    #[test]
    fn mono_scales_by_full_range() {
        let out = normalize(&le(&[0, 16_384, -32_768, 32_767]), 1);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.5);
        assert_eq!(out[2], -1.0);
        assert!((out[3] - 32_767.0 / 32_768.0).abs() < f32::EPSILON);
    }

    #[test]
    fn stereo_of_identical_channels_equals_mono() {
        let mono = [120i16, -7, 30_000, -30_000, 1];
        let stereo: Vec<i16> = mono.iter().flat_map(|&s| [s, s]).collect();

        assert_eq!(normalize(&le(&stereo), 2), normalize(&le(&mono), 1));
    }

    #[test]
    fn channel_mean_truncates_toward_zero() {
        // (3 + 4) / 2 = 3, (-3 + -4) / 2 = -3
        let out = normalize(&le(&[3, 4, -3, -4]), 2);
        assert_eq!(out, vec![3.0 / 32_768.0, -3.0 / 32_768.0]);
    }

    #[test]
    fn partial_trailing_data_is_ignored() {
        let mut bytes = le(&[100, 200, 300]);
        bytes.push(0x7f);
        assert_eq!(normalize(&bytes, 1).len(), 3);
        // Three samples do not fill two stereo frames.
        assert_eq!(normalize(&bytes, 2).len(), 1);
    }

    #[test]
    fn zero_channels_or_empty_input_yield_nothing() {
        assert!(normalize(&le(&[1, 2]), 0).is_empty());
        assert!(normalize(&[], 1).is_empty());
    }

    #[test]
    fn buffer_appends_and_prefers_frame_rate() {
        let mut buf = PcmBuffer::new();
        buf.append_frame(&le(&[16_384, 16_384]), 2, 48_000);
        buf.append_frame(&le(&[0, 0, -16_384, -16_384]), 2, 48_000);
        assert_eq!(buf.len(), 3);

        let audio = buf.finish(track(24_000));
        assert_eq!(audio.sample_rate_hz, 48_000);
        assert_eq!(audio.samples, vec![0.5, 0.0, -0.5]);
        assert_eq!(audio.frames_decoded, 2);
    }

    #[test]
    fn empty_buffer_falls_back_to_track_rate() {
        let audio = PcmBuffer::new().finish(track(44_100));
        assert!(audio.samples.is_empty());
        assert_eq!(audio.sample_rate_hz, 44_100);
        assert_eq!(audio.duration_secs(), 0.0);
    }
}

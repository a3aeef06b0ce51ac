//! Fixed-size amplitude summary of a recording for compact rendering.
//!
//! [`summarize`] reduces any mono buffer to `bar_count` bars in
//! `[0.2, 1.0]`: peak absolute amplitude per segment, then scaled against
//! the loudest segment so quiet memos still draw a visible shape.
//!
//! Three outputs are distinguishable by a renderer:
//!
//! | input            | bars            |
//! |------------------|-----------------|
//! | empty            | all `0.5`       |
//! | silence          | all `0.2`       |
//! | audio            | `0.2 ..= 1.0`   |
//!
//! # Example
//!
//! ```rust
//! use voice_memo_audio::audio::WaveformBars;
//!
//! // One second of a ramped sine at 16 kHz
//! let audio: Vec<f32> = (0..16_000)
//!     .map(|i| (i as f32 * 0.05).sin() * (i as f32 / 16_000.0))
//!     .collect();
//!
//! let waveform = WaveformBars::compute(&audio, 60);
//! assert_eq!(waveform.len(), 60);
//! for &bar in &waveform.bars {
//!     assert!((0.2..=1.0).contains(&bar));
//! }
//! assert_eq!(waveform.peak(), 1.0);
//! ```

/// Bars per waveform unless configured otherwise.
pub const DEFAULT_BAR_COUNT: usize = 60;

/// Bar value for an empty (undecodable) recording.
const EMPTY_FALLBACK: f32 = 0.5;
/// Lowest bar; silence renders at this height.
const FLOOR: f32 = 0.2;

// ---------------------------------------------------------------------------
// summarize
// ---------------------------------------------------------------------------

/// Reduce `samples` to exactly `bar_count` bars.
///
/// Segments are `max(1, len / bar_count)` samples long.  When the input is
/// shorter than `bar_count`, bars past the end repeat the last segment's
/// peak.  Samples past `bar_count` full segments are not read.
pub fn summarize(samples: &[f32], bar_count: usize) -> Vec<f32> {
    if bar_count == 0 {
        return Vec::new();
    }
    if samples.is_empty() {
        return vec![EMPTY_FALLBACK; bar_count];
    }

    let segment = (samples.len() / bar_count).max(1);

    let mut peaks = Vec::with_capacity(bar_count);
    let mut last = 0.0_f32;
    for bar in 0..bar_count {
        let start = bar * segment;
        if start < samples.len() {
            let end = (start + segment).min(samples.len());
            last = samples[start..end]
                .iter()
                .fold(0.0_f32, |peak, s| peak.max(s.abs()));
        }
        peaks.push(last);
    }

    let global_max = peaks.iter().copied().fold(0.0_f32, f32::max);
    if global_max <= 0.0 {
        return vec![FLOOR; bar_count];
    }

    peaks
        .into_iter()
        .map(|amp| (amp / global_max * 0.8 + FLOOR).clamp(FLOOR, 1.0))
        .collect()
}

// ---------------------------------------------------------------------------
// WaveformBars
// ---------------------------------------------------------------------------

/// Bars ready for a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformBars {
    /// Normalised peak per segment, each in `[0.2, 1.0]`.
    pub bars: Vec<f32>,
}

impl WaveformBars {
    /// Summarize `samples` into `bar_count` bars.  See [`summarize`].
    pub fn compute(samples: &[f32], bar_count: usize) -> Self {
        Self {
            bars: summarize(samples, bar_count),
        }
    }

    /// Number of bars.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Returns `true` when there are no bars.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Tallest bar.
    pub fn peak(&self) -> f32 {
        self.bars.iter().copied().fold(0.0_f32, f32::max)
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.bars
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

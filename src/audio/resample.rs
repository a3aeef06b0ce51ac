//! Sample-rate conversion for the recognizer.
//!
//! Speech recognition wants **16 kHz mono `f32`**.  [`resample`] converts a
//! mono buffer between arbitrary rates; [`resample_to_16k`] is the shortcut
//! the pipeline uses.
//!
//! ## Quality
//!
//! This is plain linear interpolation.  It is not band-limited, so
//! downsampling folds content above the new Nyquist frequency back into the
//! audible band.  For speech at 44.1/48 kHz → 16 kHz this is acceptable.
//!
//! The last one or two output samples interpolate against the final input
//! sample (the upper neighbour index is clamped), which biases them slightly
//! toward it.  Callers relying on exact output should expect this.

use std::borrow::Cow;

/// Sample rate expected by the recognizer.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample mono `input` from `input_rate_hz` to `output_rate_hz`.
///
/// * Equal rates borrow `input` unchanged.
/// * Otherwise the output holds exactly `input.len() * out / in` samples
///   (floor), with output sample `i` read at source position `i * in / out`.
///
/// # Panics
///
/// Panics if either rate is zero.
///
/// # Example
///
/// ```rust
/// use std::borrow::Cow;
/// use voice_memo_audio::audio::resample;
///
/// let same = vec![0.25_f32; 160];
/// assert!(matches!(resample(&same, 16_000, 16_000), Cow::Borrowed(_)));
///
/// let hi = vec![0.5_f32; 480];
/// assert_eq!(resample(&hi, 48_000, 16_000).len(), 160);
/// ```
pub fn resample(input: &[f32], input_rate_hz: u32, output_rate_hz: u32) -> Cow<'_, [f32]> {
    assert!(
        input_rate_hz > 0 && output_rate_hz > 0,
        "sample rates must be positive (got {input_rate_hz} → {output_rate_hz})"
    );

    if input_rate_hz == output_rate_hz {
        return Cow::Borrowed(input);
    }
    if input.is_empty() {
        return Cow::Owned(Vec::new());
    }

    let output_len =
        (input.len() as u64 * u64::from(output_rate_hz) / u64::from(input_rate_hz)) as usize;
    let ratio = f64::from(input_rate_hz) / f64::from(output_rate_hz);
    let last = input.len() - 1;

    let output = (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let idx = (src_pos as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (src_pos - idx as f64) as f32;

            input[idx] * (1.0 - frac) + input[next] * frac
        })
        .collect();

    Cow::Owned(output)
}

/// Resample mono `samples` from `source_rate` Hz to [`TARGET_SAMPLE_RATE`].
///
/// ```rust
/// use voice_memo_audio::audio::resample_to_16k;
///
/// let memo = vec![0.0_f32; 80];
/// let lo = resample_to_16k(&memo, 8_000);
/// assert_eq!(lo.len(), 160);
/// ```
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Cow<'_, [f32]> {
    resample(samples, source_rate, TARGET_SAMPLE_RATE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

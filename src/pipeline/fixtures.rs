//! WAV fixtures for pipeline tests, written with `hound`.

use std::path::{Path, PathBuf};

/// Write interleaved 16-bit PCM as a WAV file and return its path.
pub(crate) fn write_wav_interleaved(
    dir: &Path,
    name: &str,
    channels: u16,
    sample_rate: u32,
    samples: &[i16],
) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
    for &s in samples {
        writer.write_sample(s).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
    path
}

/// Mono WAV.
pub(crate) fn write_wav(dir: &Path, name: &str, sample_rate: u32, samples: &[i16]) -> PathBuf {
    write_wav_interleaved(dir, name, 1, sample_rate, samples)
}

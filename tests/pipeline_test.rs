//! End-to-end checks through the public pipeline API on real WAV files.

use std::path::{Path, PathBuf};

use voice_memo_audio::audio::{CancelFlag, DecodeError};
use voice_memo_audio::config::{CodecBackend, PipelineConfig};
use voice_memo_audio::pipeline::{AudioPipeline, DecodeOutcome, EmptyReason, WaveformCache};

const BACKENDS: [CodecBackend; 2] = [CodecBackend::Inline, CodecBackend::Threaded];

fn write_wav(dir: &Path, name: &str, channels: u16, sample_rate: u32, samples: &[i16]) -> PathBuf {
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

fn pipeline(backend: CodecBackend) -> AudioPipeline {
    let mut config = PipelineConfig::default();
    config.decode.backend = backend;
    AudioPipeline::new(config)
}

#[test]
fn decodes_exact_sample_values() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_wav(dir.path(), "exact.wav", 1, 16_000, &[0, 16_384, -32_768, -16_384]);

    for backend in BACKENDS {
        let outcome = pipeline(backend).decode(&path, &CancelFlag::new());
        let audio = outcome.audio().expect("decoded audio");
        assert_eq!(audio.samples, vec![0.0, 0.5, -1.0, -0.5], "{backend:?}");
        assert_eq!(audio.sample_rate_hz, 16_000);
        assert_eq!(audio.track.channel_count, 1);
    }
}

#[test]
fn stereo_with_equal_channels_matches_mono() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mono: Vec<i16> = (0..8_000).map(|i| ((i % 200) * 100 - 10_000) as i16).collect();
    let stereo: Vec<i16> = mono.iter().flat_map(|&s| [s, s]).collect();
    let mono_path = write_wav(dir.path(), "mono.wav", 1, 8_000, &mono);
    let stereo_path = write_wav(dir.path(), "stereo.wav", 2, 8_000, &stereo);

    for backend in BACKENDS {
        let p = pipeline(backend);
        let cancel = CancelFlag::new();
        let a = p.decode(&mono_path, &cancel);
        let b = p.decode(&stereo_path, &cancel);
        assert_eq!(a.samples().len(), 8_000);
        assert_eq!(a.samples(), b.samples(), "{backend:?}");
    }
}

#[test]
fn one_second_recording_reports_one_second() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_wav(dir.path(), "1s.wav", 1, 16_000, &vec![100; 16_000]);

    let p = AudioPipeline::default();
    assert_eq!(p.duration_ms(&path), 1_000);
    assert_eq!(p.transcription_input(&path).len(), 16_000);
}

#[test]
fn resamples_44k1_to_16k() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_wav(dir.path(), "cd.wav", 1, 44_100, &vec![4_096; 44_100]);

    for backend in BACKENDS {
        let input = pipeline(backend).transcription_input(&path);
        assert_eq!(input.len(), 16_000, "{backend:?}");
        assert!(input.iter().all(|&s| (s - 0.125).abs() < 1e-6));
    }
}

#[test]
fn constant_half_scale_gives_sixty_full_bars() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_wav(dir.path(), "half.wav", 1, 16_000, &vec![16_384; 32_000]);

    assert_eq!(AudioPipeline::default().waveform(&path), vec![1.0; 60]);
}

#[test]
fn silence_gives_floor_bars() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_wav(dir.path(), "quiet.wav", 1, 16_000, &vec![0; 16_000]);

    assert_eq!(AudioPipeline::default().waveform(&path), vec![0.2; 60]);
}

#[test]
fn missing_file_degrades_everywhere() {
    let path = Path::new("/nonexistent/dir/memo.m4a");
    let p = AudioPipeline::default();

    let outcome = p.decode(path, &CancelFlag::new());
    assert!(matches!(
        outcome,
        DecodeOutcome::Empty(EmptyReason::Failed(DecodeError::FileMissing(_)))
    ));
    assert!(p.transcription_input(path).is_empty());
    assert_eq!(p.waveform(path), vec![0.5; 60]);
    assert_eq!(p.duration_ms(path), 0);
}

#[test]
fn garbage_file_is_empty() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("garbage.m4a");
    std::fs::write(&path, b"this is not a media container at all").expect("write");

    let p = AudioPipeline::default();
    let outcome = p.decode(&path, &CancelFlag::new());
    assert!(outcome.is_empty());
    assert!(!matches!(outcome.error(), Some(DecodeError::FileMissing(_))));
    assert!(p.transcription_input(&path).is_empty());
    assert_eq!(p.waveform(&path), vec![0.5; 60]);
    assert_eq!(p.duration_ms(&path), 0);
}

#[test]
fn pre_cancelled_decode_is_empty() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_wav(dir.path(), "c.wav", 1, 16_000, &vec![500; 16_000]);
    let cancel = CancelFlag::new();
    cancel.cancel();

    for backend in BACKENDS {
        let outcome = pipeline(backend).decode(&path, &cancel);
        assert_eq!(
            outcome,
            DecodeOutcome::Empty(EmptyReason::Failed(DecodeError::Cancelled)),
            "{backend:?}"
        );
    }
}

#[test]
fn cache_reuses_bars_for_unchanged_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_wav(dir.path(), "cached.wav", 1, 8_000, &vec![1_000; 8_000]);
    let p = AudioPipeline::default();
    let cache = WaveformCache::new();

    let first = cache.get_or_compute(&p, &path);
    let second = cache.get_or_compute(&p, &path);
    assert_eq!(&*first, &*second);
    assert_eq!(cache.len(), 1);
}

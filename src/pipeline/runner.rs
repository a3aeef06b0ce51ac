//! Pipeline service: the entry points callers use per recording.
//!
//! [`AudioPipeline`] holds a [`PipelineConfig`] snapshot and turns a file
//! path into whatever the caller needs:
//!
//! ```text
//! path ─▶ decode_file ─▶ DecodeOutcome ─┬─▶ resample(target rate) ─▶ transcription_input
//!                                       │                              └─▶ RecognizerHandle ─▶ transcribe
//!                                       └─▶ summarize(bars)        ─▶ waveform
//! path ─▶ probe_duration_ms                                        ─▶ duration_ms
//! ```
//!
//! Every method is synchronous and meant for a worker thread.  The
//! `*_async` variants push the work onto `tokio::task::spawn_blocking` so an
//! async runtime never stalls.  No method returns a pipeline error: failures
//! come back as empty data and are logged.

use std::path::{Path, PathBuf};

use crate::audio::{probe_duration_ms, resample, summarize, CancelFlag, DecodeError};
use crate::config::PipelineConfig;
use crate::stt::engine::MIN_AUDIO_SAMPLES;
use crate::stt::{RecognizerHandle, SttError, Transcript};

use super::outcome::{DecodeOutcome, EmptyReason};
use super::session::decode_file;

/// Decode pipeline bound to one configuration.  Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct AudioPipeline {
    config: PipelineConfig,
}

impl AudioPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Synchronous operations
    // -----------------------------------------------------------------------

    /// Decode `path` to mono PCM at its source rate.
    pub fn decode(&self, path: &Path, cancel: &CancelFlag) -> DecodeOutcome {
        DecodeOutcome::from_result(decode_file(path, &self.config.decode, cancel))
    }

    /// Mono PCM at the configured target rate (16 kHz by default), ready for
    /// the recognizer.  Empty when nothing could be decoded.
    pub fn transcription_input(&self, path: &Path) -> Vec<f32> {
        let Some(audio) = self.decode(path, &CancelFlag::new()).into_audio() else {
            return Vec::new();
        };

        let target = self.config.output.target_sample_rate;
        if audio.sample_rate_hz == target {
            return audio.samples;
        }

        let resampled = resample(&audio.samples, audio.sample_rate_hz, target).into_owned();
        log::debug!(
            "pipeline: resampled {} → {} samples ({} → {target} Hz)",
            audio.samples.len(),
            resampled.len(),
            audio.sample_rate_hz
        );
        resampled
    }

    /// Waveform bars for `path` at the configured bar count.
    ///
    /// An undecodable file yields the flat `0.5` fallback, never an empty
    /// vector.
    pub fn waveform(&self, path: &Path) -> Vec<f32> {
        let outcome = self.decode(path, &CancelFlag::new());
        summarize(outcome.samples(), self.config.output.waveform_bars)
    }

    /// Container-advertised duration in ms, `0` when unknown.
    pub fn duration_ms(&self, path: &Path) -> u64 {
        probe_duration_ms(path)
    }

    /// Decode `path` and hand it to the recognizer behind `handle`.
    ///
    /// A recording with no decodable audio, or less than half a second of
    /// it, is [`Transcript::NoSpeech`] without touching the recognizer.
    pub fn transcribe(
        &self,
        path: &Path,
        handle: &RecognizerHandle,
    ) -> Result<Transcript, SttError> {
        let input = self.transcription_input(path);
        if input.is_empty() {
            log::info!("pipeline: {} has no audio to transcribe", path.display());
            return Ok(Transcript::NoSpeech);
        }
        if input.len() < MIN_AUDIO_SAMPLES {
            log::info!(
                "pipeline: {} is too short to transcribe ({} samples)",
                path.display(),
                input.len()
            );
            return Ok(Transcript::NoSpeech);
        }

        let text = handle.transcribe(&input)?;
        log::debug!("pipeline: transcript = {text:?}");
        Ok(Transcript::from_text(text))
    }

    // -----------------------------------------------------------------------
    // Async wrappers
    // -----------------------------------------------------------------------

    /// [`decode`](Self::decode) on the blocking thread pool.
    pub async fn decode_async(&self, path: PathBuf, cancel: CancelFlag) -> DecodeOutcome {
        let pipeline = self.clone();
        match tokio::task::spawn_blocking(move || pipeline.decode(&path, &cancel)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("pipeline: decode task failed: {e}");
                DecodeOutcome::Empty(EmptyReason::Failed(DecodeError::DecodeFailure(
                    e.to_string(),
                )))
            }
        }
    }

    /// [`transcription_input`](Self::transcription_input) on the blocking
    /// thread pool.
    pub async fn transcription_input_async(&self, path: PathBuf) -> Vec<f32> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.transcription_input(&path))
            .await
            .unwrap_or_else(|e| {
                log::warn!("pipeline: resample task failed: {e}");
                Vec::new()
            })
    }

    /// [`waveform`](Self::waveform) on the blocking thread pool.
    pub async fn waveform_async(&self, path: PathBuf) -> Vec<f32> {
        let pipeline = self.clone();
        let bars = self.config.output.waveform_bars;
        tokio::task::spawn_blocking(move || pipeline.waveform(&path))
            .await
            .unwrap_or_else(|e| {
                log::warn!("pipeline: waveform task failed: {e}");
                summarize(&[], bars)
            })
    }

    /// [`transcribe`](Self::transcribe) on the blocking thread pool.
    pub async fn transcribe_async(
        &self,
        path: PathBuf,
        handle: RecognizerHandle,
    ) -> Result<Transcript, SttError> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.transcribe(&path, &handle))
            .await
            .map_err(|e| SttError::Transcription(format!("transcribe task failed: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::CodecBackend;
    use crate::pipeline::fixtures::{write_wav, write_wav_interleaved};
    use crate::stt::MockRecognizer;

    fn pipeline_with(backend: CodecBackend) -> AudioPipeline {
        let mut config = PipelineConfig::default();
        config.decode.backend = backend;
        AudioPipeline::new(config)
    }

    const MISSING: &str = "/nonexistent/memo.m4a";

    #[test]
    fn transcription_input_resamples_to_16k() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "a.wav", 48_000, &vec![8_192; 48_000]);

        for backend in [CodecBackend::Inline, CodecBackend::Threaded] {
            let input = pipeline_with(backend).transcription_input(&path);
            assert_eq!(input.len(), 16_000, "{backend:?}");
            assert!(input.iter().all(|&s| (s - 0.25).abs() < 1e-6));
        }
    }

    #[test]
    fn transcription_input_at_target_rate_is_unchanged() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "b.wav", 16_000, &[0, 16_384, -16_384]);

        let input = AudioPipeline::default().transcription_input(&path);
        assert_eq!(input, vec![0.0, 0.5, -0.5]);
    }

    #[test]
    fn missing_file_degrades_to_defaults() {
        let pipeline = AudioPipeline::default();
        let path = Path::new(MISSING);

        assert!(pipeline.transcription_input(path).is_empty());
        assert_eq!(pipeline.waveform(path), vec![0.5; 60]);
        assert_eq!(pipeline.duration_ms(path), 0);
        let outcome = pipeline.decode(path, &CancelFlag::new());
        assert!(matches!(outcome.error(), Some(DecodeError::FileMissing(_))));
    }

    #[test]
    fn constant_half_scale_draws_full_bars() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "c.wav", 16_000, &vec![16_384; 32_000]);

        assert_eq!(AudioPipeline::default().waveform(&path), vec![1.0; 60]);
    }

    #[test]
    fn identical_stereo_channels_match_mono() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mono: Vec<i16> = (0..4_000).map(|i| ((i * 37) % 2_000 - 1_000) as i16).collect();
        let stereo: Vec<i16> = mono.iter().flat_map(|&s| [s, s]).collect();
        let mono_path = write_wav(dir.path(), "m.wav", 8_000, &mono);
        let stereo_path = write_wav_interleaved(dir.path(), "s.wav", 2, 8_000, &stereo);

        let pipeline = AudioPipeline::default();
        let cancel = CancelFlag::new();
        assert_eq!(
            pipeline.decode(&mono_path, &cancel).samples(),
            pipeline.decode(&stereo_path, &cancel).samples()
        );
    }

    #[test]
    fn transcribe_empty_recording_skips_recognizer() {
        let mock = Arc::new(MockRecognizer::ok("never"));
        let handle = RecognizerHandle::with_recognizer(mock.clone());

        let transcript = AudioPipeline::default()
            .transcribe(Path::new(MISSING), &handle)
            .expect("transcribe");
        assert_eq!(transcript, Transcript::NoSpeech);
        assert!(mock.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn transcribe_short_memo_is_no_speech() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "short.wav", 16_000, &vec![3_000; 4_000]);
        let mock = Arc::new(MockRecognizer::ok("never"));
        let handle = RecognizerHandle::with_recognizer(mock.clone());

        let transcript = AudioPipeline::default()
            .transcribe(&path, &handle)
            .expect("transcribe");
        assert_eq!(transcript, Transcript::NoSpeech);
        assert!(mock.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn transcribe_at_minimum_length_reaches_recognizer() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "half.wav", 16_000, &vec![3_000; MIN_AUDIO_SAMPLES]);
        let mock = Arc::new(MockRecognizer::ok("call me back"));
        let handle = RecognizerHandle::with_recognizer(mock.clone());

        let transcript = AudioPipeline::default()
            .transcribe(&path, &handle)
            .expect("transcribe");
        assert_eq!(transcript, Transcript::Text("call me back".into()));
        assert_eq!(*mock.calls.lock().unwrap(), vec![MIN_AUDIO_SAMPLES]);
    }

    #[test]
    fn transcribe_hands_16k_audio_to_recognizer() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "t.wav", 44_100, &vec![1_000; 44_100]);
        let mock = Arc::new(MockRecognizer::ok("  pick up the kids  "));
        let handle = RecognizerHandle::with_recognizer(mock.clone());

        let transcript = AudioPipeline::default()
            .transcribe(&path, &handle)
            .expect("transcribe");
        assert_eq!(transcript, Transcript::Text("pick up the kids".into()));
        assert_eq!(*mock.calls.lock().unwrap(), vec![16_000]);
    }

    #[test]
    fn transcribe_without_init_reports_it() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "u.wav", 16_000, &vec![1_000; 16_000]);

        let err = AudioPipeline::default()
            .transcribe(&path, &RecognizerHandle::new())
            .unwrap_err();
        assert_eq!(err, SttError::NotInitialized);
    }

    #[tokio::test]
    async fn async_wrappers_match_sync_results() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "d.wav", 8_000, &vec![4_096; 8_000]);
        let pipeline = pipeline_with(CodecBackend::Threaded);

        let outcome = pipeline.decode_async(path.clone(), CancelFlag::new()).await;
        assert_eq!(outcome.samples().len(), 8_000);

        let input = pipeline.transcription_input_async(path.clone()).await;
        assert_eq!(input.len(), 16_000);

        let bars = pipeline.waveform_async(path.clone()).await;
        assert_eq!(bars, pipeline.waveform(&path));
    }

    #[tokio::test]
    async fn cancelled_async_decode_is_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "e.wav", 8_000, &vec![1; 8_000]);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let outcome = AudioPipeline::default().decode_async(path, cancel).await;
        assert_eq!(outcome.error(), Some(&DecodeError::Cancelled));
    }
}

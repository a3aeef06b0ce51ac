//! One decode session: open → configure → pump → finish.
//!
//! Everything acquired here (demuxer, codec, worker thread) is owned by
//! locals and released when [`decode_file`] returns, whichever way it
//! returns.

use std::path::Path;
use std::time::Instant;

use crate::audio::{
    CancelFlag, ContainerDemuxer, DecodeError, DecodedAudio, FrameCodec, FrameDecoder,
    InlineCodec, PcmBuffer, ThreadedCodec,
};
use crate::config::{CodecBackend, DecodeConfig};

/// Build the codec backend selected by `config`.
pub fn make_codec(config: &DecodeConfig) -> Box<dyn FrameCodec> {
    match config.backend {
        CodecBackend::Inline => Box::new(InlineCodec::new(config.queue_capacity)),
        CodecBackend::Threaded => Box::new(ThreadedCodec::new(config.queue_capacity)),
    }
}

/// Decode the first audio track of `path` into mono `f32` at its source
/// rate.
///
/// # Errors
///
/// Any [`DecodeError`]; partial PCM from a failed session is dropped.
pub fn decode_file(
    path: &Path,
    config: &DecodeConfig,
    cancel: &CancelFlag,
) -> Result<DecodedAudio, DecodeError> {
    let started = Instant::now();

    let mut demuxer = ContainerDemuxer::open(path)?;
    let track = demuxer.track_info().clone();

    let mut decoder = FrameDecoder::configure(
        make_codec(config),
        demuxer.codec_params(),
        config.poll_timeout(),
    )?;

    let mut pcm = PcmBuffer::new();
    let stats = decoder.run(&mut demuxer, cancel, |frame| {
        pcm.append_frame(frame.pcm(), frame.channel_count, frame.sample_rate_hz)
    })?;

    let audio = pcm.finish(track);
    log::info!(
        "session: {} decoded {} chunks → {} frames, {} samples @ {} Hz ({} backend, {:?})",
        path.display(),
        stats.chunks_fed,
        stats.frames_decoded,
        audio.samples.len(),
        audio.sample_rate_hz,
        decoder.backend(),
        started.elapsed()
    );

    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fixtures::{write_wav, write_wav_interleaved};

    fn config(backend: CodecBackend) -> DecodeConfig {
        DecodeConfig {
            backend,
            ..DecodeConfig::default()
        }
    }

    #[test]
    fn make_codec_honours_backend() {
        assert_eq!(make_codec(&config(CodecBackend::Inline)).name(), "inline");
        assert_eq!(make_codec(&config(CodecBackend::Threaded)).name(), "threaded");
    }

    #[test]
    fn decodes_exact_mono_values() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "exact.wav", 8_000, &[0, 16_384, -16_384, 8_192]);

        for backend in [CodecBackend::Inline, CodecBackend::Threaded] {
            let audio =
                decode_file(&path, &config(backend), &CancelFlag::new()).expect("decode");
            assert_eq!(audio.samples, vec![0.0, 0.5, -0.5, 0.25], "{backend:?}");
            assert_eq!(audio.sample_rate_hz, 8_000);
            assert_eq!(audio.track.channel_count, 1);
        }
    }

    #[test]
    fn stereo_is_downmixed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let samples = [16_384, 0, -8_192, -8_192];
        let path = write_wav_interleaved(dir.path(), "st.wav", 2, 8_000, &samples);

        let audio =
            decode_file(&path, &DecodeConfig::default(), &CancelFlag::new()).expect("decode");
        assert_eq!(audio.samples, vec![0.25, -0.25]);
        assert_eq!(audio.track.channel_count, 2);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = decode_file(
            Path::new("/nonexistent/memo.m4a"),
            &DecodeConfig::default(),
            &CancelFlag::new(),
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::FileMissing(_)));
    }

    #[test]
    fn pre_cancelled_session_is_cancelled() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_wav(dir.path(), "c.wav", 8_000, &[1; 800]);
        let cancel = CancelFlag::new();
        cancel.cancel();

        for backend in [CodecBackend::Inline, CodecBackend::Threaded] {
            let err = decode_file(&path, &config(backend), &cancel).unwrap_err();
            assert_eq!(err, DecodeError::Cancelled);
        }
    }
}

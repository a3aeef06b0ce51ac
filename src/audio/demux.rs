//! Container demuxing via `symphonia`.
//!
//! [`ContainerDemuxer`] opens a recording, picks the first audio track and
//! hands out its compressed packets one at a time as [`CompressedChunk`]s.
//! It is a pull iterator: no look-ahead, no rewind.  The underlying file
//! handle lives inside the format reader and is closed when the demuxer is
//! dropped.

use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::codecs::{CodecParameters, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DemuxError
// ---------------------------------------------------------------------------

/// Errors raised while opening or reading a container.
#[derive(Debug, Error)]
pub enum DemuxError {
    /// The path does not reference an existing regular file.
    #[error("file not found: {}", .0.display())]
    FileMissing(PathBuf),

    /// The container parsed, but none of its tracks carries audio.
    #[error("container has no audio track")]
    NoAudioTrack,

    /// No format reader recognised the file.
    #[error("unsupported container: {0}")]
    Unsupported(String),

    #[error("failed to open container: {0}")]
    Io(#[from] std::io::Error),

    /// The format reader failed part-way through the file.
    #[error("container read failed: {0}")]
    Read(#[from] SymphoniaError),
}

impl DemuxError {
    fn from_probe(err: SymphoniaError) -> Self {
        match err {
            SymphoniaError::Unsupported(what) => DemuxError::Unsupported(what.to_string()),
            SymphoniaError::IoError(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                DemuxError::Unsupported("truncated container header".into())
            }
            other => DemuxError::Read(other),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioTrackInfo / CompressedChunk
// ---------------------------------------------------------------------------

/// Format of the selected audio track.  Fixed for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrackInfo {
    /// Short codec name as known to the codec registry (e.g. `"aac"`).
    pub codec_identifier: String,
    /// Sample rate in Hz, always `> 0`.
    pub sample_rate_hz: u32,
    /// Interleaved channel count, always `>= 1`.
    pub channel_count: u16,
}

/// One compressed packet on its way from the demuxer to the codec.
///
/// Moved, never cloned: the codec consumes it exactly once.
#[derive(Debug)]
pub struct CompressedChunk {
    pub bytes: Vec<u8>,
    /// Presentation time in microseconds from the start of the track.
    pub presentation_time_us: i64,
    /// Timestamp in the track's own time base.
    pub timestamp: u64,
    /// Packet duration in the track's own time base.
    pub duration: u64,
    /// Set on the final (possibly empty) chunk of the session.
    pub end_of_stream: bool,
}

impl CompressedChunk {
    /// An empty chunk that only carries the end-of-stream marker.
    pub fn end_of_stream(presentation_time_us: i64) -> Self {
        Self {
            bytes: Vec::new(),
            presentation_time_us,
            timestamp: 0,
            duration: 0,
            end_of_stream: true,
        }
    }
}

/// Result of a single pull from a [`ChunkSource`].
#[derive(Debug)]
pub enum DemuxedChunk {
    Chunk(CompressedChunk),
    EndOfStream,
}

/// Anything that can hand compressed chunks to a frame decoder.
///
/// [`ContainerDemuxer`] is the production source; tests drive the decoder
/// state machine with scripted sources.
pub trait ChunkSource {
    fn next_chunk(&mut self) -> Result<DemuxedChunk, DemuxError>;
}

// ---------------------------------------------------------------------------
// ContainerDemuxer
// ---------------------------------------------------------------------------

/// Pull-based reader over the first audio track of a container file.
pub struct ContainerDemuxer {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    track_id: u32,
    track: AudioTrackInfo,
    params: CodecParameters,
    finished: bool,
}

impl std::fmt::Debug for ContainerDemuxer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerDemuxer")
            .field("path", &self.path)
            .field("track_id", &self.track_id)
            .field("track", &self.track)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl ContainerDemuxer {
    /// Open `path` and select its first audio track.
    ///
    /// # Errors
    ///
    /// - [`DemuxError::FileMissing`] when `path` is not an existing file.
    /// - [`DemuxError::Unsupported`] when no reader recognises the container.
    /// - [`DemuxError::NoAudioTrack`] when the container has no audio stream.
    pub fn open(path: &Path) -> Result<Self, DemuxError> {
        let format = probe_container(path)?;

        let track = select_audio_track(format.tracks()).ok_or(DemuxError::NoAudioTrack)?;
        let track_id = track.id;
        let params = track.codec_params.clone();
        let info = track_info(&params).ok_or(DemuxError::NoAudioTrack)?;

        log::debug!(
            "demux: {} → track {track_id} ({}, {} Hz, {} ch)",
            path.display(),
            info.codec_identifier,
            info.sample_rate_hz,
            info.channel_count
        );

        Ok(Self {
            path: path.to_path_buf(),
            format,
            track_id,
            track: info,
            params,
            finished: false,
        })
    }

    /// Format of the selected track.
    pub fn track_info(&self) -> &AudioTrackInfo {
        &self.track
    }

    /// Full codec parameters, needed to configure a codec backend.
    pub fn codec_params(&self) -> &CodecParameters {
        &self.params
    }

    /// Path this demuxer was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_micros(&self, ts: u64) -> i64 {
        if let Some(tb) = self.params.time_base {
            let t = tb.calc_time(ts);
            return ((t.seconds as f64 + t.frac) * 1_000_000.0) as i64;
        }
        let rate = u64::from(self.track.sample_rate_hz);
        (ts.saturating_mul(1_000_000) / rate) as i64
    }
}

impl ChunkSource for ContainerDemuxer {
    fn next_chunk(&mut self) -> Result<DemuxedChunk, DemuxError> {
        if self.finished {
            return Ok(DemuxedChunk::EndOfStream);
        }

        loop {
            let mut packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.finished = true;
                    return Ok(DemuxedChunk::EndOfStream);
                }
                Err(SymphoniaError::ResetRequired) => {
                    // A chained stream begins here; voice memos carry one.
                    log::debug!("demux: reset required, treating as end of track");
                    self.finished = true;
                    return Ok(DemuxedChunk::EndOfStream);
                }
                Err(e) => return Err(DemuxError::Read(e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let timestamp = packet.ts();
            let duration = packet.dur();
            let bytes = std::mem::take(&mut packet.data).into_vec();

            return Ok(DemuxedChunk::Chunk(CompressedChunk {
                bytes,
                presentation_time_us: self.to_micros(timestamp),
                timestamp,
                duration,
                end_of_stream: false,
            }));
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers (shared with the duration prober)
// ---------------------------------------------------------------------------

/// Open `path` and run the format probe, without touching any codec.
pub(crate) fn probe_container(path: &Path) -> Result<Box<dyn FormatReader>, DemuxError> {
    if !path.is_file() {
        return Err(DemuxError::FileMissing(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DemuxError::FileMissing(path.to_path_buf()),
        _ => DemuxError::Io(e),
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(DemuxError::from_probe)?;

    Ok(probed.format)
}

/// First track with a known codec and a non-zero sample rate.
pub(crate) fn select_audio_track(tracks: &[Track]) -> Option<&Track> {
    tracks.iter().find(|t| {
        t.codec_params.codec != CODEC_TYPE_NULL
            && t.codec_params.sample_rate.is_some_and(|rate| rate > 0)
    })
}

fn track_info(params: &CodecParameters) -> Option<AudioTrackInfo> {
    let sample_rate_hz = params.sample_rate.filter(|rate| *rate > 0)?;
    // Some containers omit the channel layout; the decoded frames carry the
    // real count, so mono is only a placeholder here.
    let channel_count = params
        .channels
        .map(|c| c.count() as u16)
        .filter(|n| *n > 0)
        .unwrap_or(1);
    let codec_identifier = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|d| d.short_name.to_string())
        .unwrap_or_else(|| format!("{:?}", params.codec));

    Some(AudioTrackInfo {
        codec_identifier,
        sample_rate_hz,
        channel_count,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::codecs::CODEC_TYPE_PCM_S16LE;

    fn audio_params(rate: u32) -> CodecParameters {
        let mut params = CodecParameters::new();
        params.for_codec(CODEC_TYPE_PCM_S16LE).with_sample_rate(rate);
        params
    }

    #[test]
    fn select_skips_tracks_without_a_codec() {
        let tracks = vec![
            Track::new(1, CodecParameters::new()),
            Track::new(2, audio_params(44_100)),
        ];
        let picked = select_audio_track(&tracks).expect("audio track");
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn select_returns_none_without_audio() {
        let tracks = vec![
            Track::new(1, CodecParameters::new()),
            Track::new(2, CodecParameters::new()),
        ];
        assert!(select_audio_track(&tracks).is_none());
    }

    #[test]
    fn select_ignores_zero_sample_rate() {
        let tracks = vec![Track::new(1, audio_params(0))];
        assert!(select_audio_track(&tracks).is_none());
    }

    #[test]
    fn track_info_defaults_missing_layout_to_mono() {
        let info = track_info(&audio_params(16_000)).expect("info");
        assert_eq!(info.sample_rate_hz, 16_000);
        assert_eq!(info.channel_count, 1);
        assert!(!info.codec_identifier.is_empty());
    }

    #[test]
    fn open_missing_file_reports_file_missing() {
        let err = ContainerDemuxer::open(Path::new("/nonexistent/memo.m4a")).unwrap_err();
        assert!(matches!(err, DemuxError::FileMissing(_)), "{err}");
    }

    #[test]
    fn open_garbage_reports_unsupported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("not-audio.m4a");
        std::fs::write(&path, b"definitely not an mp4 container").expect("write");

        let err = ContainerDemuxer::open(&path).unwrap_err();
        assert!(
            matches!(err, DemuxError::Unsupported(_) | DemuxError::Read(_)),
            "{err}"
        );
    }

    #[test]
    fn end_of_stream_marker_is_empty() {
        let chunk = CompressedChunk::end_of_stream(1_000);
        assert!(chunk.end_of_stream);
        assert!(chunk.bytes.is_empty());
        assert_eq!(chunk.presentation_time_us, 1_000);
    }
}

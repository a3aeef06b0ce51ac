//! In-memory waveform cache keyed by path and file stamp.
//!
//! Bars are cheap to keep but expensive to recompute (a full decode), so a
//! recordings list can ask for the same file on every redraw.  An entry is
//! reused only while the file's modification time, length and the requested
//! bar count are unchanged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use super::runner::AudioPipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

#[derive(Debug)]
struct Entry {
    stamp: FileStamp,
    bar_count: usize,
    bars: Arc<[f32]>,
}

/// Thread-safe waveform cache.  Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct WaveformCache {
    entries: Arc<Mutex<HashMap<PathBuf, Entry>>>,
}

impl WaveformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached bars for `path`, computing them with `pipeline` on a miss.
    ///
    /// Files that cannot be stat'ed are never cached; they get the
    /// pipeline's fallback bars.
    pub fn get_or_compute(&self, pipeline: &AudioPipeline, path: &Path) -> Arc<[f32]> {
        let bar_count = pipeline.config().output.waveform_bars;
        let Some(stamp) = FileStamp::of(path) else {
            return pipeline.waveform(path).into();
        };

        if let Some(entry) = self.lock().get(path) {
            if entry.stamp == stamp && entry.bar_count == bar_count {
                log::debug!("waveform cache: hit {}", path.display());
                return Arc::clone(&entry.bars);
            }
        }

        // Decode outside the lock; two racing misses both compute, last wins.
        let bars: Arc<[f32]> = pipeline.waveform(path).into();
        self.lock().insert(
            path.to_path_buf(),
            Entry {
                stamp,
                bar_count,
                bars: Arc::clone(&bars),
            },
        );
        bars
    }

    /// Forget `path`.  Returns `true` if it was cached.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.lock().remove(path).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Explicit lifecycle around a shared recognizer.
//!
//! ```text
//! RecognizerHandle::new() ──init(load)──▶ ready ──shutdown()──▶ empty
//!                          (idempotent)           (idempotent)
//! ```
//!
//! The handle is cheap to clone and is passed to whoever needs to
//! transcribe.  Model loading happens once, inside `init`; `transcribe`
//! never loads anything.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::engine::{Recognizer, SttError};

type Slot = Option<Arc<dyn Recognizer>>;

/// Shared, explicitly initialised recognizer.
#[derive(Clone, Default)]
pub struct RecognizerHandle {
    slot: Arc<Mutex<Slot>>,
}

impl std::fmt::Debug for RecognizerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl RecognizerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that is already initialised with `recognizer`.
    pub fn with_recognizer(recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(recognizer))),
        }
    }

    /// Load the recognizer with `load` unless one is already installed.
    ///
    /// Concurrent callers serialize on the handle, so `load` runs at most once
    /// per successful initialisation.
    pub fn init<F>(&self, load: F) -> Result<(), SttError>
    where
        F: FnOnce() -> Result<Arc<dyn Recognizer>, SttError>,
    {
        let mut slot = self.lock();
        if slot.is_some() {
            return Ok(());
        }

        let recognizer = load()?;
        log::info!("stt: {} recognizer ready", recognizer.name());
        *slot = Some(recognizer);
        Ok(())
    }

    /// Release the recognizer.  Returns `true` if one was installed.
    ///
    /// In-flight `transcribe` calls keep their own reference and finish
    /// normally.
    pub fn shutdown(&self) -> bool {
        let released = self.lock().take();
        if let Some(recognizer) = &released {
            log::info!("stt: {} recognizer released", recognizer.name());
        }
        released.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.lock().is_some()
    }

    /// Transcribe 16 kHz mono audio with the installed recognizer.
    pub fn transcribe(&self, audio: &[f32]) -> Result<String, SttError> {
        let recognizer = self.lock().clone().ok_or(SttError::NotInitialized)?;
        recognizer.transcribe(audio)
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

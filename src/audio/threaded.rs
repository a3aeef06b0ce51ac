//! Codec backend that decodes on a dedicated worker thread.
//!
//! ```text
//!  caller thread                         "frame-decoder" thread
//!  ─────────────                         ──────────────────────
//!  queue_input ── sync_channel(cap) ───▶ SoftwareDecoder::decode
//!  dequeue_output ◀── sync_channel(cap) ── WorkerMsg::{Frame, EndOfStream, Failed}
//!  recycle ──────── channel ───────────▶ buffer pool
//! ```
//!
//! Both data queues are bounded, so a slow consumer back-pressures the
//! worker and a slow worker back-pressures the feeder.  `stop` closes every
//! channel before joining, so the worker can never stay blocked on a send.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use symphonia::core::codecs::CodecParameters;

use super::codec::{CodecError, CodecOutput, DecodedFrame, Fed, FrameCodec, SoftwareDecoder};
use super::demux::CompressedChunk;

/// Sleep between `try_send` attempts while the input queue is full.
const SEND_BACKOFF: Duration = Duration::from_millis(1);

enum WorkerMsg {
    Frame(DecodedFrame),
    EndOfStream,
    Failed(CodecError),
}

struct Worker {
    input: SyncSender<CompressedChunk>,
    output: Receiver<WorkerMsg>,
    recycle: Sender<Vec<u8>>,
    handle: JoinHandle<()>,
}

/// Software backend running behind two bounded channels.
pub struct ThreadedCodec {
    capacity: usize,
    worker: Option<Worker>,
    input_closed: bool,
    finished: bool,
}

impl ThreadedCodec {
    /// `capacity` bounds both channels (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            worker: None,
            input_closed: false,
            finished: false,
        }
    }

    fn worker(&self) -> Result<&Worker, CodecError> {
        self.worker.as_ref().ok_or(CodecError::NotConfigured)
    }

    /// Error left behind by a worker that hung up, skipping any frames it
    /// queued before failing.
    fn exit_reason(&self) -> CodecError {
        if let Some(worker) = &self.worker {
            while let Ok(msg) = worker.output.try_recv() {
                if let WorkerMsg::Failed(err) = msg {
                    return err;
                }
            }
        }
        CodecError::Worker("decode worker exited".into())
    }
}

impl FrameCodec for ThreadedCodec {
    fn configure(&mut self, params: &CodecParameters) -> Result<(), CodecError> {
        self.stop();

        // Built here so an unsupported codec fails synchronously.
        let decoder = SoftwareDecoder::new(params)?;

        let (input_tx, input_rx) = mpsc::sync_channel(self.capacity);
        let (output_tx, output_rx) = mpsc::sync_channel(self.capacity);
        let (recycle_tx, recycle_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("frame-decoder".into())
            .spawn(move || decode_worker(decoder, input_rx, output_tx, recycle_rx))
            .map_err(|e| CodecError::Worker(e.to_string()))?;

        self.worker = Some(Worker {
            input: input_tx,
            output: output_rx,
            recycle: recycle_tx,
            handle,
        });
        self.input_closed = false;
        self.finished = false;
        Ok(())
    }

    fn queue_input(
        &mut self,
        chunk: CompressedChunk,
        timeout: Duration,
    ) -> Result<Fed, CodecError> {
        let input = self.worker()?.input.clone();
        if self.input_closed {
            return Err(CodecError::InputClosed);
        }

        let deadline = Instant::now() + timeout;
        let eos = chunk.end_of_stream;
        let mut chunk = chunk;

        loop {
            match input.try_send(chunk) {
                Ok(()) => {
                    self.input_closed = eos;
                    return Ok(Fed::Accepted);
                }
                Err(TrySendError::Full(back)) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(Fed::Full(back));
                    }
                    chunk = back;
                    thread::sleep(SEND_BACKOFF.min(deadline - now));
                }
                Err(TrySendError::Disconnected(_)) => return Err(self.exit_reason()),
            }
        }
    }

    fn dequeue_output(&mut self, timeout: Duration) -> Result<CodecOutput, CodecError> {
        if self.finished {
            return Ok(CodecOutput::EndOfStream);
        }

        match self.worker()?.output.recv_timeout(timeout) {
            Ok(WorkerMsg::Frame(frame)) => Ok(CodecOutput::Frame(frame)),
            Ok(WorkerMsg::EndOfStream) => {
                self.finished = true;
                Ok(CodecOutput::EndOfStream)
            }
            Ok(WorkerMsg::Failed(err)) => Err(err),
            Err(RecvTimeoutError::Timeout) => Ok(CodecOutput::TryAgain),
            Err(RecvTimeoutError::Disconnected) => {
                Err(CodecError::Worker("decode worker exited".into()))
            }
        }
    }

    fn recycle(&mut self, buffer: Vec<u8>) {
        if let Some(worker) = &self.worker {
            let _ = worker.recycle.send(buffer);
        }
    }

    fn stop(&mut self) {
        let Some(Worker {
            input,
            output,
            recycle,
            handle,
        }) = self.worker.take()
        else {
            return;
        };

        drop(input);
        drop(output);
        drop(recycle);

        if handle.join().is_err() {
            log::warn!("decoder: worker thread panicked");
        }
    }

    fn name(&self) -> &'static str {
        "threaded"
    }
}

impl Drop for ThreadedCodec {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker body: decode chunks in arrival order until end of stream, a
/// decode error, or the caller hangs up.
fn decode_worker(
    mut decoder: SoftwareDecoder,
    input: Receiver<CompressedChunk>,
    output: SyncSender<WorkerMsg>,
    recycled: Receiver<Vec<u8>>,
) {
    for chunk in input.iter() {
        while let Ok(buffer) = recycled.try_recv() {
            decoder.recycle(buffer);
        }

        let eos = chunk.end_of_stream;
        match decoder.decode(chunk) {
            Ok(Some(frame)) => {
                if output.send(WorkerMsg::Frame(frame)).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(err) => {
                let _ = output.send(WorkerMsg::Failed(err));
                return;
            }
        }

        if eos {
            let _ = output.send(WorkerMsg::EndOfStream);
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Audio sink: the single consumer of a recording's sample buffers.
//!
//! Capture callbacks may run on arbitrary OS threads. They never touch the
//! file: [`SampleBufferSender::deliver`] only enqueues the buffer, and a
//! dedicated worker thread drains the queue in arrival order into a
//! [`SinkWriter`]. The file is therefore only ever written from one thread,
//! and buffers are appended in exactly the order they were delivered.

mod format;
mod writer;

pub use format::{AudioFormat, SampleKind};
pub use writer::{BufferOutcome, SinkReport, SinkWriter};

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};

use crate::buffer::{SampleBuffer, StreamOutputType};
use crate::event::EventCallback;
use crate::output_path::{remove_existing_file, ResolvedOutput, UniquenessPolicy};
use crate::RecorderError;

/// Messages processed by the sink worker, in order.
enum SinkMessage {
    Buffer(SampleBuffer),
    Finish(oneshot::Sender<SinkReport>),
}

/// Handle given to capture streams for delivering buffers to a sink.
///
/// Cheap to clone and safe to call from any thread. Delivery never blocks.
#[derive(Clone)]
pub struct SampleBufferSender {
    tx: mpsc::UnboundedSender<SinkMessage>,
}

impl SampleBufferSender {
    /// Enqueues a buffer for the sink.
    ///
    /// Buffers of any output type other than [`StreamOutputType::Audio`] are
    /// ignored. Returns `false` if the buffer was not enqueued (wrong output
    /// type, or the sink already shut down).
    pub fn deliver(&self, buffer: SampleBuffer, output_type: StreamOutputType) -> bool {
        if output_type != StreamOutputType::Audio {
            tracing::trace!(?output_type, "ignoring non-audio output");
            return false;
        }
        self.tx.send(SinkMessage::Buffer(buffer)).is_ok()
    }

    /// Returns `true` once the sink has stopped accepting buffers.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for SampleBufferSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleBufferSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// WAV sink for one recording.
///
/// Opening the sink does not create the output file. The file appears when
/// the first usable buffer arrives and fixes the recording's format; see
/// [`SinkWriter`].
pub struct AudioSink {
    path: PathBuf,
    tx: mpsc::UnboundedSender<SinkMessage>,
    worker: Option<JoinHandle<()>>,
    report: Option<SinkReport>,
}

impl AudioSink {
    /// Prepares a sink for `output` and starts its worker thread.
    ///
    /// Under [`UniquenessPolicy::OverwriteAfterDelete`] any regular file
    /// already at the path is deleted first.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Io`] if a pre-existing file cannot be removed
    /// or the worker thread cannot be spawned.
    pub fn open(output: &ResolvedOutput, events: EventCallback) -> Result<Self, RecorderError> {
        if output.policy == UniquenessPolicy::OverwriteAfterDelete {
            remove_existing_file(&output.path)?;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = SinkWriter::new(&output.path, events);
        let worker = std::thread::Builder::new()
            .name("audio-sink".into())
            .spawn(move || run_worker(writer, rx))
            .map_err(|e| RecorderError::io(&output.path, e))?;

        tracing::debug!(path = %output.path.display(), "audio sink opened");
        Ok(Self {
            path: output.path.clone(),
            tx,
            worker: Some(worker),
            report: None,
        })
    }

    /// Output file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A sender for delivering buffers to this sink.
    pub fn sender(&self) -> SampleBufferSender {
        SampleBufferSender {
            tx: self.tx.clone(),
        }
    }

    /// Finalizes the output file after every buffer enqueued so far has been
    /// processed.
    ///
    /// Idempotent: a second call returns the first call's report. Buffers
    /// delivered afterwards are discarded.
    pub async fn finish(&mut self) -> SinkReport {
        if let Some(report) = &self.report {
            return report.clone();
        }

        let (done_tx, done_rx) = oneshot::channel();
        let report = if self.tx.send(SinkMessage::Finish(done_tx)).is_ok() {
            done_rx.await.ok()
        } else {
            None
        };

        if let Some(worker) = self.worker.take() {
            let joined = tokio::task::spawn_blocking(move || worker.join()).await;
            if !matches!(joined, Ok(Ok(()))) {
                tracing::error!(path = %self.path.display(), "audio sink worker panicked");
            }
        }

        let report = report.unwrap_or_else(|| SinkReport::empty(&self.path));
        self.report = Some(report.clone());
        report
    }

    /// Returns `true` once [`finish`](Self::finish) has completed.
    pub fn is_finished(&self) -> bool {
        self.report.is_some()
    }
}

impl Drop for AudioSink {
    fn drop(&mut self) {
        if self.report.is_none() {
            tracing::warn!(
                path = %self.path.display(),
                "audio sink dropped without finish; finalizing on worker"
            );
        }
        // The worker finalizes on its own once every sender is gone; it is
        // not joined here so drop never blocks an async caller.
    }
}

fn run_worker(mut writer: SinkWriter, mut rx: mpsc::UnboundedReceiver<SinkMessage>) {
    while let Some(message) = rx.blocking_recv() {
        match message {
            SinkMessage::Buffer(buffer) => {
                writer.accept(&buffer);
            }
            SinkMessage::Finish(done) => {
                let report = writer.finish();
                rx.close();
                // Drain whatever raced in before close so it is counted.
                while let Ok(SinkMessage::Buffer(buffer)) = rx.try_recv() {
                    writer.accept(&buffer);
                }
                let _ = done.send(writer.report());
                tracing::debug!(
                    path = %writer.path().display(),
                    frames = report.frames_written,
                    "audio sink finished"
                );
                return;
            }
        }
    }
    // Every sender dropped without an explicit finish.
    writer.finish();
}

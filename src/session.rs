//! Recording handle and summary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::{CaptureFilter, CaptureScope, CaptureStream};
use crate::sink::{AudioFormat, AudioSink, SinkReport};
use crate::{RecorderError, SinkError};

/// Outcome of a finished recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    /// Resolved display name of the recorded application.
    pub application_name: String,
    /// Output file path.
    pub path: PathBuf,
    /// Scope the capture actually covered.
    pub scope: CaptureScope,
    /// Format discovered from the first usable buffer.
    pub format: Option<AudioFormat>,
    /// Frames written to the file.
    pub frames_written: u64,
    /// Buffers written to the file.
    pub buffers_written: u64,
    /// Buffers skipped because their data was not ready.
    pub buffers_skipped: u64,
    /// Buffers dropped after a sink failure.
    pub buffers_dropped: u64,
    /// Length of the recorded audio.
    pub duration: Duration,
    /// The sink failure, if the recording hit one.
    pub failure: Option<SinkError>,
}

impl RecordingSummary {
    fn new(application_name: String, scope: CaptureScope, report: SinkReport) -> Self {
        Self {
            application_name,
            duration: report.duration(),
            path: report.path,
            scope,
            format: report.format,
            frames_written: report.frames_written,
            buffers_written: report.buffers_written,
            buffers_skipped: report.buffers_skipped,
            buffers_dropped: report.buffers_dropped,
            failure: report.failure,
        }
    }

    /// Returns `true` if an output file was written.
    pub fn file_created(&self) -> bool {
        self.format.is_some() && self.path.exists()
    }

    /// Turns a recorded sink failure into an error.
    ///
    /// For callers that treat any lost audio as a failed recording. The file
    /// still holds whatever was written before the failure.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Sink`] if the sink failed during the
    /// recording.
    pub fn into_result(self) -> Result<Self, RecorderError> {
        match self.failure {
            Some(error) => Err(RecorderError::Sink(error)),
            None => Ok(self),
        }
    }
}

/// Handle to one in-progress recording.
///
/// Returned by [`Recorder::start_recording`](crate::Recorder::start_recording).
/// Audio flows into the output file until [`stop`](Self::stop) is called.
///
/// # Lifecycle
///
/// 1. Created with the stream already running
/// 2. [`stop`](Self::stop) ends capture and finalizes the file, exactly once
/// 3. Dropping an un-stopped handle also tears capture down and the sink
///    finalizes the file in the background, but prefer `stop`
pub struct RecordingHandle {
    application_name: String,
    output_path: PathBuf,
    filter: CaptureFilter,
    // Dropped before `sink` so the stream's senders are gone when the sink
    // worker sees its channel close.
    stream: Option<Box<dyn CaptureStream>>,
    sink: AudioSink,
    summary: Option<RecordingSummary>,
    stopped: bool,
}

impl RecordingHandle {
    pub(crate) fn new(
        application_name: String,
        output_path: PathBuf,
        filter: CaptureFilter,
        stream: Box<dyn CaptureStream>,
        sink: AudioSink,
    ) -> Self {
        Self {
            application_name,
            output_path,
            filter,
            stream: Some(stream),
            sink,
            summary: None,
            stopped: false,
        }
    }

    /// Resolved display name of the recorded application.
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Output file path.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// The filter the capture stream was opened with.
    pub fn capture_filter(&self) -> &CaptureFilter {
        &self.filter
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Summary of the finished recording, available after `stop` even when
    /// `stop` returned an error.
    pub fn summary(&self) -> Option<&RecordingSummary> {
        self.summary.as_ref()
    }

    /// Stops capture and finalizes the output file.
    ///
    /// Waits for the stream to acknowledge the stop, so every buffer already
    /// delivered is in the file when this returns. The file is finalized even
    /// if the stream reports an error while stopping; that error is returned
    /// afterwards.
    ///
    /// A sink failure during the recording is not an error here: it was
    /// reported through [`RecordingEvent::SinkFailed`](crate::RecordingEvent)
    /// and is recorded in the summary.
    ///
    /// # Errors
    ///
    /// - [`RecorderError::InvalidState`] if called a second time
    /// - [`RecorderError::Subsystem`] if the stream failed to stop
    pub async fn stop(&mut self) -> Result<RecordingSummary, RecorderError> {
        if self.stopped {
            return Err(RecorderError::invalid_state("recording already stopped"));
        }
        self.stopped = true;

        let stop_result = match self.stream.as_mut() {
            Some(stream) => stream.stop().await,
            None => Ok(()),
        };
        self.stream = None;

        let report = self.sink.finish().await;
        let summary =
            RecordingSummary::new(self.application_name.clone(), self.filter.scope(), report);

        match &stop_result {
            Ok(()) => tracing::info!(
                application = %summary.application_name,
                path = %summary.path.display(),
                frames = summary.frames_written,
                duration = ?summary.duration,
                "recording stopped"
            ),
            Err(e) => tracing::error!(
                application = %summary.application_name,
                path = %summary.path.display(),
                error = %e,
                "capture stream failed to stop; file finalized"
            ),
        }

        self.summary = Some(summary.clone());
        stop_result.map(|()| summary)
    }
}

impl std::fmt::Debug for RecordingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingHandle")
            .field("application_name", &self.application_name)
            .field("output_path", &self.output_path)
            .field("scope", &self.filter.scope())
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl Drop for RecordingHandle {
    fn drop(&mut self) {
        if !self.stopped {
            tracing::warn!(
                application = %self.application_name,
                path = %self.output_path.display(),
                "recording dropped without stop"
            );
        }
    }
}

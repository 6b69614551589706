//! Scripted capture backend for tests and demos.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::completion::await_completion;
use super::{
    CapturableApplication, CaptureBackend, CaptureFilter, CaptureStream, Display,
    ShareableContent, Window,
};
use crate::buffer::{SampleBuffer, StreamOutputType};
use crate::config::CaptureConfiguration;
use crate::sink::SampleBufferSender;
use crate::RecorderError;

/// A stream opened through a [`MockBackend`], recorded for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedStream {
    /// Filter the stream was opened with.
    pub filter: CaptureFilter,
    /// Configuration the stream was opened with.
    pub configuration: CaptureConfiguration,
}

#[derive(Debug, Clone, Default)]
struct Failures {
    content: Option<String>,
    open: Option<String>,
    start: Option<String>,
    stop: Option<String>,
}

/// A [`CaptureBackend`] with scripted content and audio.
///
/// Every stream it opens delivers the scripted buffers, in order, on a
/// background thread once started. Without a buffer interval the whole script
/// is delivered before `stop` completes, which keeps recordings
/// deterministic. With an interval the stream behaves like a live source and
/// `stop` cuts it short.
///
/// Clones share the record of opened streams.
///
/// # Example
///
/// ```
/// use app_audio_recorder::capture::MockBackend;
/// use app_audio_recorder::SampleBuffer;
/// use std::time::Duration;
///
/// let backend = MockBackend::new()
///     .with_display(1, 1920, 1080)
///     .with_application("Music", 501)
///     .with_buffer(SampleBuffer::from_planar_f32(
///         48000,
///         &[vec![0.0; 480], vec![0.0; 480]],
///         Duration::ZERO,
///     ));
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    content: ShareableContent,
    supports_application_filter: bool,
    script: Vec<(SampleBuffer, StreamOutputType)>,
    interval: Option<Duration>,
    failures: Failures,
    opened: Arc<Mutex<Vec<OpenedStream>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Creates a backend with no content and per-application filtering.
    pub fn new() -> Self {
        Self {
            content: ShareableContent::default(),
            supports_application_filter: true,
            script: Vec::new(),
            interval: None,
            failures: Failures::default(),
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a display.
    pub fn with_display(mut self, id: u32, width: u32, height: u32) -> Self {
        self.content.displays.push(Display { id, width, height });
        self
    }

    /// Adds a running application.
    pub fn with_application(mut self, name: impl Into<String>, process_id: i32) -> Self {
        self.content
            .applications
            .push(CapturableApplication::new(name, process_id));
        self
    }

    /// Adds a window owned by `owner_process_id`.
    pub fn with_window(mut self, id: u32, owner_process_id: i32, title: Option<&str>) -> Self {
        self.content.windows.push(Window {
            id,
            owner_process_id: Some(owner_process_id),
            title: title.map(str::to_string),
        });
        self
    }

    /// Reports per-application filtering as unavailable.
    pub fn without_application_filter(mut self) -> Self {
        self.supports_application_filter = false;
        self
    }

    /// Appends an audio buffer to the script.
    pub fn with_buffer(self, buffer: SampleBuffer) -> Self {
        self.with_output(buffer, StreamOutputType::Audio)
    }

    /// Appends a buffer of any output type to the script.
    pub fn with_output(mut self, buffer: SampleBuffer, output_type: StreamOutputType) -> Self {
        self.script.push((buffer, output_type));
        self
    }

    /// Paces delivery, one buffer per `interval`.
    pub fn with_buffer_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Makes content enumeration fail.
    pub fn fail_content(mut self, reason: impl Into<String>) -> Self {
        self.failures.content = Some(reason.into());
        self
    }

    /// Makes stream creation fail.
    pub fn fail_open(mut self, reason: impl Into<String>) -> Self {
        self.failures.open = Some(reason.into());
        self
    }

    /// Makes stream start fail.
    pub fn fail_start(mut self, reason: impl Into<String>) -> Self {
        self.failures.start = Some(reason.into());
        self
    }

    /// Makes stream stop report an error after delivery has ended.
    pub fn fail_stop(mut self, reason: impl Into<String>) -> Self {
        self.failures.stop = Some(reason.into());
        self
    }

    /// Streams opened so far, oldest first.
    pub fn opened_streams(&self) -> Vec<OpenedStream> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl CaptureBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn shareable_content(&self) -> Result<ShareableContent, RecorderError> {
        match &self.failures.content {
            Some(reason) => Err(RecorderError::subsystem("enumerate shareable content", reason)),
            None => Ok(self.content.clone()),
        }
    }

    fn supports_application_filter(&self) -> bool {
        self.supports_application_filter
    }

    async fn open_stream(
        &self,
        filter: &CaptureFilter,
        configuration: &CaptureConfiguration,
        output: SampleBufferSender,
    ) -> Result<Box<dyn CaptureStream>, RecorderError> {
        if let Some(reason) = &self.failures.open {
            return Err(RecorderError::subsystem("create capture stream", reason));
        }
        self.opened.lock().push(OpenedStream {
            filter: filter.clone(),
            configuration: *configuration,
        });
        Ok(Box::new(MockStream {
            script: self.script.clone(),
            interval: self.interval,
            start_failure: self.failures.start.clone(),
            stop_failure: self.failures.stop.clone(),
            output: Some(output),
            stop_flag: Arc::new(AtomicBool::new(false)),
            feeder: None,
        }))
    }
}

struct MockStream {
    script: Vec<(SampleBuffer, StreamOutputType)>,
    interval: Option<Duration>,
    start_failure: Option<String>,
    stop_failure: Option<String>,
    output: Option<SampleBufferSender>,
    stop_flag: Arc<AtomicBool>,
    feeder: Option<JoinHandle<()>>,
}

#[async_trait]
impl CaptureStream for MockStream {
    async fn start(&mut self) -> Result<(), RecorderError> {
        if let Some(reason) = &self.start_failure {
            return Err(RecorderError::subsystem("start capture", reason));
        }
        let output = self
            .output
            .take()
            .ok_or_else(|| RecorderError::invalid_state("stream already started"))?;

        let script = std::mem::take(&mut self.script);
        let interval = self.interval;
        let stop_flag = Arc::clone(&self.stop_flag);

        let feeder = std::thread::Builder::new()
            .name("mock-capture".into())
            .spawn(move || {
                for (buffer, output_type) in script {
                    if let Some(interval) = interval {
                        if stop_flag.load(Ordering::Acquire) {
                            break;
                        }
                        std::thread::sleep(interval);
                    }
                    output.deliver(buffer, output_type);
                }
                // With an interval, keep the stream "live" until stopped.
                if interval.is_some() {
                    while !stop_flag.load(Ordering::Acquire) {
                        std::thread::sleep(Duration::from_millis(1));
                    }
                }
            })
            .map_err(|e| RecorderError::subsystem("start capture", e))?;

        self.feeder = Some(feeder);
        tracing::debug!("mock capture started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), RecorderError> {
        self.stop_flag.store(true, Ordering::Release);
        let feeder = self.feeder.take();
        let failure = self.stop_failure.clone();

        await_completion("stop capture", move |handler| {
            std::thread::spawn(move || {
                if let Some(feeder) = feeder {
                    let _ = feeder.join();
                }
                match failure {
                    Some(reason) => handler.fail(RecorderError::subsystem("stop capture", reason)),
                    None => handler.succeed(()),
                }
            });
        })
        .await
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
    }
}

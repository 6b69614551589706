//! Capture session controller.

use std::sync::Arc;

use chrono::Local;

use crate::capture::{CapturableApplication, CaptureBackend, CaptureFilter, ShareableContent};
use crate::config::{CaptureConfiguration, RecorderConfig};
use crate::event::{log_events, EventCallback, RecordingEvent};
use crate::output_path::resolve_output_path;
use crate::session::RecordingHandle;
use crate::sink::AudioSink;
use crate::target::{match_application, sort_applications};
use crate::RecorderError;

/// Starts recordings of individual applications.
///
/// A `Recorder` owns a [`CaptureBackend`] and turns "record this app into
/// that file" into a live [`RecordingHandle`]. It holds no per-recording
/// state, so one recorder can start any number of recordings.
///
/// # Example
///
/// ```
/// use app_audio_recorder::capture::MockBackend;
/// use app_audio_recorder::Recorder;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), app_audio_recorder::RecorderError> {
/// let dir = tempfile::tempdir().unwrap();
/// let recorder = Recorder::new(
///     MockBackend::new()
///         .with_display(1, 1920, 1080)
///         .with_application("Music", 501),
/// );
///
/// let output = dir.path().join("music.wav");
/// let mut handle = recorder
///     .start_recording("music", Some(output.to_str().unwrap()))
///     .await?;
/// assert_eq!(handle.application_name(), "Music");
///
/// let summary = handle.stop().await?;
/// assert_eq!(summary.frames_written, 0);
/// # Ok(())
/// # }
/// ```
pub struct Recorder {
    backend: Arc<dyn CaptureBackend>,
    config: RecorderConfig,
    events: EventCallback,
}

impl Recorder {
    /// Creates a recorder with the default configuration.
    ///
    /// Runtime events are logged through `tracing` until
    /// [`on_event`](Self::on_event) installs a callback.
    pub fn new(backend: impl CaptureBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
            config: RecorderConfig::default(),
            events: log_events(),
        }
    }

    /// Creates a recorder backed by ScreenCaptureKit.
    #[cfg(all(target_os = "macos", feature = "screencapturekit"))]
    pub fn screencapturekit() -> Self {
        Self::new(crate::capture::ScreenCaptureKitBackend::new())
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: RecorderConfig) -> Self {
        self.config = config;
        self
    }

    /// Installs the callback receiving [`RecordingEvent`]s.
    pub fn on_event(mut self, callback: EventCallback) -> Self {
        self.events = callback;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Name of the capture backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Lists capturable applications, sorted by name ignoring case.
    ///
    /// Applications without a display name are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Subsystem`] if enumeration fails.
    pub async fn list_applications(&self) -> Result<Vec<CapturableApplication>, RecorderError> {
        let content = self.backend.shareable_content().await?;
        Ok(named_applications(&content))
    }

    /// Like [`list_applications`](Self::list_applications), names only.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Subsystem`] if enumeration fails.
    pub async fn list_application_names(&self) -> Result<Vec<String>, RecorderError> {
        Ok(self
            .list_applications()
            .await?
            .into_iter()
            .map(|app| app.name)
            .collect())
    }

    /// Starts recording the application best matching `app_name`.
    ///
    /// `output` names the WAV file; when absent, a name is synthesized from
    /// the application name and the current local time. See
    /// [`RecorderConfig`] for how existing files are treated.
    ///
    /// On any error nothing keeps running and no handle is returned.
    ///
    /// # Errors
    ///
    /// - [`RecorderError::NotFound`] if there is no display or no matching
    ///   application
    /// - [`RecorderError::Io`] if the output path cannot be prepared
    /// - [`RecorderError::Subsystem`] if enumeration, stream creation or
    ///   start fails
    pub async fn start_recording(
        &self,
        app_name: &str,
        output: Option<&str>,
    ) -> Result<RecordingHandle, RecorderError> {
        let content = self.backend.shareable_content().await?;

        let display = *content
            .displays
            .first()
            .ok_or_else(|| RecorderError::not_found("no display to anchor capture"))?;

        let applications = named_applications(&content);
        let application = match_application(app_name, &applications)
            .ok_or_else(|| RecorderError::not_found(format!("no application named '{app_name}'")))?
            .clone();

        let started_at = Local::now().naive_local();
        let resolved = resolve_output_path(output, &application.name, started_at, &self.config)?;

        let mut sink = AudioSink::open(&resolved, Arc::clone(&self.events))?;

        let configuration = CaptureConfiguration::default();
        let filter = CaptureFilter::choose(
            &application,
            display,
            &content,
            self.backend.supports_application_filter(),
        );
        if filter.is_widened() {
            (self.events)(RecordingEvent::CaptureScopeWidened {
                application: application.name.clone(),
                scope: filter.scope(),
            });
        }

        let mut stream = match self
            .backend
            .open_stream(&filter, &configuration, sink.sender())
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                sink.finish().await;
                return Err(e);
            }
        };

        if let Err(e) = stream.start().await {
            drop(stream);
            sink.finish().await;
            return Err(e);
        }

        tracing::info!(
            application = %application.name,
            pid = application.process_id,
            path = %resolved.path.display(),
            scope = %filter.scope(),
            backend = self.backend.name(),
            "recording started"
        );

        Ok(RecordingHandle::new(
            application.name,
            resolved.path,
            filter,
            stream,
            sink,
        ))
    }
}

fn named_applications(content: &ShareableContent) -> Vec<CapturableApplication> {
    let mut applications: Vec<_> = content
        .applications
        .iter()
        .filter(|app| !app.name.trim().is_empty())
        .cloned()
        .collect();
    sort_applications(&mut applications);
    applications
}

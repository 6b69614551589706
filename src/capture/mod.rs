//! Boundary to the OS media subsystem.
//!
//! A [`CaptureBackend`] enumerates what can be captured and opens
//! [`CaptureStream`]s bound to a [`CaptureFilter`]. Streams push their
//! buffers into the recording's sink through a [`SampleBufferSender`].
//!
//! Backends:
//!
//! - [`MockBackend`]: scripted content and buffers, for tests and demos
//! - `ScreenCaptureKitBackend`: macOS ScreenCaptureKit (feature
//!   `screencapturekit`)

mod completion;
mod filter;
mod mock;
#[cfg(all(target_os = "macos", feature = "screencapturekit"))]
mod screencapturekit;

pub use completion::{await_completion, CompletionHandler};
pub use filter::{CaptureFilter, CaptureScope};
pub use mock::{MockBackend, OpenedStream};
#[cfg(all(target_os = "macos", feature = "screencapturekit"))]
pub use screencapturekit::ScreenCaptureKitBackend;

use async_trait::async_trait;

use crate::config::CaptureConfiguration;
use crate::sink::SampleBufferSender;
use crate::RecorderError;

/// A running application whose audio can be captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturableApplication {
    /// Display name.
    pub name: String,
    /// OS process identifier.
    pub process_id: i32,
    /// Bundle identifier, where the platform has one.
    pub bundle_identifier: Option<String>,
}

impl CapturableApplication {
    /// Creates an application entry without a bundle identifier.
    pub fn new(name: impl Into<String>, process_id: i32) -> Self {
        Self {
            name: name.into(),
            process_id,
            bundle_identifier: None,
        }
    }

    /// Sets the bundle identifier.
    pub fn with_bundle_identifier(mut self, bundle_identifier: impl Into<String>) -> Self {
        self.bundle_identifier = Some(bundle_identifier.into());
        self
    }
}

/// A display capture can be anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Display {
    /// OS display identifier.
    pub id: u32,
    /// Width in points.
    pub width: u32,
    /// Height in points.
    pub height: u32,
}

/// An on-screen window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// OS window identifier.
    pub id: u32,
    /// Process that owns the window, if known.
    pub owner_process_id: Option<i32>,
    /// Window title, if any.
    pub title: Option<String>,
}

/// Snapshot of what the media subsystem can currently capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareableContent {
    /// Running applications.
    pub applications: Vec<CapturableApplication>,
    /// Attached displays, primary first.
    pub displays: Vec<Display>,
    /// On-screen windows.
    pub windows: Vec<Window>,
}

impl ShareableContent {
    /// The first window owned by `process_id`.
    pub fn first_window_of(&self, process_id: i32) -> Option<&Window> {
        self.windows
            .iter()
            .find(|w| w.owner_process_id == Some(process_id))
    }
}

/// The OS media subsystem.
///
/// Implementations must be cheap to share; the [`Recorder`](crate::Recorder)
/// holds one for its whole life and calls it from async tasks.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Enumerates capturable applications, displays and windows.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Subsystem`] if the subsystem refuses.
    async fn shareable_content(&self) -> Result<ShareableContent, RecorderError>;

    /// Whether filters can be scoped to a single application.
    ///
    /// When this returns `false`, [`CaptureFilter::choose`] falls back to a
    /// window or a whole display.
    fn supports_application_filter(&self) -> bool;

    /// Creates a stream that will deliver audio matching `filter` to `output`
    /// once started.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::Subsystem`] if the stream cannot be created.
    async fn open_stream(
        &self,
        filter: &CaptureFilter,
        configuration: &CaptureConfiguration,
        output: SampleBufferSender,
    ) -> Result<Box<dyn CaptureStream>, RecorderError>;
}

/// A live capture stream.
///
/// Both methods complete only when the subsystem acknowledges the request.
/// After `stop` returns, no buffer callback of this stream is still running.
#[async_trait]
pub trait CaptureStream: Send {
    /// Starts delivering buffers.
    async fn start(&mut self) -> Result<(), RecorderError>;

    /// Stops delivering buffers and waits for in-flight callbacks to finish.
    async fn stop(&mut self) -> Result<(), RecorderError>;
}

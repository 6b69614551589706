//! Runtime events emitted while a recording is running.
//!
//! Events are non-fatal notifications. The recording keeps going after any of
//! them is emitted (a failed sink keeps dropping buffers until `stop`). They
//! are the asynchronous error channel of the engine: a sink failure is
//! reported here exactly once.

use std::path::PathBuf;
use std::sync::Arc;

use crate::capture::CaptureScope;
use crate::sink::AudioFormat;
use crate::SinkError;

/// Runtime events emitted during a recording.
///
/// # Example
///
/// ```
/// use app_audio_recorder::RecordingEvent;
///
/// fn handle_event(event: RecordingEvent) {
///     match event {
///         RecordingEvent::FormatDiscovered { path, format } => {
///             eprintln!("{}: {}", path.display(), format);
///         }
///         RecordingEvent::SinkFailed { path, error } => {
///             eprintln!("{} stopped receiving audio: {}", path.display(), error);
///         }
///         RecordingEvent::CaptureScopeWidened { application, scope } => {
///             eprintln!("capturing {} instead of {} alone", scope, application);
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum RecordingEvent {
    /// The first usable buffer fixed the recording's format and the output
    /// file was created.
    FormatDiscovered {
        /// Output file.
        path: PathBuf,
        /// Format written to the WAV header.
        format: AudioFormat,
    },

    /// The sink failed permanently. Later buffers are dropped; audio written
    /// before the failure stays in the file.
    SinkFailed {
        /// Output file.
        path: PathBuf,
        /// What went wrong.
        error: SinkError,
    },

    /// Per-application filtering was unavailable, so capture covers more than
    /// the requested application.
    CaptureScopeWidened {
        /// The application the caller asked for.
        application: String,
        /// The scope actually captured.
        scope: CaptureScope,
    },
}

/// Callback type for receiving runtime events.
///
/// Callbacks run on the sink's worker thread (or the caller's task for
/// start-time events) and should return quickly.
pub type EventCallback = Arc<dyn Fn(RecordingEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use app_audio_recorder::{event_callback, RecordingEvent};
///
/// let callback = event_callback(|event: RecordingEvent| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(RecordingEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The callback used when none is installed: every event goes to `tracing`.
pub fn log_events() -> EventCallback {
    event_callback(|event| match event {
        RecordingEvent::FormatDiscovered { path, format } => {
            tracing::info!(path = %path.display(), %format, "recording format discovered");
        }
        RecordingEvent::SinkFailed { path, error } => {
            tracing::error!(path = %path.display(), %error, "recording sink failed; dropping further audio");
        }
        RecordingEvent::CaptureScopeWidened { application, scope } => {
            tracing::warn!(%application, %scope, "per-application capture unavailable; capture scope widened");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_recording_event_debug() {
        let event = RecordingEvent::SinkFailed {
            path: PathBuf::from("/tmp/a.wav"),
            error: SinkError::format("no stream description"),
        };
        let debug = format!("{event:?}");
        assert!(debug.contains("SinkFailed"));
        assert!(debug.contains("no stream description"));
    }

    #[test]
    fn test_event_callback_helper() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let callback = event_callback(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        callback(RecordingEvent::CaptureScopeWidened {
            application: "Music".to_string(),
            scope: CaptureScope::Display,
        });
        callback(RecordingEvent::CaptureScopeWidened {
            application: "Music".to_string(),
            scope: CaptureScope::Window,
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_log_events_does_not_panic_without_subscriber() {
        let callback = log_events();
        callback(RecordingEvent::SinkFailed {
            path: PathBuf::from("/tmp/a.wav"),
            error: SinkError::write("/tmp/a.wav", "disk full"),
        });
    }
}

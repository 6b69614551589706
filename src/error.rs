//! Error types for app-audio-recorder.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`RecorderError`]): abort the operation in progress
//!   (listing applications, starting or stopping a recording)
//! - **Session errors** ([`SinkError`]): a recording's audio sink failed while
//!   buffers were flowing. These are surfaced once via the
//!   [`EventCallback`](crate::EventCallback) and recorded in the
//!   [`RecordingSummary`](crate::RecordingSummary), never returned per buffer.

use std::path::PathBuf;

/// Fatal errors returned from [`Recorder`](crate::Recorder) and
/// [`RecordingHandle`](crate::RecordingHandle) operations.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// No matching application, or no display to anchor capture against.
    #[error("not found: {what}")]
    NotFound {
        /// What could not be found.
        what: String,
    },

    /// The audio sink failed (format discovery or writing).
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The OS media subsystem reported a failure.
    #[error("{context} failed: {reason}")]
    Subsystem {
        /// The operation that failed (e.g. "start capture").
        context: String,
        /// The subsystem's own description of the failure.
        reason: String,
    },

    /// The caller violated the recording protocol (e.g. stopped twice).
    #[error("invalid state: {reason}")]
    InvalidState {
        /// What was wrong.
        reason: String,
    },

    /// File system error while preparing the output path.
    #[error("file error: {path}: {source}")]
    Io {
        /// Path that was being touched.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RecorderError {
    /// Creates a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates a subsystem error for the given operation.
    pub fn subsystem(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::Subsystem {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Creates a file error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for [`RecorderError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`RecorderError::InvalidState`].
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

/// Permanent failure of a recording's audio sink.
///
/// Once a sink enters this state it drops every later buffer. Whatever was
/// written before the failure stays in the file and remains playable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The first buffer's stream description was missing or unusable.
    #[error("unsupported audio format: {reason}")]
    Format {
        /// Why the format could not be used.
        reason: String,
    },

    /// A buffer could not be copied or appended to the file.
    #[error("write failed: {path}: {reason}")]
    Write {
        /// Output file path.
        path: PathBuf,
        /// Description of what went wrong.
        reason: String,
    },
}

impl SinkError {
    /// Creates a format error with the given reason.
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    /// Creates a write error for the given path.
    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for [`SinkError::Format`].
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}

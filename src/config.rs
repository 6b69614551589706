//! Configuration types for recordings.

use std::path::PathBuf;

use crate::output_path::UniquenessPolicy;

/// Sample rate requested from the capture stream.
pub const CAPTURE_SAMPLE_RATE: u32 = 48_000;

/// Channel count requested from the capture stream.
pub const CAPTURE_CHANNELS: u16 = 2;

/// Number of buffers the capture stream may queue internally.
pub const CAPTURE_QUEUE_DEPTH: u32 = 4;

/// Stream settings requested from the OS media subsystem.
///
/// The values are fixed; a fresh configuration is built for every recording.
/// They are requests, not guarantees: the format actually written is the one
/// discovered from the first buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfiguration {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Requested channel count.
    pub channels: u16,
    /// Exclude this process's own audio from the capture.
    pub excludes_current_process_audio: bool,
    /// Internal buffering depth of the stream.
    pub queue_depth: u32,
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: CAPTURE_SAMPLE_RATE,
            channels: CAPTURE_CHANNELS,
            excludes_current_process_audio: true,
            queue_depth: CAPTURE_QUEUE_DEPTH,
        }
    }
}

/// Configuration for [`Recorder`](crate::Recorder) behavior.
///
/// Use [`RecorderConfig::default()`] for the usual split: names supplied by
/// the caller overwrite an existing file, generated names never do.
///
/// # Example
///
/// ```
/// use app_audio_recorder::{RecorderConfig, UniquenessPolicy};
///
/// let config = RecorderConfig {
///     explicit_output_policy: UniquenessPolicy::AutoSuffix,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Policy for output names the caller supplied.
    ///
    /// Default: [`UniquenessPolicy::OverwriteAfterDelete`]
    pub explicit_output_policy: UniquenessPolicy,

    /// Policy for names synthesized from the application name.
    ///
    /// Default: [`UniquenessPolicy::AutoSuffix`]
    pub generated_output_policy: UniquenessPolicy,

    /// Directory relative output paths are resolved against.
    ///
    /// Default: `None` (the process's current directory at start time)
    pub working_directory: Option<PathBuf>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            explicit_output_policy: UniquenessPolicy::OverwriteAfterDelete,
            generated_output_policy: UniquenessPolicy::AutoSuffix,
            working_directory: None,
        }
    }
}

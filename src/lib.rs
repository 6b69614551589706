//! # app-audio-recorder
//!
//! Record the audio output of one running application to a WAV file, with no
//! virtual audio device.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use app_audio_recorder::Recorder;
//!
//! let recorder = Recorder::screencapturekit();
//!
//! for name in recorder.list_application_names().await? {
//!     println!("{name}");
//! }
//!
//! // No output name: writes e.g. ./Apple_Music_20240101_120000.wav
//! let mut handle = recorder.start_recording("music", None).await?;
//! tokio::signal::ctrl_c().await?;
//! let summary = handle.stop().await?;
//! println!("{:?} of audio in {}", summary.duration, summary.path.display());
//! ```
//!
//! ## Architecture
//!
//! - **Capture backend**: the OS media subsystem behind [`CaptureBackend`].
//!   Its stream pushes [`SampleBuffer`]s from arbitrary threads.
//! - **Audio sink**: one worker thread per recording drains a channel of
//!   buffers, in arrival order, into the WAV file. It is the only code that
//!   touches the file.
//! - **Lazy format**: the WAV header is written from the format embedded in
//!   the first usable buffer, so the file always matches what the platform
//!   actually delivers.
//!
//! A failure inside the sink never aborts the recording. It is reported once
//! as [`RecordingEvent::SinkFailed`]; later buffers are dropped and whatever
//! was written stays playable.

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::missing_panics_doc)]

pub mod buffer;
pub mod capture;
mod config;
mod error;
mod event;
pub mod output_path;
pub mod platform;
mod recorder;
mod session;
pub mod sink;
pub mod target;

pub use buffer::{SampleBuffer, StreamDescription, StreamOutputType};
pub use capture::{
    CapturableApplication, CaptureBackend, CaptureFilter, CaptureScope, CaptureStream,
    MockBackend, ShareableContent,
};
pub use config::{CaptureConfiguration, RecorderConfig};
pub use error::{RecorderError, SinkError};
pub use event::{event_callback, log_events, EventCallback, RecordingEvent};
pub use output_path::{ResolvedOutput, UniquenessPolicy};
pub use recorder::Recorder;
pub use session::{RecordingHandle, RecordingSummary};
pub use sink::{AudioFormat, AudioSink, SampleBufferSender, SampleKind};

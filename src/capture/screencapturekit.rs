//! ScreenCaptureKit backend for per-application audio capture on macOS.
//!
//! Requires macOS 13+ for audio. Per-application filters are always
//! available here, so [`CaptureFilter::choose`] only falls back when the
//! caller builds filters for an older API level by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use screencapturekit::cm::CMSampleBuffer;
use screencapturekit::shareable_content::SCShareableContent;
use screencapturekit::stream::configuration::SCStreamConfiguration;
use screencapturekit::stream::content_filter::SCContentFilter;
use screencapturekit::stream::output_trait::SCStreamOutputTrait;
use screencapturekit::stream::output_type::SCStreamOutputType;
use screencapturekit::stream::SCStream;

use super::completion::await_completion;
use super::{
    CapturableApplication, CaptureBackend, CaptureFilter, CaptureStream, Display,
    ShareableContent, Window,
};
use crate::buffer::{SampleBuffer, StreamDescription, StreamOutputType};
use crate::config::CaptureConfiguration;
use crate::platform::screen_capture_permission;
use crate::sink::SampleBufferSender;
use crate::RecorderError;

/// Video dimensions requested alongside audio; video cannot be disabled.
const MIN_VIDEO_DIMENSION: u32 = 2;

/// [`CaptureBackend`] backed by ScreenCaptureKit.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenCaptureKitBackend;

impl ScreenCaptureKitBackend {
    /// Creates the backend. No system call is made until first use.
    pub fn new() -> Self {
        Self
    }
}

/// Fetches shareable content off the async runtime.
async fn fetch_content(context: &'static str) -> Result<SCShareableContent, RecorderError> {
    let fetched = tokio::task::spawn_blocking(SCShareableContent::get)
        .await
        .map_err(|e| RecorderError::subsystem(context, e))?;

    fetched.map_err(|e| {
        let mut reason = format!("{e:?}");
        if let Some(hint) = screen_capture_permission().refusal_hint() {
            reason.push_str("; ");
            reason.push_str(hint);
        }
        RecorderError::subsystem(context, reason)
    })
}

#[async_trait]
impl CaptureBackend for ScreenCaptureKitBackend {
    fn name(&self) -> &str {
        "ScreenCaptureKit"
    }

    async fn shareable_content(&self) -> Result<ShareableContent, RecorderError> {
        let content = fetch_content("enumerate shareable content").await?;

        let applications = content
            .applications()
            .iter()
            .map(|app| {
                let bundle = app.bundle_identifier();
                CapturableApplication {
                    name: app.application_name(),
                    process_id: app.process_id(),
                    bundle_identifier: (!bundle.is_empty()).then_some(bundle),
                }
            })
            .collect();

        let displays = content
            .displays()
            .iter()
            .map(|d| Display {
                id: d.display_id(),
                width: d.width(),
                height: d.height(),
            })
            .collect();

        let windows = content
            .windows()
            .iter()
            .map(|w| Window {
                id: w.window_id(),
                owner_process_id: w.owning_application().map(|app| app.process_id()),
                title: w.title(),
            })
            .collect();

        Ok(ShareableContent {
            applications,
            displays,
            windows,
        })
    }

    fn supports_application_filter(&self) -> bool {
        true
    }

    async fn open_stream(
        &self,
        filter: &CaptureFilter,
        configuration: &CaptureConfiguration,
        output: SampleBufferSender,
    ) -> Result<Box<dyn CaptureStream>, RecorderError> {
        const CONTEXT: &str = "create capture stream";

        // Filters need the framework's own objects, so look them up again.
        let content = fetch_content(CONTEXT).await?;
        let missing = |what: String| RecorderError::subsystem(CONTEXT, format!("{what} disappeared"));

        let displays = content.displays();
        let find_display = |id: u32| {
            displays
                .iter()
                .find(|d| d.display_id() == id)
                .ok_or_else(|| missing(format!("display {id}")))
        };

        let sc_filter = match filter {
            CaptureFilter::Application {
                application,
                display,
            } => {
                let apps = content.applications();
                let app = apps
                    .iter()
                    .find(|a| a.process_id() == application.process_id)
                    .ok_or_else(|| missing(format!("application {}", application.name)))?;
                SCContentFilter::builder()
                    .display(find_display(display.id)?)
                    .include_applications(&[app], &[])
                    .build()
            }
            CaptureFilter::Window { window } => {
                let windows = content.windows();
                let sc_window = windows
                    .iter()
                    .find(|w| w.window_id() == window.id)
                    .ok_or_else(|| missing(format!("window {}", window.id)))?;
                SCContentFilter::builder().window(sc_window).build()
            }
            CaptureFilter::Display { display } => SCContentFilter::builder()
                .display(find_display(display.id)?)
                .build(),
        };

        let mut stream_config = SCStreamConfiguration::new();
        stream_config
            .set_captures_audio(true)
            .set_sample_rate(configuration.sample_rate as i32)
            .set_channel_count(i32::from(configuration.channels))
            .set_excludes_current_process_audio(configuration.excludes_current_process_audio)
            .set_queue_depth(configuration.queue_depth)
            .set_width(MIN_VIDEO_DIMENSION)
            .set_height(MIN_VIDEO_DIMENSION);

        let handler = AudioOutputHandler {
            output,
            frames_delivered: AtomicU64::new(0),
        };

        let mut stream = SCStream::new(&sc_filter, &stream_config);
        stream.add_output_handler(handler, SCStreamOutputType::Audio);

        tracing::debug!(scope = %filter.scope(), "ScreenCaptureKit stream created");
        Ok(Box::new(SckStream {
            stream: Arc::new(stream),
            running: false,
        }))
    }
}

/// Owns the `SCStream`; stops it on drop if still running.
struct SckStream {
    stream: Arc<SCStream>,
    running: bool,
}

#[async_trait]
impl CaptureStream for SckStream {
    async fn start(&mut self) -> Result<(), RecorderError> {
        let stream = Arc::clone(&self.stream);
        await_completion("start capture", move |handler| {
            std::thread::spawn(move || match stream.start_capture() {
                Ok(()) => handler.succeed(()),
                Err(e) => handler.fail(RecorderError::subsystem("start capture", format!("{e:?}"))),
            });
        })
        .await?;
        self.running = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), RecorderError> {
        self.running = false;
        let stream = Arc::clone(&self.stream);
        await_completion("stop capture", move |handler| {
            std::thread::spawn(move || match stream.stop_capture() {
                Ok(()) => handler.succeed(()),
                Err(e) => handler.fail(RecorderError::subsystem("stop capture", format!("{e:?}"))),
            });
        })
        .await
    }
}

impl Drop for SckStream {
    fn drop(&mut self) {
        if self.running {
            let _ = self.stream.stop_capture();
        }
    }
}

/// Forwards ScreenCaptureKit buffers to the sink.
struct AudioOutputHandler {
    output: SampleBufferSender,
    frames_delivered: AtomicU64,
}

impl SCStreamOutputTrait for AudioOutputHandler {
    fn did_output_sample_buffer(&self, sample_buffer: CMSampleBuffer, of_type: SCStreamOutputType) {
        let output_type = match of_type {
            SCStreamOutputType::Audio => StreamOutputType::Audio,
            SCStreamOutputType::Microphone => StreamOutputType::Microphone,
            _ => StreamOutputType::Screen,
        };
        if output_type != StreamOutputType::Audio {
            return;
        }

        let buffer = self.convert(&sample_buffer);
        self.output.deliver(buffer, output_type);
    }
}

impl AudioOutputHandler {
    /// Converts a `CMSampleBuffer` into a [`SampleBuffer`].
    ///
    /// Everything the sink relies on comes from the buffer itself: its
    /// data-ready state, its sample count, its plane bytes and the stream
    /// description embedded in its format description. The presentation
    /// time is the stream position in frames at the buffer's own rate.
    fn convert(&self, sample_buffer: &CMSampleBuffer) -> SampleBuffer {
        let description = embedded_description(sample_buffer);
        let delivered = self.frames_delivered.load(Ordering::Relaxed);
        let presentation_time = match description {
            Some(d) if d.sample_rate.is_finite() && d.sample_rate > 0.0 => {
                Duration::from_secs_f64(delivered as f64 / d.sample_rate)
            }
            _ => Duration::ZERO,
        };

        if !sample_buffer.is_data_ready() {
            return SampleBuffer::not_ready(presentation_time);
        }

        let planes: Vec<Vec<u8>> = sample_buffer
            .audio_buffer_list()
            .map(|list| list.iter().map(|b| b.data().to_vec()).collect())
            .unwrap_or_default();
        let frame_count = sample_buffer.num_samples() as usize;

        self.frames_delivered
            .fetch_add(frame_count as u64, Ordering::Relaxed);
        SampleBuffer::captured(true, description, frame_count, presentation_time, planes)
    }
}

/// Reads the `AudioStreamBasicDescription` embedded in a sample buffer.
///
/// `None` when the buffer has no format description, it is not audio, or
/// any field is unavailable.
fn embedded_description(sample_buffer: &CMSampleBuffer) -> Option<StreamDescription> {
    let format = sample_buffer.format_description()?;
    if !format.is_audio() {
        return None;
    }
    Some(StreamDescription {
        sample_rate: format.audio_sample_rate()?,
        format_id: format.media_subtype_raw(),
        format_flags: format.audio_format_flags()?,
        bytes_per_frame: format.audio_bytes_per_frame()?,
        channels_per_frame: format.audio_channel_count()?,
        bits_per_channel: format.audio_bits_per_channel()?,
    })
}

//! Records one application until Ctrl-C is pressed.
//!
//! # Usage
//!
//! ```bash
//! # Real capture (macOS 13+, Screen Recording permission):
//! cargo run --example record_app --features screencapturekit -- "Music" [out.wav]
//!
//! # Anywhere else, records a synthetic tone from a scripted backend:
//! cargo run --example record_app -- "Music"
//! ```
//!
//! Without an output name the file is called `<App_Name>_<yyyyMMdd_HHmmss>.wav`
//! in the current directory and never replaces an existing file.

use app_audio_recorder::{event_callback, Recorder, RecordingEvent};

#[cfg(all(target_os = "macos", feature = "screencapturekit"))]
fn recorder() -> Recorder {
    Recorder::screencapturekit()
}

#[cfg(not(all(target_os = "macos", feature = "screencapturekit")))]
fn recorder() -> Recorder {
    use app_audio_recorder::{MockBackend, SampleBuffer};
    use std::time::Duration;

    const RATE: u32 = 48_000;
    const FRAMES: usize = 480;

    // 440 Hz on the left, 660 Hz on the right, 10 ms per buffer.
    let mut backend = MockBackend::new()
        .with_display(1, 1920, 1080)
        .with_application("Music", 388)
        .with_buffer_interval(Duration::from_millis(10));
    for i in 0..1000 {
        let tone = |hz: f32| -> Vec<f32> {
            (0..FRAMES)
                .map(|n| {
                    let t = (i * FRAMES + n) as f32 / RATE as f32;
                    0.2 * (2.0 * std::f32::consts::PI * hz * t).sin()
                })
                .collect()
        };
        backend = backend.with_buffer(SampleBuffer::from_planar_f32(
            RATE,
            &[tone(440.0), tone(660.0)],
            Duration::from_millis(i as u64 * 10),
        ));
    }
    Recorder::new(backend)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(app_name) = args.next() else {
        eprintln!("usage: record_app <application> [output.wav]");
        std::process::exit(2);
    };
    let output = args.next();

    let recorder = recorder().on_event(event_callback(|event| match event {
        RecordingEvent::FormatDiscovered { format, .. } => println!("Format: {format}"),
        RecordingEvent::SinkFailed { error, .. } => eprintln!("Recording failed: {error}"),
        RecordingEvent::CaptureScopeWidened { application, scope } => {
            eprintln!("Warning: capturing the {scope}, not just {application}");
        }
    }));

    let mut handle = recorder.start_recording(&app_name, output.as_deref()).await?;
    println!(
        "Recording {} to {}. Press Ctrl+C to stop.",
        handle.application_name(),
        handle.output_path().display()
    );

    tokio::signal::ctrl_c().await?;

    let summary = handle.stop().await?;
    println!(
        "Saved {:.1}s ({} frames) to {}",
        summary.duration.as_secs_f64(),
        summary.frames_written,
        summary.path.display()
    );
    if let Err(error) = summary.into_result() {
        eprintln!("Audio after the failure was dropped: {error}");
    }
    Ok(())
}

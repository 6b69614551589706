//! Lists capturable applications.
//!
//! Run with:
//!
//! ```bash
//! # Real applications (macOS 13+, Screen Recording permission):
//! cargo run --example list_apps --features screencapturekit
//!
//! # Anywhere else, against a scripted backend:
//! cargo run --example list_apps
//! ```

use app_audio_recorder::Recorder;

#[cfg(all(target_os = "macos", feature = "screencapturekit"))]
fn recorder() -> Recorder {
    Recorder::screencapturekit()
}

#[cfg(not(all(target_os = "macos", feature = "screencapturekit")))]
fn recorder() -> Recorder {
    use app_audio_recorder::MockBackend;

    Recorder::new(
        MockBackend::new()
            .with_display(1, 1920, 1080)
            .with_application("Safari", 412)
            .with_application("Apple Music", 388)
            .with_application("zoom.us", 901),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let recorder = recorder();
    let applications = recorder.list_applications().await?;
    if applications.is_empty() {
        println!("No capturable applications ({} backend).", recorder.backend_name());
        return Ok(());
    }

    for app in applications {
        match app.bundle_identifier {
            Some(bundle) => println!("{:>7}  {}  ({})", app.process_id, app.name, bundle),
            None => println!("{:>7}  {}", app.process_id, app.name),
        }
    }
    Ok(())
}

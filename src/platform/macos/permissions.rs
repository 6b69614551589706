//! macOS Screen Recording permission check.
//!
//! ScreenCaptureKit refuses to enumerate shareable content, and delivers no
//! audio, until the user grants Screen Recording permission. The recorder
//! never prompts; it only checks so a refusal can be explained.

use crate::platform::ScreenCapturePermission;

// CoreGraphics (macOS 10.15+)
#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    /// Returns true if the process has screen capture permission.
    /// Does not prompt the user.
    fn CGPreflightScreenCaptureAccess() -> bool;
}

/// Checks if Screen Recording permission is currently granted.
///
/// This does NOT prompt the user.
///
/// # Example
///
/// ```no_run
/// use app_audio_recorder::platform::permissions::check_screen_capture_permission;
/// use app_audio_recorder::platform::ScreenCapturePermission;
///
/// if check_screen_capture_permission() == ScreenCapturePermission::Denied {
///     eprintln!("enable Screen Recording for this terminal in System Settings");
/// }
/// ```
#[must_use]
pub fn check_screen_capture_permission() -> ScreenCapturePermission {
    // SAFETY: CGPreflightScreenCaptureAccess only reads system state.
    #[allow(unsafe_code)]
    let granted = unsafe { CGPreflightScreenCaptureAccess() };

    if granted {
        ScreenCapturePermission::Granted
    } else {
        ScreenCapturePermission::Denied
    }
}

//! Platform-specific functionality.

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "macos")]
pub use macos::permissions;

/// Screen Recording permission status.
///
/// Per-application audio capture on macOS is gated behind the Screen
/// Recording privacy permission. Other platforms report `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenCapturePermission {
    /// Permission has been granted.
    Granted,
    /// Permission has been denied or not yet requested.
    Denied,
    /// The platform has no such permission, or it cannot be checked.
    Unknown,
}

impl ScreenCapturePermission {
    /// A note explaining a subsystem refusal, if the permission is the likely
    /// cause.
    pub fn refusal_hint(self) -> Option<&'static str> {
        match self {
            Self::Denied => Some(
                "Screen Recording permission is not granted \
                 (System Settings > Privacy & Security > Screen Recording)",
            ),
            Self::Granted | Self::Unknown => None,
        }
    }
}

/// Checks the Screen Recording permission without prompting.
#[must_use]
pub fn screen_capture_permission() -> ScreenCapturePermission {
    #[cfg(target_os = "macos")]
    {
        permissions::check_screen_capture_permission()
    }
    #[cfg(not(target_os = "macos"))]
    {
        ScreenCapturePermission::Unknown
    }
}

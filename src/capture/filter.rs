//! Capture filter selection.

use std::fmt;

use super::{CapturableApplication, Display, ShareableContent, Window};

/// How much audio a capture filter covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureScope {
    /// Only the target application.
    Application,
    /// One window of the target application.
    Window,
    /// Everything audible on a display.
    Display,
}

impl fmt::Display for CaptureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Application => "application",
            Self::Window => "window",
            Self::Display => "whole display",
        })
    }
}

/// What a capture stream is scoped to. Chosen once per recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureFilter {
    /// A single application, anchored to a display.
    Application {
        /// Target application.
        application: CapturableApplication,
        /// Anchor display.
        display: Display,
    },
    /// A single window owned by the target application.
    Window {
        /// Target window.
        window: Window,
    },
    /// A whole display.
    Display {
        /// Captured display.
        display: Display,
    },
}

impl CaptureFilter {
    /// Picks the narrowest filter available for `application`.
    ///
    /// Fallback order: application on `display`, then the first window the
    /// application owns, then the whole `display`.
    pub fn choose(
        application: &CapturableApplication,
        display: Display,
        content: &ShareableContent,
        supports_application_filter: bool,
    ) -> Self {
        if supports_application_filter {
            return Self::Application {
                application: application.clone(),
                display,
            };
        }
        match content.first_window_of(application.process_id) {
            Some(window) => Self::Window {
                window: window.clone(),
            },
            None => Self::Display { display },
        }
    }

    /// The scope this filter covers.
    pub fn scope(&self) -> CaptureScope {
        match self {
            Self::Application { .. } => CaptureScope::Application,
            Self::Window { .. } => CaptureScope::Window,
            Self::Display { .. } => CaptureScope::Display,
        }
    }

    /// Returns `true` if audio from other applications may be captured.
    pub fn is_widened(&self) -> bool {
        self.scope() == CaptureScope::Display
    }
}

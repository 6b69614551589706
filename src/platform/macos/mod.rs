//! macOS support.

pub mod permissions;

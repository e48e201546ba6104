//! Playback state machine and its time sources.

/// Time sources.
pub mod clock;
/// `idle / playing / paused / recording` controller.
pub mod controller;

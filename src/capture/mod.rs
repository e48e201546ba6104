//! Capture pipeline: sinks, container negotiation and the batch export driver.

/// ffmpeg-backed sink and container negotiation.
pub mod ffmpeg;
/// Pre-flight validation, export driver and finalization.
pub mod pipeline;
/// Sink contract and the in-memory sink.
pub mod sink;

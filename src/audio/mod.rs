//! Audio scheduling engine.
//!
//! Playback start offsets are turned into an [`plan::AudioPlan`] (pure) which an
//! [`scheduler::AudioScheduler`] realizes on an [`graph::AudioGraph`], tearing down the previous
//! set of clips first.

/// Host audio-graph contract.
pub mod graph;
/// Deterministic offline graph and PCM mixer.
pub mod offline;
/// Pure scheduling plan computation.
pub mod plan;
/// Active clip bookkeeping.
pub mod scheduler;

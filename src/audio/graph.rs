use std::sync::Arc;

use crate::foundation::error::ReelResult;
use crate::scene::asset::AudioBuffer;

/// Opaque handle to a clip realized on an [`AudioGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipHandle(pub u64);

/// A one-shot clip placed at absolute audio-clock instants.
#[derive(Clone, Debug)]
pub struct ClipRequest {
    /// Samples to play.
    pub buffer: Arc<AudioBuffer>,
    /// Absolute audio-clock instant the clip starts sounding.
    pub start_time: f64,
    /// Read position inside `buffer` at `start_time`.
    pub source_offset: f64,
    /// Absolute audio-clock instant the clip is silenced, regardless of buffer length.
    pub stop_time: f64,
    /// Linear gain.
    pub gain: f32,
}

/// A clip that repeats its buffer until explicitly stopped.
#[derive(Clone, Debug)]
pub struct LoopRequest {
    /// Samples to loop.
    pub buffer: Arc<AudioBuffer>,
    /// Absolute audio-clock instant the loop starts sounding.
    pub start_time: f64,
    /// Initial read position inside `buffer`.
    pub source_offset: f64,
    /// Linear gain.
    pub gain: f32,
}

/// Interleaved PCM tapped from a graph's mixed output.
#[derive(Clone, Debug, PartialEq)]
pub struct MixedAudio {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved samples.
    pub interleaved_f32: Vec<f32>,
}

impl MixedAudio {
    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        let frames = self.interleaved_f32.len() / usize::from(self.channels.max(1));
        frames as f64 / f64::from(self.sample_rate.max(1))
    }
}

/// Host audio-mixing capability.
///
/// The graph owns an independent, monotonically advancing clock. Every clip is placed at
/// absolute instants on that clock when scheduled; nothing is recomputed per frame. Clips are
/// routed both to the listening output and to the capture tap.
pub trait AudioGraph {
    /// Current audio-clock time in seconds.
    fn current_time(&self) -> f64;

    /// Return `true` when the clock is suspended (e.g. before the first user gesture).
    fn is_suspended(&self) -> bool {
        false
    }

    /// Resume a suspended clock.
    fn resume(&mut self) -> ReelResult<()> {
        Ok(())
    }

    /// Realize a one-shot clip.
    fn schedule_clip(&mut self, clip: ClipRequest) -> ReelResult<ClipHandle>;

    /// Realize a looping clip.
    fn schedule_loop(&mut self, clip: LoopRequest) -> ReelResult<ClipHandle>;

    /// Silence and release a clip now. Unknown or already stopped handles are ignored.
    fn stop_clip(&mut self, handle: ClipHandle);

    /// Mixed output over `[from, to)` in audio-clock time, when the graph exposes a capture tap.
    fn capture_output(&self, from: f64, to: f64) -> Option<MixedAudio> {
        let _ = (from, to);
        None
    }
}

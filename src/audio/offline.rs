use std::path::Path;
use std::sync::Arc;

use crate::audio::graph::{AudioGraph, ClipHandle, ClipRequest, LoopRequest, MixedAudio};
use crate::foundation::error::{ReelError, ReelResult};
use crate::playback::clock::{Clock, ManualClock};
use crate::scene::asset::AudioBuffer;

/// Sample rate of the offline mix (and of decoded project audio).
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// One clip as realized on an [`OfflineMixGraph`].
#[derive(Clone, Debug)]
pub struct RealizedClip {
    /// Handle returned to the scheduler.
    pub handle: ClipHandle,
    /// Samples played.
    pub buffer: Arc<AudioBuffer>,
    /// Audio-clock instant the clip starts sounding.
    pub start_time: f64,
    /// Read position inside `buffer` at `start_time`.
    pub source_offset: f64,
    /// Scheduled stop instant (`f64::INFINITY` for loops).
    pub stop_time: f64,
    /// Whether the buffer repeats.
    pub looping: bool,
    /// Linear gain.
    pub gain: f32,
    /// Audio-clock instant of an explicit stop, if any.
    pub stopped_at: Option<f64>,
}

impl RealizedClip {
    /// Instant after which the clip is silent.
    pub fn effective_stop(&self) -> f64 {
        match self.stopped_at {
            Some(at) => self.stop_time.min(at),
            None => self.stop_time,
        }
    }

    /// Return `true` when the clip produces samples at audio-clock time `t`.
    pub fn is_sounding_at(&self, t: f64) -> bool {
        if t < self.start_time || t >= self.effective_stop() {
            return false;
        }
        if self.looping {
            return true;
        }
        self.source_offset + (t - self.start_time) < self.buffer.duration_secs()
    }
}

/// Deterministic audio graph driven by a [`ManualClock`].
///
/// Records every realized clip and mixes them on demand, which makes it both the capture tap for
/// batch export and an inspectable fake for tests.
#[derive(Debug)]
pub struct OfflineMixGraph {
    clock: ManualClock,
    suspended: bool,
    next_handle: u64,
    clips: Vec<RealizedClip>,
    sample_rate: u32,
    channels: u16,
}

impl OfflineMixGraph {
    /// Create a running graph reading time from `clock`.
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            suspended: false,
            next_handle: 0,
            clips: Vec::new(),
            sample_rate: MIX_SAMPLE_RATE,
            channels: 2,
        }
    }

    /// Create a graph whose clock starts suspended.
    pub fn new_suspended(clock: ManualClock) -> Self {
        Self {
            suspended: true,
            ..Self::new(clock)
        }
    }

    /// Override the output sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate.max(1);
        self
    }

    /// Every clip realized so far, in scheduling order.
    pub fn clips(&self) -> &[RealizedClip] {
        &self.clips
    }

    /// Number of clips audible at audio-clock time `t`.
    pub fn sounding_at(&self, t: f64) -> usize {
        self.clips.iter().filter(|c| c.is_sounding_at(t)).count()
    }

    /// Mix every clip into interleaved stereo over `[from, to)`.
    pub fn mix(&self, from: f64, to: f64) -> MixedAudio {
        let span = (to - from).max(0.0);
        let frames = (span * f64::from(self.sample_rate)).round() as usize;
        let mut out = vec![0.0f32; frames * usize::from(self.channels)];

        for clip in &self.clips {
            mix_clip(&mut out, clip, from, self.sample_rate, self.channels);
        }

        for s in &mut out {
            *s = s.clamp(-1.0, 1.0);
        }
        MixedAudio {
            sample_rate: self.sample_rate,
            channels: self.channels,
            interleaved_f32: out,
        }
    }

    fn push(&mut self, clip: RealizedClip) -> ClipHandle {
        let handle = clip.handle;
        self.clips.push(clip);
        handle
    }

    fn next_handle(&mut self) -> ClipHandle {
        self.next_handle += 1;
        ClipHandle(self.next_handle)
    }
}

impl AudioGraph for OfflineMixGraph {
    fn current_time(&self) -> f64 {
        self.clock.now()
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> ReelResult<()> {
        self.suspended = false;
        Ok(())
    }

    fn schedule_clip(&mut self, clip: ClipRequest) -> ReelResult<ClipHandle> {
        if !(clip.start_time.is_finite() && clip.stop_time.is_finite()) {
            return Err(ReelError::evaluation("clip start/stop must be finite"));
        }
        let handle = self.next_handle();
        Ok(self.push(RealizedClip {
            handle,
            buffer: clip.buffer,
            start_time: clip.start_time,
            source_offset: clip.source_offset.max(0.0),
            stop_time: clip.stop_time.max(clip.start_time),
            looping: false,
            gain: clip.gain,
            stopped_at: None,
        }))
    }

    fn schedule_loop(&mut self, clip: LoopRequest) -> ReelResult<ClipHandle> {
        if clip.buffer.frames() == 0 {
            return Err(ReelError::evaluation("cannot loop an empty buffer"));
        }
        let handle = self.next_handle();
        Ok(self.push(RealizedClip {
            handle,
            buffer: clip.buffer,
            start_time: clip.start_time,
            source_offset: clip.source_offset.max(0.0),
            stop_time: f64::INFINITY,
            looping: true,
            gain: clip.gain,
            stopped_at: None,
        }))
    }

    fn stop_clip(&mut self, handle: ClipHandle) {
        let now = self.clock.now();
        if let Some(clip) = self.clips.iter_mut().find(|c| c.handle == handle)
            && clip.stopped_at.is_none()
        {
            clip.stopped_at = Some(now);
        }
    }

    fn capture_output(&self, from: f64, to: f64) -> Option<MixedAudio> {
        Some(self.mix(from, to))
    }
}

fn mix_clip(out: &mut [f32], clip: &RealizedClip, from: f64, sample_rate: u32, channels: u16) {
    let out_frames = out.len() / usize::from(channels);
    let src = clip.buffer.interleaved_f32.as_ref();
    let src_channels = usize::from(clip.buffer.channels.max(1));
    let src_frames = src.len() / src_channels;
    if src_frames == 0 || out_frames == 0 {
        return;
    }

    let sr = f64::from(sample_rate);
    let lo = clip.start_time.max(from);
    let hi = clip.effective_stop();
    if hi <= lo {
        return;
    }
    let first = ((lo - from) * sr).round().max(0.0) as usize;
    let last = if hi.is_finite() {
        (((hi - from) * sr).round().max(0.0) as usize).min(out_frames)
    } else {
        out_frames
    };

    let src_rate = f64::from(clip.buffer.sample_rate);
    let src_duration = clip.buffer.duration_secs();

    for dst_frame in first..last {
        let t = from + (dst_frame as f64) / sr;
        let mut src_sec = clip.source_offset + (t - clip.start_time);
        if clip.looping {
            src_sec = src_sec.rem_euclid(src_duration);
        } else if src_sec >= src_duration {
            break;
        }

        let src_pos = src_sec * src_rate;
        if !src_pos.is_finite() || src_pos < 0.0 {
            break;
        }
        let src_frame0 = (src_pos.floor() as usize).min(src_frames - 1);
        let src_frame1 = if clip.looping {
            (src_frame0 + 1) % src_frames
        } else {
            (src_frame0 + 1).min(src_frames - 1)
        };
        let frac = (src_pos - src_frame0 as f64).clamp(0.0, 1.0) as f32;

        let (l, r) = if src_channels == 1 {
            let v0 = src[src_frame0];
            let v1 = src[src_frame1];
            let v = v0 + ((v1 - v0) * frac);
            (v, v)
        } else {
            let i0 = src_frame0 * src_channels;
            let i1 = src_frame1 * src_channels;
            let l0 = src[i0];
            let l1 = src[i1];
            let r0 = src[i0 + 1];
            let r1 = src[i1 + 1];
            (l0 + ((l1 - l0) * frac), r0 + ((r1 - r0) * frac))
        };

        let dst_idx = dst_frame * usize::from(channels);
        if channels == 1 {
            out[dst_idx] += 0.5 * (l + r) * clip.gain;
        } else {
            out[dst_idx] += l * clip.gain;
            out[dst_idx + 1] += r * clip.gain;
        }
    }
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::evaluation(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::evaluation(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/offline.rs"]
mod tests;

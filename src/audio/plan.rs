use std::sync::Arc;

use crate::scene::asset::{AssetMap, AudioBuffer};
use crate::timeline::builder::Timeline;

/// Narration clip placement for one timeline entry.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedNarration {
    /// Scene the narration belongs to.
    pub scene_id: u32,
    /// Index of the timeline entry.
    pub entry_index: usize,
    /// Absolute audio-clock instant the clip starts.
    pub graph_start_time: f64,
    /// Read position inside the narration buffer at `graph_start_time`.
    pub source_play_offset: f64,
    /// Absolute audio-clock instant pinned to the entry's end.
    pub stop_time: f64,
    /// Narration samples.
    #[serde(skip)]
    pub buffer: Arc<AudioBuffer>,
}

/// Background bed placement.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedBackground {
    /// Absolute audio-clock instant the loop starts.
    pub graph_start_time: f64,
    /// `start_offset mod background_duration`.
    pub source_play_offset: f64,
    /// Linear gain of the bed.
    pub gain: f32,
    /// Background samples.
    #[serde(skip)]
    pub buffer: Arc<AudioBuffer>,
}

/// Everything to realize on a fresh graph for one `play`/`record`/resume call.
///
/// Stateless and idempotent: identical inputs produce an identical plan.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioPlan {
    /// Audio-clock instant the plan is anchored to ("now").
    pub anchor_time: f64,
    /// Timeline offset playback starts from.
    pub start_offset: f64,
    /// One clip per entry intersecting `[start_offset, total)` that has narration.
    pub narration: Vec<PlannedNarration>,
    /// Looping background bed, if one was supplied.
    pub background: Option<PlannedBackground>,
}

impl AudioPlan {
    /// Return `true` when nothing would sound.
    pub fn is_empty(&self) -> bool {
        self.narration.is_empty() && self.background.is_none()
    }
}

/// Compute the scheduling plan for playback starting at timeline offset `t0`.
///
/// - entries ending at or before `t0` are skipped;
/// - an entry in progress at `t0` starts immediately, reading from `t0 - entry.start`;
/// - later entries start at `anchor + (entry.start - t0)`;
/// - every narration stop is pinned to `anchor + (entry.end - t0)`.
pub fn plan_audio(
    timeline: &Timeline,
    assets: &AssetMap,
    background: Option<&Arc<AudioBuffer>>,
    background_gain: f32,
    t0: f64,
    anchor_time: f64,
) -> AudioPlan {
    let t0 = if t0.is_finite() { t0.max(0.0) } else { 0.0 };
    let mut narration = Vec::new();
    let mut plan_background = None;

    if t0 < timeline.total_duration() {
        for (entry_index, entry) in timeline.entries().iter().enumerate() {
            if entry.end <= t0 || entry.duration <= 0.0 {
                continue;
            }
            let Some(buffer) = assets.audio_for(entry.scene.id) else {
                continue;
            };

            let (graph_start_time, source_play_offset) = if entry.start >= t0 {
                (anchor_time + (entry.start - t0), 0.0)
            } else {
                (anchor_time, t0 - entry.start)
            };

            narration.push(PlannedNarration {
                scene_id: entry.scene.id,
                entry_index,
                graph_start_time,
                source_play_offset,
                stop_time: anchor_time + (entry.end - t0),
                buffer: buffer.clone(),
            });
        }

        if let Some(bg) = background {
            let bg_duration = bg.duration_secs();
            if bg_duration > 0.0 {
                plan_background = Some(PlannedBackground {
                    graph_start_time: anchor_time,
                    source_play_offset: t0.rem_euclid(bg_duration),
                    gain: background_gain,
                    buffer: bg.clone(),
                });
            }
        }
    }

    tracing::debug!(
        t0,
        anchor_time,
        clips = narration.len(),
        background = plan_background.is_some(),
        "audio plan computed"
    );

    AudioPlan {
        anchor_time,
        start_offset: t0,
        narration,
        background: plan_background,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/plan.rs"]
mod tests;

use crate::scene::asset::AssetMap;
use crate::scene::model::Scene;

/// Shrinks the lookup time just below `total_duration` so the last entry stays active.
pub(crate) const END_EPSILON: f64 = 1e-6;

/// A scene's resolved `[start, end)` interval on the shared playback clock.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineEntry {
    /// The scene shown during this interval.
    pub scene: Scene,
    /// Interval start in seconds.
    pub start: f64,
    /// Interval length in seconds.
    pub duration: f64,
    /// Interval end in seconds (`start + duration`).
    pub end: f64,
}

impl TimelineEntry {
    /// Return `true` when `time` falls inside `[start, end)`.
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Local progress `(time - start) / duration`, clamped to `[0, 1)`.
    pub fn progress(&self, time: f64) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        ((time - self.start) / self.duration).clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Ordered, contiguous, non-overlapping interval schedule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    total_duration: f64,
}

impl Timeline {
    /// Entries in playback order.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// End of the last entry (0 for an empty timeline).
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when there is nothing to play.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() || self.total_duration <= 0.0
    }

    /// Entry at `idx`.
    pub fn entry(&self, idx: usize) -> Option<&TimelineEntry> {
        self.entries.get(idx)
    }

    /// `time` clamped into `[0, total_duration - ε]`.
    pub fn clamp_time(&self, time: f64) -> f64 {
        if !time.is_finite() || time <= 0.0 {
            return 0.0;
        }
        time.min((self.total_duration - END_EPSILON).max(0.0))
    }

    /// Index of the entry active at `time`.
    ///
    /// Times past the end resolve to the last entry (the final frame is held), times before 0
    /// resolve to the first one.
    pub fn active_index(&self, time: f64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let t = self.clamp_time(time);
        // Entries are sorted and contiguous, so the first entry ending after `t` contains it.
        let idx = self.entries.partition_point(|e| e.end <= t);
        Some(idx.min(self.entries.len() - 1))
    }
}

/// Derive the interval schedule from per-scene durations.
///
/// An entry's duration is its decoded narration length when available, else the scene's
/// `duration_estimate`. Scenes are ordered by ascending id. Non-finite or negative durations
/// count as zero. Pure: durations are never cached across calls.
#[tracing::instrument(level = "debug", skip_all, fields(scenes = scenes.len()))]
pub fn build_timeline(scenes: &[Scene], assets: &AssetMap) -> Timeline {
    let mut ordered: Vec<&Scene> = scenes.iter().collect();
    ordered.sort_by_key(|s| s.id);

    let mut entries = Vec::with_capacity(ordered.len());
    let mut cursor = 0.0f64;
    for scene in ordered {
        let duration = assets
            .get(scene.id)
            .and_then(|a| a.narration_secs())
            .unwrap_or(scene.duration_estimate);
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };

        let start = cursor;
        let end = start + duration;
        entries.push(TimelineEntry {
            scene: scene.clone(),
            start,
            duration,
            end,
        });
        cursor = end;
    }

    tracing::debug!(total = cursor, "timeline built");
    Timeline {
        entries,
        total_duration: cursor,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/builder.rs"]
mod tests;

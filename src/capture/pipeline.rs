use std::path::{Path, PathBuf};

use crate::audio::graph::AudioGraph;
use crate::capture::ffmpeg::ensure_parent_dir;
use crate::capture::sink::{CaptureSink, ContainerFormat};
use crate::foundation::error::{ReelError, ReelResult};
use crate::playback::clock::ManualClock;
use crate::playback::controller::{CaptureOutcome, PlaybackController, PlaybackEvent};
use crate::render::surface::Surface;
use crate::scene::asset::{AssetMap, AssetStatus};
use crate::timeline::builder::Timeline;

/// Pre-flight check run before any encoder is started.
///
/// Every timeline scene needs a `completed` asset with a decoded image. A missing asset reports
/// `pending`.
pub fn validate_ready(timeline: &Timeline, assets: &AssetMap) -> ReelResult<()> {
    if timeline.is_empty() {
        return Err(ReelError::EmptyTimeline);
    }
    for entry in timeline.entries() {
        let scene_id = entry.scene.id;
        let Some(asset) = assets.get(scene_id) else {
            return Err(ReelError::AssetNotReady {
                scene_id,
                status: AssetStatus::Pending,
            });
        };
        if asset.status != AssetStatus::Completed || asset.drawable_image().is_none() {
            // A completed asset without a decoded image is still loading its pixels.
            let status = match asset.status {
                AssetStatus::Completed => AssetStatus::Loading,
                other => other,
            };
            return Err(ReelError::AssetNotReady { scene_id, status });
        }
    }
    Ok(())
}

/// Finished, non-empty recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinishedCapture {
    /// Container of `bytes`.
    pub format: ContainerFormat,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// Download file name, `storyreel-<unix-millis>.<ext>`.
    pub file_name: String,
}

impl FinishedCapture {
    /// Write the capture into `dir` under its file name.
    pub fn write_to_dir(&self, dir: &Path) -> ReelResult<PathBuf> {
        let path = dir.join(&self.file_name);
        ensure_parent_dir(&path)?;
        std::fs::write(&path, &self.bytes).map_err(|e| {
            ReelError::evaluation(format!("failed to write capture '{}': {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "capture written");
        Ok(path)
    }
}

/// File name for a capture finished at `unix_millis`.
pub fn capture_file_name(format: ContainerFormat, unix_millis: u128) -> String {
    format!("storyreel-{unix_millis}.{}", format.extension())
}

/// Join the encoder output and reject empty results.
pub fn finalize(outcome: CaptureOutcome) -> ReelResult<FinishedCapture> {
    let bytes = outcome.chunks.concat();
    if bytes.is_empty() {
        return Err(ReelError::EmptyCapture);
    }
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    Ok(FinishedCapture {
        format: outcome.format,
        bytes,
        file_name: capture_file_name(outcome.format, millis),
    })
}

/// Batch export driver: records exactly one playthrough on a [`ManualClock`].
///
/// The clock must be the one shared with the controller's audio graph, so frames and the tapped
/// audio advance together. Frames are pushed once per `1 / fps`.
pub struct CapturePipeline<'a, S: Surface, G: AudioGraph> {
    controller: &'a mut PlaybackController<S, G, ManualClock>,
    clock: ManualClock,
}

impl<'a, S: Surface, G: AudioGraph> CapturePipeline<'a, S, G> {
    /// Drive `controller`, advancing `clock` (a clone of the controller's clock).
    pub fn new(
        controller: &'a mut PlaybackController<S, G, ManualClock>,
        clock: ManualClock,
    ) -> Self {
        Self { controller, clock }
    }

    /// Record the loaded timeline into `sink` and finalize the result.
    ///
    /// Sequence: pre-flight, frame 0, pre-roll hold, timed playback, post-roll hold, finalize.
    /// On any failure the controller is back in `idle`.
    #[tracing::instrument(level = "info", skip_all)]
    pub fn record(&mut self, sink: Box<dyn CaptureSink>) -> ReelResult<FinishedCapture> {
        let cfg = self.controller.config().clone();
        let dt = cfg.fps.frame_duration_secs();

        self.controller.begin_recording(sink)?;

        let pre_roll_frames = cfg.fps.secs_to_frames_ceil(cfg.pre_roll_secs);
        for _ in 1..pre_roll_frames {
            self.clock.advance(dt);
            self.controller.capture_frame()?;
        }
        self.clock.advance(dt);
        self.controller.start_recording()?;

        let total = self.controller.timeline().total_duration();
        // Generous bound so a misbehaving clock can never spin forever.
        let max_ticks = cfg
            .fps
            .secs_to_frames_ceil(total + cfg.post_roll_secs)
            .saturating_mul(2)
            .saturating_add(16);
        let mut ticks = 0u64;
        loop {
            match self.controller.tick()? {
                Some(PlaybackEvent::Ended { final_scene_index }) => {
                    tracing::debug!(final_scene_index, ticks, "recording ended");
                    break;
                }
                Some(PlaybackEvent::Progress { .. }) | None => {}
            }
            ticks += 1;
            if ticks > max_ticks {
                self.controller.stop();
                let _ = self.controller.take_capture();
                return Err(ReelError::evaluation("recording did not reach the end"));
            }
            self.clock.advance(dt);
        }

        let outcome = self
            .controller
            .take_capture()
            .ok_or_else(|| ReelError::evaluation("recording produced no capture outcome"))??;
        finalize(outcome)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/pipeline.rs"]
mod tests;

use crate::audio::graph::{AudioGraph, ClipHandle, ClipRequest, LoopRequest};
use crate::audio::plan::AudioPlan;
use crate::foundation::error::ReelResult;

/// Owns the set of clips currently realized on an [`AudioGraph`].
///
/// Every realization tears down the previous set first, so schedules never overlap.
#[derive(Debug, Default)]
pub struct AudioScheduler {
    active: Vec<ClipHandle>,
}

impl AudioScheduler {
    /// Create a scheduler with no active clips.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles of every clip realized by the last call to [`AudioScheduler::realize`].
    pub fn active(&self) -> &[ClipHandle] {
        &self.active
    }

    /// Stop and release all active clips, then realize `plan` on `graph`.
    ///
    /// If realization fails midway, clips realized so far are stopped as well.
    pub fn realize(&mut self, graph: &mut dyn AudioGraph, plan: &AudioPlan) -> ReelResult<()> {
        self.stop_all(graph);

        if let Err(e) = self.realize_inner(graph, plan) {
            self.stop_all(graph);
            return Err(e);
        }
        tracing::debug!(clips = self.active.len(), "audio plan realized");
        Ok(())
    }

    fn realize_inner(&mut self, graph: &mut dyn AudioGraph, plan: &AudioPlan) -> ReelResult<()> {
        if let Some(bg) = &plan.background {
            let handle = graph.schedule_loop(LoopRequest {
                buffer: bg.buffer.clone(),
                start_time: bg.graph_start_time,
                source_offset: bg.source_play_offset,
                gain: bg.gain,
            })?;
            self.active.push(handle);
        }

        for clip in &plan.narration {
            let handle = graph.schedule_clip(ClipRequest {
                buffer: clip.buffer.clone(),
                start_time: clip.graph_start_time,
                source_offset: clip.source_play_offset,
                stop_time: clip.stop_time,
                gain: 1.0,
            })?;
            self.active.push(handle);
        }
        Ok(())
    }

    /// Forcibly halt and release every active clip. Idempotent.
    pub fn stop_all(&mut self, graph: &mut dyn AudioGraph) {
        for handle in self.active.drain(..) {
            graph.stop_clip(handle);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/scheduler.rs"]
mod tests;

use std::sync::Arc;

use crate::audio::graph::{AudioGraph, MixedAudio};
use crate::audio::plan::plan_audio;
use crate::audio::scheduler::AudioScheduler;
use crate::capture::pipeline::validate_ready;
use crate::capture::sink::{CaptureConfig, CaptureSink, ContainerFormat};
use crate::foundation::config::ReelConfig;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::playback::clock::Clock;
use crate::render::frame::render_frame;
use crate::render::surface::Surface;
use crate::scene::asset::{AssetMap, AudioBuffer};
use crate::scene::model::Scene;
use crate::timeline::builder::{Timeline, build_timeline};

/// Controller phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// Nothing scheduled; the next `play` starts from `paused_offset`.
    #[default]
    Idle,
    /// Frame loop running, audio scheduled.
    Playing,
    /// Frame loop and audio stopped at `paused_offset`.
    Paused,
    /// Exclusive capture session.
    Recording,
}

/// Mutable state of the single active playback session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackState {
    /// Current phase.
    pub phase: PlaybackPhase,
    /// Clock instant corresponding to timeline time 0.
    pub clock_origin: f64,
    /// Timeline time playback resumes from.
    pub paused_offset: f64,
}

/// Notification emitted by [`PlaybackController::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackEvent {
    /// A frame was rendered at `elapsed`.
    Progress {
        /// Timeline time of the rendered frame.
        elapsed: f64,
        /// Timeline length.
        total: f64,
        /// Index of the active timeline entry.
        active_scene_index: usize,
    },
    /// The timeline finished; the controller is idle again.
    Ended {
        /// Index of the last timeline entry.
        final_scene_index: usize,
    },
}

/// Finished capture handed back by [`PlaybackController::take_capture`].
#[derive(Clone, Debug)]
pub struct CaptureOutcome {
    /// Container produced by the sink.
    pub format: ContainerFormat,
    /// Encoded bytes, in arrival order.
    pub chunks: Vec<Vec<u8>>,
    /// Number of frames pushed to the sink.
    pub frames: u64,
    /// Mix tapped over the span of the pushed frames; `None` when nothing in the session sounds.
    pub audio: Option<MixedAudio>,
}

struct RecordingSession {
    sink: Box<dyn CaptureSink>,
    next_frame: u64,
    sink_start: f64,
    frame_secs: f64,
    has_audio: bool,
    timed: bool,
    ended_at: Option<f64>,
}

/// Drives preview and capture from a single elapsed-time source.
///
/// The per-frame loop is host-driven: while [`is_running`](Self::is_running) returns `true`, the
/// host calls [`tick`](Self::tick) once per display or capture frame.
pub struct PlaybackController<S: Surface, G: AudioGraph, C: Clock> {
    surface: S,
    graph: G,
    clock: C,
    cfg: ReelConfig,
    scenes: Vec<Scene>,
    assets: AssetMap,
    background: Option<Arc<AudioBuffer>>,
    timeline: Timeline,
    state: PlaybackState,
    scheduler: AudioScheduler,
    running: bool,
    last_elapsed: f64,
    recording: Option<RecordingSession>,
    capture: Option<ReelResult<CaptureOutcome>>,
}

impl<S: Surface, G: AudioGraph, C: Clock> PlaybackController<S, G, C> {
    /// Create an idle controller with no scenes loaded.
    pub fn new(surface: S, graph: G, clock: C, cfg: ReelConfig) -> Self {
        Self {
            surface,
            graph,
            clock,
            cfg,
            scenes: Vec::new(),
            assets: AssetMap::new(),
            background: None,
            timeline: Timeline::default(),
            state: PlaybackState::default(),
            scheduler: AudioScheduler::new(),
            running: false,
            last_elapsed: 0.0,
            recording: None,
            capture: None,
        }
    }

    /// Current session state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current phase.
    pub fn phase(&self) -> PlaybackPhase {
        self.state.phase
    }

    /// Return `true` while the host should keep calling [`tick`](Self::tick).
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Timeline built from the loaded scenes.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Loaded scenes.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Session configuration.
    pub fn config(&self) -> &ReelConfig {
        &self.cfg
    }

    /// Rendering surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Audio graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Audio scheduler bookkeeping.
    pub fn scheduler(&self) -> &AudioScheduler {
        &self.scheduler
    }

    /// Timeline time right now: live while running, `paused_offset` otherwise.
    pub fn elapsed(&self) -> f64 {
        if !self.running {
            return self.state.paused_offset;
        }
        let raw = self.clock.now() - self.state.clock_origin;
        raw.max(self.last_elapsed).clamp(0.0, self.timeline.total_duration())
    }

    /// Replace the session inputs. Stops everything and rebuilds the timeline.
    #[tracing::instrument(level = "debug", skip_all, fields(scenes = scenes.len()))]
    pub fn load(
        &mut self,
        scenes: Vec<Scene>,
        assets: AssetMap,
        background: Option<Arc<AudioBuffer>>,
    ) -> ReelResult<()> {
        self.stop();
        self.timeline = build_timeline(&scenes, &assets);
        self.scenes = scenes;
        self.assets = assets;
        self.background = background;
        self.render_at(0.0)?;
        Ok(())
    }

    /// Start or resume playback from `paused_offset`. No-op while already playing.
    pub fn play(&mut self) -> ReelResult<()> {
        match self.state.phase {
            PlaybackPhase::Playing => return Ok(()),
            PlaybackPhase::Recording => {
                return Err(ReelError::validation("cannot play while recording"));
            }
            PlaybackPhase::Idle | PlaybackPhase::Paused => {}
        }
        if self.timeline.is_empty() {
            self.render_at(0.0)?;
            return Ok(());
        }

        if self.graph.is_suspended() {
            self.graph.resume()?;
        }
        let t0 = if self.state.paused_offset < self.timeline.total_duration() {
            self.state.paused_offset
        } else {
            0.0
        };
        self.schedule_from(t0)?;
        self.state.clock_origin = self.clock.now() - t0;
        self.state.paused_offset = t0;
        self.last_elapsed = t0;
        self.running = true;
        self.state.phase = PlaybackPhase::Playing;
        tracing::info!(t0, "playback started");
        Ok(())
    }

    /// Stop the frame loop and all audio, remembering where playback was.
    ///
    /// Idempotent. During a recording this finalizes the capture like [`stop`](Self::stop).
    pub fn pause(&mut self) {
        match self.state.phase {
            PlaybackPhase::Playing => {
                let elapsed = self.elapsed();
                self.running = false;
                self.scheduler.stop_all(&mut self.graph);
                self.state.paused_offset = elapsed;
                self.state.phase = PlaybackPhase::Paused;
                tracing::info!(elapsed, "playback paused");
            }
            PlaybackPhase::Recording => self.stop(),
            PlaybackPhase::Idle | PlaybackPhase::Paused => {}
        }
    }

    /// Halt everything and return to `idle` at offset 0. Idempotent, safe from any phase.
    ///
    /// A recording in progress is finalized; its outcome is available from
    /// [`take_capture`](Self::take_capture).
    pub fn stop(&mut self) {
        if self.recording.is_some() {
            let outcome = self.finalize_recording();
            if let Err(e) = &outcome {
                tracing::warn!(error = %e, "capture finalization failed");
            }
            self.capture = Some(outcome);
        }
        self.scheduler.stop_all(&mut self.graph);
        self.running = false;
        self.last_elapsed = 0.0;
        self.state.paused_offset = 0.0;
        self.state.phase = PlaybackPhase::Idle;
    }

    /// Scrub to `time` (clamped into `[0, total]`).
    ///
    /// Idle/paused: the frame at `time` is rendered and becomes the resume point. Playing: audio
    /// is torn down and rescheduled from `time`.
    pub fn seek(&mut self, time: f64) -> ReelResult<()> {
        let total = self.timeline.total_duration();
        let t = if time.is_finite() {
            time.clamp(0.0, total)
        } else {
            0.0
        };
        match self.state.phase {
            PlaybackPhase::Recording => Err(ReelError::validation("cannot seek while recording")),
            PlaybackPhase::Idle | PlaybackPhase::Paused => {
                self.state.paused_offset = t;
                self.render_at(t)?;
                Ok(())
            }
            PlaybackPhase::Playing => {
                if let Err(e) = self.schedule_from(t) {
                    self.pause();
                    return Err(e);
                }
                self.state.clock_origin = self.clock.now() - t;
                self.last_elapsed = t;
                Ok(())
            }
        }
    }

    /// One iteration of the per-frame loop.
    ///
    /// Returns `None` when the loop is not running (or while the recording post-roll holds the
    /// final frame). Progress events are monotonically non-decreasing in `elapsed`.
    pub fn tick(&mut self) -> ReelResult<Option<PlaybackEvent>> {
        let result = self.tick_inner();
        if result.is_err() && self.recording.is_some() {
            self.abort_recording();
        }
        result
    }

    fn tick_inner(&mut self) -> ReelResult<Option<PlaybackEvent>> {
        if !self.running {
            return Ok(None);
        }
        let elapsed = self.elapsed();
        self.last_elapsed = elapsed;
        let total = self.timeline.total_duration();

        if elapsed >= total {
            return self.tick_end(total);
        }

        let active = self.render_at(elapsed)?;
        self.push_recorded_frame()?;
        Ok(Some(PlaybackEvent::Progress {
            elapsed,
            total,
            active_scene_index: active.unwrap_or(0),
        }))
    }

    fn tick_end(&mut self, total: f64) -> ReelResult<Option<PlaybackEvent>> {
        let final_scene_index = self.timeline.len().saturating_sub(1);
        self.render_at(total)?;
        self.scheduler.stop_all(&mut self.graph);

        if self.recording.is_some() {
            self.push_recorded_frame()?;
            let now = self.clock.now();
            let post_roll = self.cfg.post_roll_secs;
            if let Some(session) = self.recording.as_mut() {
                let ended_at = *session.ended_at.get_or_insert(now);
                if now - ended_at < post_roll {
                    return Ok(None);
                }
            }
        }

        self.stop();
        tracing::info!(final_scene_index, "playback ended");
        Ok(Some(PlaybackEvent::Ended { final_scene_index }))
    }

    /// Enter `recording`: validate assets, start `sink` and push frame 0.
    ///
    /// Any prior play/pause state is reset first. On failure the controller stays `idle` and no
    /// frame reaches the sink.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn begin_recording(&mut self, mut sink: Box<dyn CaptureSink>) -> ReelResult<()> {
        self.stop();
        self.capture = None;
        validate_ready(&self.timeline, &self.assets)?;

        let has_audio = self.background.is_some()
            || self
                .timeline
                .entries()
                .iter()
                .any(|e| self.assets.audio_for(e.scene.id).is_some());
        // No sink is started until the graph is running.
        if self.graph.is_suspended() {
            self.graph.resume()?;
        }
        sink.start(&CaptureConfig {
            width: self.surface.width(),
            height: self.surface.height(),
            fps: self.cfg.fps,
            has_audio,
        })?;

        self.recording = Some(RecordingSession {
            sink,
            next_frame: 0,
            sink_start: self.graph.current_time(),
            frame_secs: self.cfg.fps.frame_duration_secs(),
            has_audio,
            timed: false,
            ended_at: None,
        });
        self.state.phase = PlaybackPhase::Recording;

        if let Err(e) = self.render_at(0.0) {
            self.abort_recording();
            return Err(e);
        }
        self.push_recorded_frame()
    }

    /// Push the current surface again (pre-roll hold). Only valid before timed playback starts.
    pub fn capture_frame(&mut self) -> ReelResult<()> {
        match &self.recording {
            Some(session) if !session.timed => self.push_recorded_frame(),
            Some(_) => Err(ReelError::validation(
                "timed playback already started; frames come from tick",
            )),
            None => Err(ReelError::validation("not recording")),
        }
    }

    /// Start timed playback of the recording from timeline time 0.
    pub fn start_recording(&mut self) -> ReelResult<()> {
        let Some(session) = self.recording.as_mut() else {
            return Err(ReelError::validation("not recording"));
        };
        if session.timed {
            return Ok(());
        }
        session.timed = true;
        if let Err(e) = self.schedule_from(0.0) {
            self.abort_recording();
            return Err(e);
        }
        self.state.clock_origin = self.clock.now();
        self.state.paused_offset = 0.0;
        self.last_elapsed = 0.0;
        self.running = true;
        tracing::info!("recording playback started");
        Ok(())
    }

    /// Take the outcome of the last finished recording, if any.
    pub fn take_capture(&mut self) -> Option<ReelResult<CaptureOutcome>> {
        self.capture.take()
    }

    fn render_at(&mut self, time: f64) -> ReelResult<Option<usize>> {
        render_frame(
            &mut self.surface,
            &self.timeline,
            &self.assets,
            time,
            &self.cfg,
        )
    }

    fn schedule_from(&mut self, t0: f64) -> ReelResult<()> {
        let plan = plan_audio(
            &self.timeline,
            &self.assets,
            self.background.as_ref(),
            self.cfg.background_gain,
            t0,
            self.graph.current_time(),
        );
        self.scheduler.realize(&mut self.graph, &plan)
    }

    fn push_recorded_frame(&mut self) -> ReelResult<()> {
        let Some(session) = self.recording.as_mut() else {
            return Ok(());
        };
        let pushed = self.surface.snapshot().and_then(|frame| {
            session
                .sink
                .push_frame(FrameIndex(session.next_frame), &frame)
        });
        match pushed {
            Ok(()) => {
                session.next_frame += 1;
                Ok(())
            }
            Err(e) => {
                self.abort_recording();
                Err(e)
            }
        }
    }

    fn finalize_recording(&mut self) -> ReelResult<CaptureOutcome> {
        let Some(mut session) = self.recording.take() else {
            return Err(ReelError::validation("not recording"));
        };
        // The track spans exactly the pushed frames, each lasting one frame period.
        let audio = if session.has_audio {
            let video_secs = session.next_frame as f64 * session.frame_secs;
            self.graph
                .capture_output(session.sink_start, session.sink_start + video_secs)
        } else {
            None
        };
        self.scheduler.stop_all(&mut self.graph);
        session.sink.stop(audio.clone())?;
        let chunks = session.sink.take_chunks();
        tracing::info!(
            frames = session.next_frame,
            bytes = chunks.iter().map(Vec::len).sum::<usize>(),
            "capture finalized"
        );
        Ok(CaptureOutcome {
            format: session.sink.format(),
            chunks,
            frames: session.next_frame,
            audio,
        })
    }

    /// Discard a failed recording and return to `idle`.
    fn abort_recording(&mut self) {
        if let Some(mut session) = self.recording.take() {
            let _ = session.sink.stop(None);
            let _ = session.sink.take_chunks();
        }
        self.scheduler.stop_all(&mut self.graph);
        self.running = false;
        self.last_elapsed = 0.0;
        self.state.paused_offset = 0.0;
        self.state.phase = PlaybackPhase::Idle;
        tracing::warn!("recording aborted");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/controller.rs"]
mod tests;

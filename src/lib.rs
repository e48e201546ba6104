//! storyreel turns a sequence of narrated scenes into a previewable, recordable reel.
//!
//! # Pipeline overview
//!
//! 1. **Timeline**: `scenes + assets -> Timeline` (contiguous intervals, narration-sized)
//! 2. **Audio**: `Timeline + offset -> AudioPlan`, realized on an [`AudioGraph`] at absolute
//!    clock instants
//! 3. **Render**: `Timeline + time -> pixels` on a [`Surface`] (continuous zoom, transitions,
//!    vignette, hook bar)
//! 4. **Capture** (optional): frames and the tapped audio mix are streamed to a [`CaptureSink`],
//!    typically the system `ffmpeg` binary
//!
//! A [`PlaybackController`] ties these together: one elapsed-time source drives both the frame
//! loop and the audio schedule, in preview as well as while recording.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Stateless frames**: rendering a frame depends only on the timeline, the assets and the
//!   elapsed time.
//! - **No IO while playing**: media is decoded up front (see [`load_project`]).
//! - **Premultiplied RGBA8** end-to-end.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod audio;
mod capture;
mod effects;
mod foundation;
mod playback;
mod render;
mod scene;
mod timeline;

pub use assets::decode::{decode_audio_file, decode_image, decode_image_file, pcm_from_f32le};
pub use assets::project::{Project, ProjectFile, ProjectScene, load_project};
pub use audio::graph::{AudioGraph, ClipHandle, ClipRequest, LoopRequest, MixedAudio};
pub use audio::offline::{MIX_SAMPLE_RATE, OfflineMixGraph, RealizedClip, write_mix_to_f32le_file};
pub use audio::plan::{AudioPlan, PlannedBackground, PlannedNarration, plan_audio};
pub use audio::scheduler::AudioScheduler;
pub use capture::ffmpeg::{
    FfmpegCaptureSink, ensure_parent_dir, is_ffmpeg_on_path, negotiate_container,
    negotiate_host_container, probe_encoders,
};
pub use capture::pipeline::{
    CapturePipeline, FinishedCapture, capture_file_name, finalize, validate_ready,
};
pub use capture::sink::{CaptureConfig, CaptureSink, ContainerFormat, InMemoryCaptureSink};
pub use effects::blur::{blur_rgba8_premul, sigma_for_radius};
pub use effects::composite::{PremulRgba8, over, vignette_in_place};
pub use effects::transitions::{TransitionParams, incoming_progress, transition_params};
pub use foundation::config::{FFMPEG_ENV, ReelConfig, ffmpeg_program};
pub use foundation::core::{Affine, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Vec2};
pub use foundation::error::{ReelError, ReelResult};
pub use playback::clock::{Clock, ManualClock};
pub use playback::controller::{
    CaptureOutcome, PlaybackController, PlaybackEvent, PlaybackPhase, PlaybackState,
};
pub use render::cpu::CpuSurface;
pub use render::frame::{cover_transform, render_frame};
pub use render::surface::{FrameRGBA, ImageDraw, Surface};
pub use scene::asset::{AssetMap, AssetStatus, AudioBuffer, GeneratedAsset, SceneImage};
pub use scene::model::{Scene, TransitionType};
pub use timeline::builder::{Timeline, TimelineEntry, build_timeline};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};

/// Environment variable overriding the `ffmpeg` executable used for decoding and capture.
pub const FFMPEG_ENV: &str = "STORYREEL_FFMPEG";

/// Session-wide tuning for preview, scheduling and capture.
///
/// All fields default to the values the compositor was designed around; a project file may
/// override any subset through its `settings` object.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReelConfig {
    /// Rendering surface size.
    pub canvas: Canvas,
    /// Capture frame rate.
    pub fps: Fps,
    /// How long before a scene boundary the next scene starts compositing in.
    pub transition_window_secs: f64,
    /// Extra scale reached by the continuous zoom at the end of a scene.
    pub zoom_amount: f64,
    /// Relative gain of the looping background bed.
    pub background_gain: f32,
    /// Hold on frame 0 before timed playback starts while recording.
    pub pre_roll_secs: f64,
    /// Hold on the final frame after the timeline ends while recording.
    pub post_roll_secs: f64,
    /// Span of the cosmetic hook progress bar.
    pub hook_bar_secs: f64,
    /// Silence added to narration when widening a scene's `duration_estimate`.
    ///
    /// Only the estimate grows; a timeline entry with decoded narration lasts exactly as long as
    /// the narration.
    pub narration_pad_secs: f64,
    /// Blur radius at the start of a `blur` transition.
    pub blur_max_px: u32,
    /// Darkening applied at the frame corners by the vignette (0 disables it).
    pub vignette_strength: f32,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            fps: Fps::default(),
            transition_window_secs: 0.8,
            zoom_amount: 0.15,
            background_gain: 0.125,
            pre_roll_secs: 0.8,
            post_roll_secs: 1.0,
            hook_bar_secs: 5.0,
            narration_pad_secs: 0.5,
            blur_max_px: 12,
            vignette_strength: 0.55,
        }
    }
}

impl ReelConfig {
    /// Reject values the compositor cannot honor.
    pub fn validate(&self) -> ReelResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ReelError::validation("canvas width/height must be non-zero"));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "canvas width/height must be even (required for yuv420p output)",
            ));
        }
        if self.canvas.width > u32::from(u16::MAX) || self.canvas.height > u32::from(u16::MAX) {
            return Err(ReelError::validation("canvas width/height must fit in u16"));
        }
        Fps::new(self.fps.num, self.fps.den)?;

        let non_negative = [
            ("transitionWindowSecs", self.transition_window_secs),
            ("zoomAmount", self.zoom_amount),
            ("preRollSecs", self.pre_roll_secs),
            ("postRollSecs", self.post_roll_secs),
            ("hookBarSecs", self.hook_bar_secs),
            ("narrationPadSecs", self.narration_pad_secs),
            ("backgroundGain", f64::from(self.background_gain)),
            ("vignetteStrength", f64::from(self.vignette_strength)),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(ReelError::validation(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }
        if self.vignette_strength > 1.0 {
            return Err(ReelError::validation("vignetteStrength must be <= 1"));
        }
        Ok(())
    }
}

/// Resolve the `ffmpeg` executable, honoring [`FFMPEG_ENV`].
pub fn ffmpeg_program() -> String {
    std::env::var(FFMPEG_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "ffmpeg".to_string())
}

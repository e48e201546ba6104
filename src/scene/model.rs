/// How the next scene is composited in near the end of the current one.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TransitionType {
    /// Next image fades in over the current one.
    #[default]
    Fade,
    /// Next image slides in from the right at full opacity.
    Slide,
    /// Next image fades in while growing from 80% to full size.
    Zoom,
    /// Next image fades in while its blur shrinks to zero.
    Blur,
    /// Same compositing as [`TransitionType::Fade`].
    Dissolve,
}

/// One narrative beat: one image and one narration clip.
///
/// Timeline order is ascending `id`. Scenes are immutable once assets are requested, except that
/// [`Scene::widen_to_narration`] may grow (never shrink) `duration_estimate`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Unique scene id.
    pub id: u32,
    /// Prompt text used by the image collaborator.
    #[serde(default)]
    pub visual_description: String,
    /// Narration script used by the speech collaborator.
    #[serde(default)]
    pub narration: String,
    /// Author-estimated display duration in seconds.
    pub duration_estimate: f64,
    /// Transition used when this scene is composited in over its predecessor.
    #[serde(default)]
    pub transition_type: TransitionType,
    /// Marks the opening hook scene.
    #[serde(default)]
    pub is_hook: bool,
}

impl Scene {
    /// Create a scene with default transition and no hook marker.
    pub fn new(id: u32, duration_estimate: f64) -> Self {
        Self {
            id,
            visual_description: String::new(),
            narration: String::new(),
            duration_estimate,
            transition_type: TransitionType::default(),
            is_hook: false,
        }
    }

    /// Builder-style transition override.
    pub fn with_transition(mut self, transition: TransitionType) -> Self {
        self.transition_type = transition;
        self
    }

    /// Builder-style hook marker.
    pub fn with_hook(mut self, is_hook: bool) -> Self {
        self.is_hook = is_hook;
        self
    }

    /// Grow the estimate so decoded narration (plus `pad_secs`) is never truncated.
    ///
    /// Returns `true` when the estimate changed.
    pub fn widen_to_narration(&mut self, narration_secs: f64, pad_secs: f64) -> bool {
        if !narration_secs.is_finite() || narration_secs <= 0.0 {
            return false;
        }
        let needed = narration_secs + pad_secs.max(0.0);
        if needed > self.duration_estimate || !self.duration_estimate.is_finite() {
            self.duration_estimate = needed;
            return true;
        }
        false
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;

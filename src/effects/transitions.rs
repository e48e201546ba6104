use crate::scene::model::TransitionType;

/// How the incoming scene is drawn at one point of a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionParams {
    /// Opacity of the incoming image.
    pub opacity: f32,
    /// Horizontal offset of the incoming image in pixels.
    pub offset_x: f64,
    /// Extra scale applied on top of the cover fit.
    pub scale: f64,
    /// Blur radius applied to the incoming image.
    pub blur_radius: u32,
}

impl TransitionParams {
    /// Fully visible, untransformed.
    pub const IDENTITY: Self = Self {
        opacity: 1.0,
        offset_x: 0.0,
        scale: 1.0,
        blur_radius: 0,
    };
}

/// Progress `q` of the transition into the next scene, or `None` outside the window.
///
/// The window is clamped to the outgoing entry's duration. `q` lies in `(0, 1)`.
pub fn incoming_progress(
    entry_end: f64,
    entry_duration: f64,
    time: f64,
    window: f64,
) -> Option<f64> {
    let window = window.min(entry_duration);
    if window.is_nan() || window <= 0.0 {
        return None;
    }
    let remaining = entry_end - time;
    if remaining <= 0.0 || remaining > window {
        return None;
    }
    let q = 1.0 - remaining / window;
    (q > 0.0).then_some(q)
}

/// Parameters for drawing the incoming image of a `kind` transition at progress `q`.
pub fn transition_params(
    kind: TransitionType,
    q: f64,
    canvas_width: u32,
    blur_max_px: u32,
) -> TransitionParams {
    let q = q.clamp(0.0, 1.0);
    match kind {
        TransitionType::Fade | TransitionType::Dissolve => TransitionParams {
            opacity: q as f32,
            ..TransitionParams::IDENTITY
        },
        TransitionType::Slide => TransitionParams {
            offset_x: f64::from(canvas_width) * (1.0 - q),
            ..TransitionParams::IDENTITY
        },
        TransitionType::Zoom => TransitionParams {
            opacity: q as f32,
            scale: 0.8 + 0.2 * q,
            ..TransitionParams::IDENTITY
        },
        TransitionType::Blur => TransitionParams {
            opacity: q as f32,
            blur_radius: (f64::from(blur_max_px) * (1.0 - q)).round() as u32,
            ..TransitionParams::IDENTITY
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;

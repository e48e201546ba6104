use crate::scene::asset::AssetStatus;

/// Convenience result type used across storyreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by compositor, scheduling and capture APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A scene lacks a completed, fully decoded image.
    #[error("asset not ready: scene {scene_id} is {status}")]
    AssetNotReady {
        /// Scene whose asset is missing or incomplete.
        scene_id: u32,
        /// Observed asset status (`pending` when no asset exists at all).
        status: AssetStatus,
    },

    /// The host has no acceptable capture container/codec pair.
    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// Nothing to play: no scenes, or every scene has zero duration.
    #[error("empty timeline: nothing to play")]
    EmptyTimeline,

    /// The encoder finished but produced zero bytes.
    #[error("empty capture: the encoder produced no data")]
    EmptyCapture,

    /// Runtime failure while rendering, mixing or encoding.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ReelError::EncoderUnavailable`] value.
    pub fn encoder_unavailable(msg: impl Into<String>) -> Self {
        Self::EncoderUnavailable(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

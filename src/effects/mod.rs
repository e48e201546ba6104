//! CPU pixel effects used by the compositor.

/// Separable Gaussian blur.
pub mod blur;
/// Premultiplied compositing and the vignette.
pub mod composite;
/// Per-transition drawing parameters.
pub mod transitions;

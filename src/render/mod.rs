//! Frame compositor: the [`surface::Surface`] drawing contract, its `vello_cpu` realization and
//! the stateless [`frame::render_frame`].

/// Software surface.
pub mod cpu;
/// Per-frame composition.
pub mod frame;
/// Drawing contract and frame buffers.
pub mod surface;

use crate::foundation::core::{Affine, Rect, Rgba8Premul};
use crate::foundation::error::ReelResult;
use crate::scene::asset::SceneImage;

/// A rendered frame in RGBA8 format.
///
/// `data` is tightly packed row-major `width * height * 4` bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel bytes.
    pub data: Vec<u8>,
    /// Whether color channels are premultiplied by alpha.
    pub premultiplied: bool,
}

/// One image draw: `image` placed by `transform` (image space to canvas space).
#[derive(Clone, Copy, Debug)]
pub struct ImageDraw<'a> {
    /// Pixels to draw.
    pub image: &'a SceneImage,
    /// Maps image pixel coordinates to canvas coordinates.
    pub transform: Affine,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f32,
    /// Gaussian blur radius applied to the placed image (0 = sharp).
    pub blur_radius: u32,
}

/// 2D drawing target the compositor paints into.
///
/// Every frame is painted from scratch: `clear` first, then draws in order.
pub trait Surface {
    /// Width in pixels.
    fn width(&self) -> u32;
    /// Height in pixels.
    fn height(&self) -> u32;
    /// Fill the whole surface with `color`.
    fn clear(&mut self, color: Rgba8Premul) -> ReelResult<()>;
    /// Composite an image over the current contents.
    fn draw_image(&mut self, draw: ImageDraw<'_>) -> ReelResult<()>;
    /// Composite a solid rectangle over the current contents.
    fn fill_rect(&mut self, rect: Rect, color: Rgba8Premul) -> ReelResult<()>;
    /// Darken the edges of the whole surface.
    fn apply_vignette(&mut self, strength: f32) -> ReelResult<()>;
    /// Copy of the current pixels.
    fn snapshot(&self) -> ReelResult<FrameRGBA>;
}

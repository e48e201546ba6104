use std::collections::HashMap;

use crate::effects::blur::{blur_rgba8_premul, sigma_for_radius};
use crate::effects::composite::{over_in_place, vignette_in_place};
use crate::foundation::core::{Affine, Rect, Rgba8Premul};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::{FrameRGBA, ImageDraw, Surface};
use crate::scene::asset::SceneImage;

/// Software [`Surface`] backed by `vello_cpu`.
///
/// Each draw is rasterized into a transparent scratch layer, optionally blurred, then composited
/// over the frame with premultiplied source-over.
pub struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    image_cache: HashMap<u64, vello_cpu::Image>,
}

impl CpuSurface {
    /// Create a transparent surface of `width x height` pixels.
    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        let width: u16 = width
            .try_into()
            .map_err(|_| ReelError::evaluation("surface width exceeds u16"))?;
        let height: u16 = height
            .try_into()
            .map_err(|_| ReelError::evaluation("surface height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(ReelError::validation("surface width/height must be non-zero"));
        }
        Ok(Self {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
            image_cache: HashMap::new(),
        })
    }

    /// Number of distinct images uploaded so far.
    pub fn cached_images(&self) -> usize {
        self.image_cache.len()
    }

    fn image_paint_for(&mut self, image: &SceneImage) -> ReelResult<vello_cpu::Image> {
        if let Some(paint) = self.image_cache.get(&image.key) {
            return Ok(paint.clone());
        }
        let pixmap = image_premul_bytes_to_pixmap(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache.insert(image.key, paint.clone());
        Ok(paint)
    }

    /// Rasterize a single fill into a fresh transparent layer.
    fn rasterize(&self, fill: impl FnOnce(&mut vello_cpu::RenderContext)) -> vello_cpu::Pixmap {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        fill(&mut ctx);
        ctx.flush();
        let mut layer = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut layer);
        layer
    }

    fn composite_layer(&mut self, layer: &[u8], opacity: f32) -> ReelResult<()> {
        over_in_place(self.pixmap.data_as_u8_slice_mut(), layer, opacity)
    }
}

impl Surface for CpuSurface {
    fn width(&self) -> u32 {
        u32::from(self.width)
    }

    fn height(&self) -> u32 {
        u32::from(self.height)
    }

    fn clear(&mut self, color: Rgba8Premul) -> ReelResult<()> {
        let rgba = color.to_array();
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        Ok(())
    }

    fn draw_image(&mut self, draw: ImageDraw<'_>) -> ReelResult<()> {
        if draw.opacity <= 0.0 || !draw.image.is_drawable() {
            return Ok(());
        }
        let paint = self.image_paint_for(draw.image)?;
        let (iw, ih) = (f64::from(draw.image.width), f64::from(draw.image.height));

        let layer = self.rasterize(|ctx| {
            ctx.set_transform(affine_to_cpu(draw.transform));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
        });

        if draw.blur_radius > 0 {
            let blurred = blur_rgba8_premul(
                layer.data_as_u8_slice(),
                self.width(),
                self.height(),
                draw.blur_radius,
                sigma_for_radius(draw.blur_radius),
            )?;
            self.composite_layer(&blurred, draw.opacity)
        } else {
            self.composite_layer(layer.data_as_u8_slice(), draw.opacity)
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8Premul) -> ReelResult<()> {
        if color.a == 0 || rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Ok(());
        }
        let [r, g, b, a] = unpremultiply(color);
        let layer = self.rasterize(|ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
        });
        self.composite_layer(layer.data_as_u8_slice(), 1.0)
    }

    fn apply_vignette(&mut self, strength: f32) -> ReelResult<()> {
        let (w, h) = (self.width(), self.height());
        vignette_in_place(self.pixmap.data_as_u8_slice_mut(), w, h, strength)
    }

    fn snapshot(&self) -> ReelResult<FrameRGBA> {
        Ok(FrameRGBA {
            width: self.width(),
            height: self.height(),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn unpremultiply(c: Rgba8Premul) -> [u8; 4] {
    if c.a == 255 || c.a == 0 {
        return c.to_array();
    }
    let a = u32::from(c.a);
    let un = |v: u8| ((u32::from(v) * 255 + a / 2) / a).min(255) as u8;
    [un(c.r), un(c.g), un(c.b), c.a]
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::evaluation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::evaluation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ReelError::evaluation("scene image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels: Vec<_> = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;

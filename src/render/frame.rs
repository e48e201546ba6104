use crate::effects::transitions::{TransitionParams, incoming_progress, transition_params};
use crate::foundation::config::ReelConfig;
use crate::foundation::core::{Affine, Rect, Rgba8Premul};
use crate::foundation::error::ReelResult;
use crate::render::surface::{ImageDraw, Surface};
use crate::scene::asset::{AssetMap, SceneImage};
use crate::timeline::builder::Timeline;

const PLACEHOLDER_BG: u8 = 0x2e;
const PLACEHOLDER_FG: u8 = 0x8c;
const HOOK_BAR_COLOR: Rgba8Premul = Rgba8Premul {
    r: 255,
    g: 196,
    b: 0,
    a: 255,
};

/// 3x5 bitmaps for `0..=9`, one row per entry, MSB is the left column.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Paint the composited frame at `time` into `surface`.
///
/// Pure in `time`: the surface is fully repainted on every call. Missing images degrade to a
/// placeholder, and an empty timeline yields a black frame. Returns the active entry index.
pub fn render_frame(
    surface: &mut dyn Surface,
    timeline: &Timeline,
    assets: &AssetMap,
    time: f64,
    cfg: &ReelConfig,
) -> ReelResult<Option<usize>> {
    surface.clear(Rgba8Premul::BLACK)?;

    let Some(idx) = timeline.active_index(time) else {
        return Ok(None);
    };
    let Some(entry) = timeline.entry(idx) else {
        return Ok(None);
    };
    let t = timeline.clamp_time(time);
    let p = entry.progress(t);

    match assets.image_for(entry.scene.id) {
        Some(image) => {
            let transform = cover_transform(&*surface, image, 1.0 + cfg.zoom_amount * p, 0.0);
            surface.draw_image(ImageDraw {
                image,
                transform,
                opacity: 1.0,
                blur_radius: 0,
            })?;
        }
        None => draw_placeholder(surface, entry.scene.id)?,
    }

    if let Some(next) = timeline.entry(idx + 1)
        && let Some(next_image) = assets.image_for(next.scene.id)
        && let Some(q) =
            incoming_progress(entry.end, entry.duration, t, cfg.transition_window_secs)
    {
        let TransitionParams {
            opacity,
            offset_x,
            scale,
            blur_radius,
        } = transition_params(
            next.scene.transition_type,
            q,
            surface.width(),
            cfg.blur_max_px,
        );
        let transform = cover_transform(&*surface, next_image, scale, offset_x);
        surface.draw_image(ImageDraw {
            image: next_image,
            transform,
            opacity,
            blur_radius,
        })?;
    }

    surface.apply_vignette(cfg.vignette_strength)?;

    let hook_time = time.max(0.0);
    if entry.scene.is_hook && cfg.hook_bar_secs > 0.0 && hook_time < cfg.hook_bar_secs {
        let remaining = 1.0 - hook_time / cfg.hook_bar_secs;
        let w = f64::from(surface.width());
        let bar_h = (f64::from(surface.height()) * 0.008).max(2.0);
        surface.fill_rect(Rect::new(0.0, 0.0, w * remaining, bar_h), HOOK_BAR_COLOR)?;
    }

    Ok(Some(idx))
}

/// Center `image`, scale it to cover the surface, then apply `extra_scale` and a horizontal shift.
pub fn cover_transform(
    surface: &dyn Surface,
    image: &SceneImage,
    extra_scale: f64,
    offset_x: f64,
) -> Affine {
    let (sw, sh) = (f64::from(surface.width()), f64::from(surface.height()));
    let (iw, ih) = (
        f64::from(image.width.max(1)),
        f64::from(image.height.max(1)),
    );
    let cover = (sw / iw).max(sh / ih);
    Affine::translate((sw / 2.0 + offset_x, sh / 2.0))
        * Affine::scale(cover * extra_scale)
        * Affine::translate((-iw / 2.0, -ih / 2.0))
}

fn draw_placeholder(surface: &mut dyn Surface, scene_id: u32) -> ReelResult<()> {
    let (sw, sh) = (f64::from(surface.width()), f64::from(surface.height()));
    surface.fill_rect(
        Rect::new(0.0, 0.0, sw, sh),
        Rgba8Premul::grey(PLACEHOLDER_BG),
    )?;

    let digits: Vec<usize> = scene_id
        .to_string()
        .bytes()
        .map(|b| usize::from(b - b'0'))
        .collect();
    let cell = (sh / 24.0).floor().max(1.0);
    let advance = 4.0 * cell;
    let text_w = advance * digits.len() as f64 - cell;
    let x0 = ((sw - text_w) / 2.0).floor();
    let y0 = ((sh - 5.0 * cell) / 2.0).floor();

    let fg = Rgba8Premul::grey(PLACEHOLDER_FG);
    for (i, &d) in digits.iter().enumerate() {
        let gx = x0 + advance * i as f64;
        for (row, bits) in DIGITS[d].iter().enumerate() {
            for col in 0..3u8 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let x = gx + f64::from(col) * cell;
                let y = y0 + row as f64 * cell;
                surface.fill_rect(Rect::new(x, y, x + cell, y + cell), fg)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;

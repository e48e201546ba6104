use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{mul_div255_u8, mul_div255_u16, smoothstep};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Normalized corner distance at which the vignette starts darkening.
const VIGNETTE_INNER: f32 = 0.45;

/// Porter-Duff source-over of premultiplied pixels, with `src` scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u16(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - sa;

    let mut out = [0u8; 4];
    out[3] = (sa as u8).saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Composite `src` over `dst` pixel by pixel. Buffers must be equal-length RGBA8.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::evaluation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    if opacity <= 0.0 {
        return Ok(());
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Darken toward the corners with a radial falloff; the center is untouched.
///
/// `strength` is the fraction of color removed at the very corners.
pub fn vignette_in_place(dst: &mut [u8], width: u32, height: u32, strength: f32) -> ReelResult<()> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ReelError::evaluation("vignette buffer size overflow"))?;
    if dst.len() != expected_len {
        return Err(ReelError::evaluation(
            "vignette_in_place expects a buffer matching width*height*4",
        ));
    }
    let strength = strength.clamp(0.0, 1.0);
    if strength <= 0.0 || expected_len == 0 {
        return Ok(());
    }

    let (w, h) = (width as f32, height as f32);
    for (i, px) in dst.chunks_exact_mut(4).enumerate() {
        let x = (i % width as usize) as f32;
        let y = (i / width as usize) as f32;
        let dx = ((x + 0.5) / w) * 2.0 - 1.0;
        let dy = ((y + 0.5) / h) * 2.0 - 1.0;
        let d = ((dx * dx + dy * dy) / 2.0).sqrt();

        let keep = 1.0 - strength * smoothstep(VIGNETTE_INNER, 1.0, d);
        let k = ((keep * 255.0).round() as i32).clamp(0, 255) as u16;
        if k == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), k);
        }
    }
    Ok(())
}

/// Flatten premultiplied pixels over an opaque background into opaque RGBA8 in `dst`.
pub fn flatten_premul_over_bg(dst: &mut [u8], src: &[u8], bg: PremulRgba8) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::evaluation(
            "flatten_premul_over_bg expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - u16::from(s[3]);
        for c in 0..3 {
            let v = u16::from(s[c]) + mul_div255_u16(u16::from(bg[c]), inv);
            d[c] = v.min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;

use std::path::Path;

use anyhow::Context;

use crate::audio::offline::MIX_SAMPLE_RATE;
use crate::foundation::config::ffmpeg_program;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u8;
use crate::scene::asset::{AudioBuffer, SceneImage};

/// Decode an encoded image (PNG, JPEG, ...) into a ready, premultiplied [`SceneImage`].
pub fn decode_image(bytes: &[u8]) -> ReelResult<SceneImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    SceneImage::from_premul_rgba8(width, height, rgba8_premul)
}

/// Read and decode an image file.
pub fn decode_image_file(path: &Path) -> ReelResult<SceneImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

/// Decode any audio file the system `ffmpeg` understands into 48 kHz interleaved stereo.
#[tracing::instrument(level = "debug", fields(path = %path.display()))]
pub fn decode_audio_file(path: &Path) -> ReelResult<AudioBuffer> {
    let out = std::process::Command::new(ffmpeg_program())
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &MIX_SAMPLE_RATE.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            ReelError::evaluation(format!("failed to run ffmpeg for audio decode: {e}"))
        })?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        return Err(ReelError::evaluation(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }
    pcm_from_f32le(&out.stdout, MIX_SAMPLE_RATE, 2)
}

/// Interpret raw little-endian `f32` bytes as interleaved PCM.
pub fn pcm_from_f32le(bytes: &[u8], sample_rate: u32, channels: u16) -> ReelResult<AudioBuffer> {
    if !bytes.len().is_multiple_of(4) {
        return Err(ReelError::evaluation(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let pcm = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    AudioBuffer::new(sample_rate, channels, pcm)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), a);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

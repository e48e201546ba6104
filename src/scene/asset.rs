use std::collections::BTreeMap;
use std::sync::Arc;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::Fnv1a64;

/// Lifecycle of a per-scene asset produced by the generation collaborators.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    /// Requested but not started.
    #[default]
    Pending,
    /// Generation or decode in flight.
    Loading,
    /// Image and narration are available.
    Completed,
    /// Generation or decode failed.
    Error,
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Loading => "loading",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Decoded, displayable scene image (premultiplied RGBA8, row-major).
#[derive(Clone, Debug)]
pub struct SceneImage {
    /// Content fingerprint; stable for identical pixels and used as a render cache key.
    pub key: u64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
    /// `false` while the host is still decoding the image.
    pub ready: bool,
}

impl SceneImage {
    /// Wrap premultiplied pixels as a ready image.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> ReelResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| ReelError::validation("image size overflow"))?;
        if rgba8_premul.len() != expected {
            return Err(ReelError::validation(format!(
                "image byte length {} does not match {width}x{height}x4",
                rgba8_premul.len()
            )));
        }

        let mut h = Fnv1a64::new_default();
        h.write_u32(width);
        h.write_u32(height);
        h.write_bytes(&rgba8_premul);

        Ok(Self {
            key: h.finish(),
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
            ready: true,
        })
    }

    /// Solid-color image, mostly useful for tests and placeholders.
    pub fn solid(width: u32, height: u32, premul: [u8; 4]) -> ReelResult<Self> {
        let px = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| ReelError::validation("image size overflow"))?;
        Self::from_premul_rgba8(width, height, premul.repeat(px))
    }

    /// Return `true` when the image can be drawn.
    pub fn is_drawable(&self) -> bool {
        self.ready && self.width > 0 && self.height > 0
    }
}

/// Decoded audio samples (interleaved `f32`).
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (1 or 2).
    pub channels: u16,
    /// Interleaved samples.
    pub interleaved_f32: Arc<Vec<f32>>,
}

impl AudioBuffer {
    /// Wrap interleaved samples.
    pub fn new(sample_rate: u32, channels: u16, interleaved_f32: Vec<f32>) -> ReelResult<Self> {
        if sample_rate == 0 {
            return Err(ReelError::validation("audio sample_rate must be non-zero"));
        }
        if !(1..=2).contains(&channels) {
            return Err(ReelError::validation("audio channels must be 1 or 2"));
        }
        if !interleaved_f32.len().is_multiple_of(usize::from(channels)) {
            return Err(ReelError::validation(
                "audio sample count is not a multiple of the channel count",
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
            interleaved_f32: Arc::new(interleaved_f32),
        })
    }

    /// `secs` of silence.
    pub fn silence(sample_rate: u32, channels: u16, secs: f64) -> ReelResult<Self> {
        let frames = (secs.max(0.0) * f64::from(sample_rate)).round() as usize;
        Self::new(sample_rate, channels, vec![0.0; frames * usize::from(channels)])
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }
}

/// Per-scene generation result, owned by the application layer.
#[derive(Clone, Debug, Default)]
pub struct GeneratedAsset {
    /// Scene this asset belongs to.
    pub scene_id: u32,
    /// Decoded image handle, if any.
    pub image: Option<Arc<SceneImage>>,
    /// Decoded narration, if any.
    pub audio: Option<Arc<AudioBuffer>>,
    /// Generation status.
    pub status: AssetStatus,
}

impl GeneratedAsset {
    /// A completed asset with both image and narration.
    pub fn completed(scene_id: u32, image: SceneImage, audio: Option<AudioBuffer>) -> Self {
        Self {
            scene_id,
            image: Some(Arc::new(image)),
            audio: audio.map(Arc::new),
            status: AssetStatus::Completed,
        }
    }

    /// An asset that has not produced anything yet.
    pub fn with_status(scene_id: u32, status: AssetStatus) -> Self {
        Self {
            scene_id,
            image: None,
            audio: None,
            status,
        }
    }

    /// The image, when present and fully decoded.
    pub fn drawable_image(&self) -> Option<&SceneImage> {
        self.image.as_deref().filter(|img| img.is_drawable())
    }

    /// Duration of the decoded narration, if any.
    pub fn narration_secs(&self) -> Option<f64> {
        self.audio.as_ref().map(|a| a.duration_secs())
    }
}

/// Read-only view of generated assets keyed by scene id.
#[derive(Clone, Debug, Default)]
pub struct AssetMap {
    by_scene: BTreeMap<u32, GeneratedAsset>,
}

impl AssetMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the asset for `asset.scene_id`.
    pub fn insert(&mut self, asset: GeneratedAsset) {
        self.by_scene.insert(asset.scene_id, asset);
    }

    /// Look up the asset for a scene.
    pub fn get(&self, scene_id: u32) -> Option<&GeneratedAsset> {
        self.by_scene.get(&scene_id)
    }

    /// Drawable image for a scene, if one is ready.
    pub fn image_for(&self, scene_id: u32) -> Option<&SceneImage> {
        self.get(scene_id).and_then(GeneratedAsset::drawable_image)
    }

    /// Decoded narration for a scene, if any.
    pub fn audio_for(&self, scene_id: u32) -> Option<&Arc<AudioBuffer>> {
        self.get(scene_id).and_then(|a| a.audio.as_ref())
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.by_scene.len()
    }

    /// Return `true` when no asset is present.
    pub fn is_empty(&self) -> bool {
        self.by_scene.is_empty()
    }
}

impl FromIterator<GeneratedAsset> for AssetMap {
    fn from_iter<T: IntoIterator<Item = GeneratedAsset>>(iter: T) -> Self {
        let mut map = Self::new();
        for asset in iter {
            map.insert(asset);
        }
        map
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/asset.rs"]
mod tests;

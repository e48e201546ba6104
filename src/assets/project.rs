use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::assets::decode::{decode_audio_file, decode_image_file};
use crate::foundation::config::ReelConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::asset::{AssetMap, AssetStatus, AudioBuffer, GeneratedAsset, SceneImage};
use crate::scene::model::Scene;

/// One scene entry of a project file: the scene itself plus its media paths.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectScene {
    /// Scene description.
    #[serde(flatten)]
    pub scene: Scene,
    /// Image path, relative to the project file.
    #[serde(default)]
    pub image: Option<PathBuf>,
    /// Narration path, relative to the project file.
    #[serde(default)]
    pub audio: Option<PathBuf>,
}

/// On-disk project description (JSON).
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectFile {
    /// Session settings; any omitted field keeps its default.
    #[serde(default)]
    pub settings: ReelConfig,
    /// Scenes in any order.
    pub scenes: Vec<ProjectScene>,
    /// Optional looping background bed.
    #[serde(default)]
    pub background_music: Option<PathBuf>,
}

impl ProjectFile {
    /// Parse and validate project JSON.
    pub fn from_json(text: &str) -> ReelResult<Self> {
        let file: Self = serde_json::from_str(text).context("parse project json")?;
        file.settings.validate()?;

        let mut seen = BTreeSet::new();
        for s in &file.scenes {
            if !seen.insert(s.scene.id) {
                return Err(ReelError::validation(format!(
                    "duplicate scene id {}",
                    s.scene.id
                )));
            }
            if !s.scene.duration_estimate.is_finite() || s.scene.duration_estimate < 0.0 {
                return Err(ReelError::validation(format!(
                    "scene {} durationEstimate must be finite and >= 0",
                    s.scene.id
                )));
            }
        }
        Ok(file)
    }
}

/// A project with every asset decoded and ready for the controller.
#[derive(Clone, Debug)]
pub struct Project {
    /// Effective settings.
    pub config: ReelConfig,
    /// Scenes, durations widened to their narration.
    pub scenes: Vec<Scene>,
    /// Decoded per-scene assets.
    pub assets: AssetMap,
    /// Decoded background bed.
    pub background: Option<Arc<AudioBuffer>>,
}

/// Load a project file and decode its media.
///
/// Media paths are resolved against the project file's directory. A scene whose image or
/// narration fails to decode is kept with status `error`; a missing image path leaves it
/// `pending`. Neither aborts loading.
#[tracing::instrument(level = "info", fields(path = %path.display()))]
pub fn load_project(path: &Path) -> ReelResult<Project> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read project '{}'", path.display()))?;
    let file = ProjectFile::from_json(&text)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(resolve_project(file, base, &decode_image_file, &decode_audio_file))
}

/// Decode every asset of `file` with the given decoders.
pub(crate) fn resolve_project(
    file: ProjectFile,
    base: &Path,
    decode_image: &dyn Fn(&Path) -> ReelResult<SceneImage>,
    decode_audio: &dyn Fn(&Path) -> ReelResult<AudioBuffer>,
) -> Project {
    let pad = file.settings.narration_pad_secs;
    let mut scenes = Vec::with_capacity(file.scenes.len());
    let mut assets = AssetMap::new();

    for entry in file.scenes {
        let mut scene = entry.scene;
        let mut asset = GeneratedAsset::with_status(scene.id, AssetStatus::Pending);
        let mut failed = false;

        if let Some(rel) = &entry.image {
            match decode_image(&base.join(rel)) {
                Ok(img) => asset.image = Some(Arc::new(img)),
                Err(e) => {
                    tracing::warn!(scene = scene.id, error = %e, "image decode failed");
                    failed = true;
                }
            }
        }
        if let Some(rel) = &entry.audio {
            match decode_audio(&base.join(rel)) {
                Ok(buf) => asset.audio = Some(Arc::new(buf)),
                Err(e) => {
                    tracing::warn!(scene = scene.id, error = %e, "narration decode failed");
                    failed = true;
                }
            }
        }

        asset.status = if failed {
            AssetStatus::Error
        } else if asset.image.is_some() {
            AssetStatus::Completed
        } else {
            AssetStatus::Pending
        };
        if let Some(secs) = asset.narration_secs()
            && scene.widen_to_narration(secs, pad)
        {
            tracing::debug!(scene = scene.id, duration = scene.duration_estimate, "widened");
        }

        scenes.push(scene);
        assets.insert(asset);
    }

    let background = file.background_music.and_then(|rel| {
        decode_audio(&base.join(&rel))
            .inspect_err(|e| tracing::warn!(error = %e, "background music decode failed"))
            .ok()
            .map(Arc::new)
    });

    tracing::info!(
        scenes = scenes.len(),
        background = background.is_some(),
        "project loaded"
    );
    Project {
        config: file.settings,
        scenes,
        assets,
        background,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/project.rs"]
mod tests;

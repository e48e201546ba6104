use super::*;
use crate::scene::asset::{GeneratedAsset, SceneImage};
use crate::scene::model::Scene;
use crate::timeline::builder::build_timeline;

const TOL: f64 = 1e-9;

fn fixture(durations: &[f64]) -> (Timeline, AssetMap) {
    let scenes: Vec<Scene> = durations
        .iter()
        .enumerate()
        .map(|(i, _)| Scene::new(i as u32 + 1, 1.0))
        .collect();
    let mut assets = AssetMap::new();
    for (i, &d) in durations.iter().enumerate() {
        // 100 Hz mono keeps buffers tiny while giving exact durations.
        let frames = (d * 100.0).round() as usize;
        assets.insert(GeneratedAsset::completed(
            i as u32 + 1,
            SceneImage::solid(1, 1, [0, 0, 0, 255]).unwrap(),
            Some(AudioBuffer::new(100, 1, vec![0.0; frames]).unwrap()),
        ));
    }
    (build_timeline(&scenes, &assets), assets)
}

#[test]
fn plan_from_zero_schedules_every_entry_relative_to_anchor() {
    let (tl, assets) = fixture(&[4.0, 3.0, 5.0]);
    let plan = plan_audio(&tl, &assets, None, 0.125, 0.0, 10.0);
    assert_eq!(plan.narration.len(), 3);
    let starts: Vec<f64> = plan.narration.iter().map(|c| c.graph_start_time).collect();
    assert_eq!(starts, vec![10.0, 14.0, 17.0]);
    for c in &plan.narration {
        assert_eq!(c.source_play_offset, 0.0);
    }
    assert!((plan.narration[2].stop_time - 22.0).abs() < TOL);
    assert!(plan.background.is_none());
}

#[test]
fn in_progress_entry_starts_now_with_offset() {
    let (tl, assets) = fixture(&[4.0, 3.0, 5.0]);
    let plan = plan_audio(&tl, &assets, None, 0.125, 5.2, 100.0);
    assert_eq!(plan.narration.len(), 2);

    let first = &plan.narration[0];
    assert_eq!(first.scene_id, 2);
    assert!((first.graph_start_time - 100.0).abs() < TOL);
    assert!((first.source_play_offset - 1.2).abs() < TOL);
    assert!((first.stop_time - 101.8).abs() < TOL);

    let second = &plan.narration[1];
    assert_eq!(second.scene_id, 3);
    assert!((second.graph_start_time - 101.8).abs() < TOL);
    assert!((second.stop_time - 106.8).abs() < TOL);
}

#[test]
fn clip_lengths_equal_remaining_interval_for_every_offset() {
    let (tl, assets) = fixture(&[4.0, 3.0, 5.0, 0.5]);
    let total = tl.total_duration();
    let mut t0 = 0.0;
    while t0 < total {
        let plan = plan_audio(&tl, &assets, None, 0.125, t0, 3.0);
        let intersecting = tl.entries().iter().filter(|e| e.end > t0).count();
        assert_eq!(plan.narration.len(), intersecting, "t0={t0}");
        for clip in &plan.narration {
            let entry = tl.entry(clip.entry_index).unwrap();
            let expected = entry.end - entry.start.max(t0);
            assert!(
                ((clip.stop_time - clip.graph_start_time) - expected).abs() < TOL,
                "t0={t0} scene={}",
                clip.scene_id
            );
        }
        t0 += 0.37;
    }
}

#[test]
fn offset_at_or_past_end_plans_nothing() {
    let (tl, assets) = fixture(&[1.0, 1.0]);
    let bg = Arc::new(AudioBuffer::new(100, 1, vec![0.0; 300]).unwrap());
    let plan = plan_audio(&tl, &assets, Some(&bg), 0.125, 2.0, 0.0);
    assert!(plan.is_empty());
}

#[test]
fn background_offset_wraps_modulo_its_duration() {
    let (tl, assets) = fixture(&[10.0, 10.0]);
    let bg = Arc::new(AudioBuffer::new(100, 1, vec![0.0; 300]).unwrap());
    let plan = plan_audio(&tl, &assets, Some(&bg), 0.125, 7.5, 1.0);
    let bed = plan.background.unwrap();
    assert!((bed.source_play_offset - 1.5).abs() < TOL);
    assert_eq!(bed.graph_start_time, 1.0);
    assert_eq!(bed.gain, 0.125);
}

#[test]
fn entries_without_narration_are_not_scheduled() {
    let scenes = vec![Scene::new(1, 2.0), Scene::new(2, 2.0)];
    let mut assets = AssetMap::new();
    assets.insert(GeneratedAsset::completed(
        2,
        SceneImage::solid(1, 1, [0, 0, 0, 255]).unwrap(),
        Some(AudioBuffer::new(100, 1, vec![0.0; 200]).unwrap()),
    ));
    let tl = build_timeline(&scenes, &assets);
    let plan = plan_audio(&tl, &assets, None, 0.125, 0.0, 0.0);
    assert_eq!(plan.narration.len(), 1);
    assert_eq!(plan.narration[0].scene_id, 2);
}

#[test]
fn plan_serializes_without_sample_data() {
    let (tl, assets) = fixture(&[1.0]);
    let plan = plan_audio(&tl, &assets, None, 0.125, 0.0, 0.0);
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["narration"][0]["sceneId"], 1);
    assert!(json["narration"][0].get("buffer").is_none());
}

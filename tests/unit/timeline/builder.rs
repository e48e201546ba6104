use super::*;
use crate::scene::asset::{AudioBuffer, GeneratedAsset, SceneImage};

fn scenes(durations: &[f64]) -> Vec<Scene> {
    durations
        .iter()
        .enumerate()
        .map(|(i, &d)| Scene::new(i as u32 + 1, d))
        .collect()
}

#[test]
fn three_scene_example_matches_expected_intervals() {
    let tl = build_timeline(&scenes(&[4.0, 3.0, 5.0]), &AssetMap::new());
    let got: Vec<(f64, f64, f64)> = tl
        .entries()
        .iter()
        .map(|e| (e.start, e.duration, e.end))
        .collect();
    assert_eq!(got, vec![(0.0, 4.0, 4.0), (4.0, 3.0, 7.0), (7.0, 5.0, 12.0)]);
    assert_eq!(tl.total_duration(), 12.0);

    let idx = tl.active_index(6.5).unwrap();
    assert_eq!(tl.entry(idx).unwrap().scene.id, 2);
    let p = tl.entry(idx).unwrap().progress(6.5);
    assert!((p - 2.5 / 3.0).abs() < 1e-9);
}

#[test]
fn entries_are_contiguous_for_varied_durations() {
    let cases: [&[f64]; 4] = [
        &[1.0],
        &[0.25, 7.5, 0.0, 3.125],
        &[10.0, 10.0, 10.0, 10.0, 10.0],
        &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7],
    ];
    for durations in cases {
        let tl = build_timeline(&scenes(durations), &AssetMap::new());
        let entries = tl.entries();
        assert_eq!(entries[0].start, 0.0);
        for pair in entries.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].scene.id < pair[1].scene.id);
        }
        assert_eq!(tl.total_duration(), entries.last().unwrap().end);
    }
}

#[test]
fn empty_scene_list_is_nothing_to_play() {
    let tl = build_timeline(&[], &AssetMap::new());
    assert!(tl.entries().is_empty());
    assert_eq!(tl.total_duration(), 0.0);
    assert!(tl.is_empty());
    assert_eq!(tl.active_index(1.0), None);
}

#[test]
fn scenes_are_ordered_by_id() {
    let input = vec![Scene::new(3, 1.0), Scene::new(1, 2.0), Scene::new(2, 3.0)];
    let tl = build_timeline(&input, &AssetMap::new());
    let ids: Vec<u32> = tl.entries().iter().map(|e| e.scene.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(tl.entries()[1].start, 2.0);
}

#[test]
fn decoded_narration_length_overrides_estimate() {
    let mut assets = AssetMap::new();
    assets.insert(GeneratedAsset::completed(
        1,
        SceneImage::solid(1, 1, [0, 0, 0, 255]).unwrap(),
        Some(AudioBuffer::new(10, 1, vec![0.0; 25]).unwrap()),
    ));
    let tl = build_timeline(&scenes(&[4.0, 3.0]), &assets);
    assert!((tl.entries()[0].duration - 2.5).abs() < 1e-12);
    assert!((tl.entries()[1].start - 2.5).abs() < 1e-12);
    assert!((tl.total_duration() - 5.5).abs() < 1e-12);
}

#[test]
fn non_finite_durations_count_as_zero() {
    let tl = build_timeline(&scenes(&[f64::NAN, -2.0, 1.0]), &AssetMap::new());
    assert_eq!(tl.entries()[0].duration, 0.0);
    assert_eq!(tl.entries()[1].duration, 0.0);
    assert_eq!(tl.total_duration(), 1.0);
    assert_eq!(tl.active_index(0.0), Some(2));
}

#[test]
fn past_end_holds_last_entry() {
    let tl = build_timeline(&scenes(&[4.0, 3.0, 5.0]), &AssetMap::new());
    assert_eq!(tl.active_index(12.0), Some(2));
    assert_eq!(tl.active_index(99.0), Some(2));
    assert_eq!(tl.active_index(-1.0), Some(0));
    assert_eq!(tl.active_index(4.0), Some(1));
}

#[test]
fn all_zero_durations_is_empty() {
    let tl = build_timeline(&scenes(&[0.0, 0.0]), &AssetMap::new());
    assert_eq!(tl.len(), 2);
    assert!(tl.is_empty());
    assert_eq!(tl.active_index(0.0), None);
}

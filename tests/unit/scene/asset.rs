use super::*;

#[test]
fn image_key_tracks_content() {
    let a = SceneImage::solid(2, 2, [255, 0, 0, 255]).unwrap();
    let b = SceneImage::solid(2, 2, [255, 0, 0, 255]).unwrap();
    let c = SceneImage::solid(2, 2, [0, 255, 0, 255]).unwrap();
    assert_eq!(a.key, b.key);
    assert_ne!(a.key, c.key);
}

#[test]
fn image_length_mismatch_is_rejected() {
    assert!(SceneImage::from_premul_rgba8(2, 2, vec![0; 15]).is_err());
}

#[test]
fn audio_duration_counts_frames_not_samples() {
    let stereo = AudioBuffer::new(4, 2, vec![0.0; 16]).unwrap();
    assert_eq!(stereo.frames(), 8);
    assert!((stereo.duration_secs() - 2.0).abs() < 1e-12);

    assert!(AudioBuffer::new(0, 2, vec![]).is_err());
    assert!(AudioBuffer::new(4, 3, vec![]).is_err());
    assert!(AudioBuffer::new(4, 2, vec![0.0; 3]).is_err());
}

#[test]
fn undecoded_image_is_not_drawable() {
    let mut img = SceneImage::solid(1, 1, [0, 0, 0, 255]).unwrap();
    img.ready = false;
    let asset = GeneratedAsset {
        scene_id: 4,
        image: Some(Arc::new(img)),
        audio: None,
        status: AssetStatus::Loading,
    };
    let map: AssetMap = [asset].into_iter().collect();
    assert!(map.get(4).is_some());
    assert!(map.image_for(4).is_none());
    assert!(map.image_for(5).is_none());
}

#[test]
fn status_display_is_lowercase() {
    assert_eq!(AssetStatus::Completed.to_string(), "completed");
    assert_eq!(AssetStatus::Error.to_string(), "error");
}

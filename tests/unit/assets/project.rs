use super::*;
use crate::scene::model::TransitionType;

const JSON: &str = r#"{
  "settings": { "fps": { "num": 24, "den": 1 }, "narrationPadSecs": 0.25 },
  "scenes": [
    { "id": 2, "durationEstimate": 3.0, "transitionType": "slide",
      "image": "two.png", "audio": "two.wav" },
    { "id": 1, "durationEstimate": 1.0, "isHook": true, "narration": "Hi",
      "image": "one.png", "audio": "one.wav" },
    { "id": 3, "durationEstimate": 2.0, "image": "broken.png" },
    { "id": 4, "durationEstimate": 2.0 }
  ],
  "backgroundMusic": "bed.mp3"
}"#;

fn fake_image(path: &Path) -> ReelResult<SceneImage> {
    if path.ends_with("broken.png") {
        return Err(ReelError::evaluation("corrupt png"));
    }
    SceneImage::solid(2, 2, [10, 20, 30, 255])
}

fn fake_audio(path: &Path) -> ReelResult<AudioBuffer> {
    let secs = if path.ends_with("one.wav") { 2.0 } else { 1.0 };
    AudioBuffer::silence(100, 2, secs)
}

#[test]
fn parses_settings_and_scene_fields() {
    let file = ProjectFile::from_json(JSON).unwrap();
    assert_eq!(file.settings.fps.num, 24);
    assert_eq!(file.settings.narration_pad_secs, 0.25);
    assert_eq!(file.settings.zoom_amount, 0.15);
    assert_eq!(file.scenes.len(), 4);
    assert_eq!(file.scenes[0].scene.transition_type, TransitionType::Slide);
    assert!(file.scenes[1].scene.is_hook);
    assert_eq!(file.scenes[1].scene.narration, "Hi");
    assert_eq!(file.scenes[2].scene.transition_type, TransitionType::Fade);
    assert_eq!(file.background_music, Some(PathBuf::from("bed.mp3")));
}

#[test]
fn rejects_duplicate_ids_and_bad_settings() {
    let dup = r#"{"scenes":[{"id":1,"durationEstimate":1},{"id":1,"durationEstimate":2}]}"#;
    assert!(matches!(
        ProjectFile::from_json(dup),
        Err(ReelError::Validation(_))
    ));
    let odd = r#"{"settings":{"canvas":{"width":3,"height":2}},"scenes":[]}"#;
    assert!(ProjectFile::from_json(odd).is_err());
    assert!(ProjectFile::from_json("{").is_err());
}

#[test]
fn resolve_decodes_assets_and_degrades_failures() {
    let file = ProjectFile::from_json(JSON).unwrap();
    let project = resolve_project(file, Path::new("/proj"), &fake_image, &fake_audio);

    let status = |id| project.assets.get(id).unwrap().status;
    assert_eq!(status(1), AssetStatus::Completed);
    assert_eq!(status(2), AssetStatus::Completed);
    assert_eq!(status(3), AssetStatus::Error);
    assert_eq!(status(4), AssetStatus::Pending);
    assert!(project.background.is_some());
    assert_eq!(project.config.fps.num, 24);
}

#[test]
fn resolve_widens_but_never_shrinks_durations() {
    let file = ProjectFile::from_json(JSON).unwrap();
    let project = resolve_project(file, Path::new("/proj"), &fake_image, &fake_audio);
    let duration = |id| {
        project
            .scenes
            .iter()
            .find(|s| s.id == id)
            .unwrap()
            .duration_estimate
    };
    // 2.0 s of narration plus the 0.25 s pad.
    assert_eq!(duration(1), 2.25);
    // 1.0 s of narration fits within the 3.0 s estimate.
    assert_eq!(duration(2), 3.0);
    assert_eq!(duration(4), 2.0);
}

#[test]
fn narration_pad_grows_the_estimate_but_not_the_entry() {
    let file = ProjectFile::from_json(JSON).unwrap();
    let project = resolve_project(file, Path::new("/proj"), &fake_image, &fake_audio);
    let timeline = crate::timeline::builder::build_timeline(&project.scenes, &project.assets);

    let first = &timeline.entries()[0];
    assert_eq!(first.scene.id, 1);
    assert_eq!(first.scene.duration_estimate, 2.25);
    assert_eq!(first.duration, 2.0);
}

#[test]
fn background_decode_failure_is_not_fatal() {
    let file = ProjectFile::from_json(JSON).unwrap();
    let no_audio =
        |_: &Path| -> ReelResult<AudioBuffer> { Err(ReelError::evaluation("no ffmpeg")) };
    let project = resolve_project(file, Path::new("/proj"), &fake_image, &no_audio);
    assert!(project.background.is_none());
    assert_eq!(project.assets.get(1).unwrap().status, AssetStatus::Error);
    assert_eq!(project.assets.get(4).unwrap().status, AssetStatus::Pending);
}

#[test]
fn load_project_resolves_paths_next_to_the_file() {
    let dir = std::env::temp_dir().join(format!("storyreel-project-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let img = image::RgbaImage::from_raw(2, 2, vec![255; 16]).unwrap();
    img.save(dir.join("a.png")).unwrap();
    std::fs::write(
        dir.join("project.json"),
        r#"{"scenes":[{"id":1,"durationEstimate":1.5,"image":"a.png"}]}"#,
    )
    .unwrap();

    let project = load_project(&dir.join("project.json")).unwrap();
    let asset = project.assets.get(1).unwrap();
    assert_eq!(asset.status, AssetStatus::Completed);
    assert_eq!(asset.drawable_image().unwrap().width, 2);
    assert_eq!(project.scenes[0].duration_estimate, 1.5);
    let _ = std::fs::remove_dir_all(&dir);
}

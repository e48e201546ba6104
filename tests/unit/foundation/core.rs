use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::new(30, 1).unwrap().as_f64(), 30.0);
}

#[test]
fn secs_to_frames_ceil_covers_whole_span() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
    assert_eq!(fps.secs_to_frames_ceil(0.8), 24);
    assert_eq!(fps.secs_to_frames_ceil(1.0), 30);
    assert_eq!(fps.secs_to_frames_ceil(1.01), 31);
    assert_eq!(fps.secs_to_frames_ceil(f64::NAN), 0);
}

#[test]
fn straight_alpha_is_premultiplied() {
    let c = Rgba8Premul::from_straight_rgba(200, 100, 0, 128);
    assert_eq!(c.a, 128);
    assert_eq!(c.r, ((200u16 * 128 + 127) / 255) as u8);
    assert_eq!(c.b, 0);
    assert_eq!(Rgba8Premul::grey(40).to_array(), [40, 40, 40, 255]);
}

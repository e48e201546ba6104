use super::*;

fn pixel(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

#[test]
fn rejects_degenerate_sizes() {
    assert!(CpuSurface::new(0, 4).is_err());
    assert!(CpuSurface::new(70_000, 4).is_err());
}

#[test]
fn clear_fills_every_pixel() {
    let mut s = CpuSurface::new(4, 2).unwrap();
    s.clear(Rgba8Premul::BLACK).unwrap();
    let f = s.snapshot().unwrap();
    assert!(f.premultiplied);
    assert_eq!(f.data.len(), 4 * 2 * 4);
    assert!(f.data.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
}

#[test]
fn opaque_image_covering_canvas_replaces_background() {
    let mut s = CpuSurface::new(8, 8).unwrap();
    s.clear(Rgba8Premul::BLACK).unwrap();
    let img = SceneImage::solid(8, 8, [255, 0, 0, 255]).unwrap();
    s.draw_image(ImageDraw {
        image: &img,
        transform: Affine::IDENTITY,
        opacity: 1.0,
        blur_radius: 0,
    })
    .unwrap();
    let f = s.snapshot().unwrap();
    assert_eq!(pixel(&f, 4, 4), [255, 0, 0, 255]);
}

#[test]
fn opacity_blends_with_what_is_below() {
    let mut s = CpuSurface::new(8, 8).unwrap();
    s.clear(Rgba8Premul::BLACK).unwrap();
    let img = SceneImage::solid(8, 8, [255, 255, 255, 255]).unwrap();
    s.draw_image(ImageDraw {
        image: &img,
        transform: Affine::IDENTITY,
        opacity: 0.5,
        blur_radius: 0,
    })
    .unwrap();
    let px = pixel(&s.snapshot().unwrap(), 4, 4);
    assert!((120..=135).contains(&px[0]), "{px:?}");
    assert_eq!(px[3], 255);
}

#[test]
fn blurred_solid_image_stays_solid_inside() {
    let mut s = CpuSurface::new(16, 16).unwrap();
    s.clear(Rgba8Premul::BLACK).unwrap();
    let img = SceneImage::solid(16, 16, [0, 200, 0, 255]).unwrap();
    s.draw_image(ImageDraw {
        image: &img,
        transform: Affine::IDENTITY,
        opacity: 1.0,
        blur_radius: 3,
    })
    .unwrap();
    assert_eq!(pixel(&s.snapshot().unwrap(), 8, 8), [0, 200, 0, 255]);
}

#[test]
fn images_are_uploaded_once_per_key() {
    let mut s = CpuSurface::new(4, 4).unwrap();
    let img = SceneImage::solid(4, 4, [1, 2, 3, 255]).unwrap();
    for _ in 0..3 {
        s.draw_image(ImageDraw {
            image: &img,
            transform: Affine::IDENTITY,
            opacity: 1.0,
            blur_radius: 0,
        })
        .unwrap();
    }
    assert_eq!(s.cached_images(), 1);
}

#[test]
fn fill_rect_covers_only_its_area() {
    let mut s = CpuSurface::new(8, 8).unwrap();
    s.clear(Rgba8Premul::BLACK).unwrap();
    s.fill_rect(Rect::new(0.0, 0.0, 8.0, 2.0), Rgba8Premul::grey(255))
        .unwrap();
    let f = s.snapshot().unwrap();
    assert_eq!(pixel(&f, 3, 0), [255, 255, 255, 255]);
    assert_eq!(pixel(&f, 3, 5), [0, 0, 0, 255]);
}

#[test]
fn vignette_darkens_corners_only() {
    let mut s = CpuSurface::new(16, 16).unwrap();
    s.clear(Rgba8Premul::grey(200)).unwrap();
    s.apply_vignette(0.6).unwrap();
    let f = s.snapshot().unwrap();
    assert!(pixel(&f, 0, 0)[0] < 200);
    assert_eq!(pixel(&f, 8, 8)[0], 200);
}

use super::*;

#[test]
fn from_rgba8_premultiplies_and_assigns_fresh_ids() {
    let a = ImageHandle::from_rgba8("a.png", 1, 1, vec![200, 100, 50, 128]).unwrap();
    let b = ImageHandle::from_rgba8("a.png", 1, 1, vec![200, 100, 50, 128]).unwrap();
    assert_eq!(a.rgba8_premul(), &[100, 50, 25, 128]);
    assert_ne!(a.id(), b.id());
    assert_eq!(a.clone().id(), a.id());
    assert_eq!(a.src(), "a.png");
}

#[test]
fn byte_len_mismatch_is_validation_error() {
    let err = ImageHandle::from_rgba8("x", 2, 2, vec![0; 4]).unwrap_err();
    assert!(matches!(err, PaintError::Validation(_)));
}

#[test]
fn decode_png_round_trips_dimensions() {
    let img = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let h = ImageHandle::decode("two.png", &buf).unwrap();
    assert_eq!((h.width(), h.height()), (2, 1));
    assert_eq!(&h.rgba8_premul()[..4], &[255, 0, 0, 255]);

    let err = ImageHandle::decode("junk", b"not an image").unwrap_err();
    assert!(err.to_string().starts_with("validation error:"));
}

#[test]
fn solid_fills_every_pixel() {
    let c = Rgba8Premul::from_straight_rgba(0, 255, 0, 255);
    let h = ImageHandle::solid("green", 3, 2, c).unwrap();
    assert_eq!(h.rgba8_premul().len(), 24);
    assert!(h.rgba8_premul().chunks_exact(4).all(|px| px == [0, 255, 0, 255]));
}

#[test]
fn grid_atlas_is_row_major_and_drops_partial_cells() {
    let sheet = ImageHandle::solid("sheet", 25, 20, Rgba8Premul::transparent()).unwrap();
    let atlas = FrameAtlas::from_grid(&sheet, 10, 10).unwrap();
    assert_eq!(atlas.len(), 4);
    assert_eq!(atlas.frame(1).unwrap().rect, FrameRect::new(10.0, 0.0, 10.0, 10.0));
    assert_eq!(atlas.frame(2).unwrap().rect, FrameRect::new(0.0, 10.0, 10.0, 10.0));
    assert!(atlas.frame(4).is_none());
    assert!(FrameAtlas::from_grid(&sheet, 0, 10).is_err());
}

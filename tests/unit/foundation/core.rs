use super::*;

#[test]
fn surface_size_resolve_keeps_missing_dimensions() {
    let current = SurfaceSize::new(320, 240);
    assert_eq!(
        SurfaceSize::resolve(Some(100), None, current),
        SurfaceSize::new(100, 240)
    );
    assert_eq!(SurfaceSize::resolve(None, None, current), current);
}

#[test]
fn surface_size_rejects_empty_and_oversized() {
    assert!(SurfaceSize::new(0, 10).to_u16().is_err());
    assert!(SurfaceSize::new(70_000, 10).to_u16().is_err());
    assert_eq!(SurfaceSize::new(64, 32).to_u16().unwrap(), (64, 32));
}

#[test]
fn straight_to_premul_scales_color_channels() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.a, 128);
    assert_eq!(c.r, 128);
    assert_eq!(c.g, 64);
    assert_eq!(c.b, 0);
}

#[test]
fn frame_bounds_where_is_max_exclusive() {
    let mut frame = FrameRGBA {
        width: 4,
        height: 4,
        data: vec![0; 4 * 4 * 4],
        premultiplied: true,
    };
    for (x, y) in [(1u32, 1u32), (2, 2)] {
        let i = ((y * 4 + x) * 4) as usize;
        frame.data[i..i + 4].copy_from_slice(&[255, 0, 0, 255]);
    }
    let b = frame.bounds_where(|px| px[3] > 0).unwrap();
    assert_eq!(b, Rect::new(1.0, 1.0, 3.0, 3.0));
    assert!(frame.bounds_where(|px| px[1] > 0).is_none());
    assert_eq!(frame.pixel(9, 0), None);
}

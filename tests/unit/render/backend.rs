use super::*;

#[test]
fn settings_defaults_and_json_overrides() {
    let d = RenderSettings::default();
    assert!(d.snap_to_pixel);
    assert!(d.tick_on_update);
    assert_eq!(d.default_size(), SurfaceSize::new(640, 480));

    let s = RenderSettings::from_json_str(r#"{"snap_to_pixel": false, "clear_rgba": [1,2,3,4]}"#)
        .unwrap();
    assert!(!s.snap_to_pixel);
    assert_eq!(s.clear_rgba, Some([1, 2, 3, 4]));
    assert_eq!(s.default_width, 640);
}

#[test]
fn invalid_json_is_serde_error() {
    let err = RenderSettings::from_json_str("{ nope").unwrap_err();
    assert!(matches!(err, PaintError::Serde(_)));
}

#[test]
fn batch_limits_clamp_into_supported_range() {
    let l = BatchLimits {
        max_quads: 0,
        max_texture_slots: 64,
    }
    .clamped();
    assert_eq!(l.max_quads, 1);
    assert_eq!(l.max_texture_slots, 16);
    assert_eq!(BatchLimits::default().clamped(), BatchLimits::default());
}

#[test]
fn quad_limit_fits_index_range_and_buffer_budget() {
    let l = BatchLimits {
        max_quads: usize::MAX,
        max_texture_slots: 16,
    }
    .clamped();
    assert_eq!(l.max_quads, MAX_QUADS_LIMIT);

    let quad_bytes = 4 * std::mem::size_of::<crate::render::gpu::batch::Vertex>();
    assert!(MAX_QUADS_LIMIT * quad_bytes <= 256 << 20);
    assert!(MAX_QUADS_LIMIT * 6 <= u32::MAX as usize);
}

#[test]
fn requested_size_prefers_args_then_current_then_default() {
    let s = RenderSettings::default();
    assert_eq!(requested_size(None, None, None, &s), SurfaceSize::new(640, 480));
    assert_eq!(
        requested_size(Some(10), None, Some(SurfaceSize::new(5, 6)), &s),
        SurfaceSize::new(10, 6)
    );
}

#[test]
fn core_surface_or_insert_creates_then_resizes() {
    let mut core: RendererCore<(), SurfaceSize> = RendererCore::new(RenderSettings::default());
    let mut created = 0;
    core.surface_or_insert(
        SurfaceSize::new(2, 2),
        |s| {
            created += 1;
            Ok(s)
        },
        |_, _| Ok(()),
    )
    .unwrap();
    let s = core
        .surface_or_insert(
            SurfaceSize::new(4, 4),
            |_| Err(PaintError::surface("must not recreate")),
            |cur, size| {
                *cur = size;
                Ok(())
            },
        )
        .unwrap();
    assert_eq!(*s, SurfaceSize::new(4, 4));
    assert_eq!(created, 1);
    assert_eq!(core.set_surface(None), Some(SurfaceSize::new(4, 4)));
    assert!(core.surface().is_none());
}

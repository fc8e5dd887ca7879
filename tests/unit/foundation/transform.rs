use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn identity_maps_points_unchanged() {
    let t = Transform2D::identity();
    assert!(t.is_identity());
    assert_eq!(t.transform_point(3.0, 4.0), Point::new(3.0, 4.0));
}

#[test]
fn append_transform_translates_scales_and_offsets_registration() {
    let mut t = Transform2D::identity();
    t.append_transform(100.0, 50.0, 2.0, 3.0, 0.0, 0.0, 0.0, 5.0, 5.0);
    // (5,5) is the registration point and lands exactly on (x,y).
    assert_eq!(t.transform_point(5.0, 5.0), Point::new(100.0, 50.0));
    assert_eq!(t.transform_point(6.0, 6.0), Point::new(102.0, 53.0));
}

#[test]
fn parent_rotation_applies_to_child_offset() {
    let mut parent = Transform2D::identity();
    parent.append_transform(0.0, 0.0, 1.0, 1.0, 90.0, 0.0, 0.0, 0.0, 0.0);

    let mut child = parent;
    child.append_transform(10.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    let p = child.transform_point(0.0, 0.0);
    assert!(approx(p.x, 0.0), "x={}", p.x);
    assert!(approx(p.y, 10.0), "y={}", p.y);
}

#[test]
fn local_transform_matches_kurbo_composition() {
    let mut t = Transform2D::identity();
    t.append_transform(7.0, -2.0, 1.5, 0.5, 30.0, 0.0, 0.0, 3.0, 4.0);
    let expected = Affine::translate((7.0, -2.0))
        * Affine::rotate(30f64.to_radians())
        * Affine::scale_non_uniform(1.5, 0.5)
        * Affine::translate((-3.0, -4.0));
    for (got, want) in t.coeffs().iter().zip(expected.as_coeffs()) {
        assert!(approx(*got, want), "{got} != {want}");
    }
}

#[test]
fn full_turn_rotation_is_skipped() {
    let mut t = Transform2D::identity();
    t.append_transform(0.0, 0.0, 1.0, 1.0, 720.0, 0.0, 0.0, 0.0, 0.0);
    assert!(t.is_identity());
}

#[test]
fn skew_x_shears_along_x() {
    let mut t = Transform2D::identity();
    t.append_transform(0.0, 0.0, 1.0, 1.0, 0.0, 45.0, 0.0, 0.0, 0.0);
    let p = t.transform_point(0.0, 10.0);
    assert!(approx(p.x, -10.0 * std::f64::consts::FRAC_1_SQRT_2));
    assert!(approx(p.y, 10.0 * std::f64::consts::FRAC_1_SQRT_2));
}

#[test]
fn compose_multiplies_alpha_and_matrix() {
    let mut parent = Transform2D::new(2.0, 0.0, 0.0, 2.0, 10.0, 0.0);
    parent.alpha = 0.5;
    let mut child = Transform2D::new(1.0, 0.0, 0.0, 1.0, 3.0, 4.0);
    child.alpha = 0.5;

    let out = parent.compose(&child);
    assert_eq!(out.transform_point(0.0, 0.0), Point::new(16.0, 8.0));
    assert!(approx(out.alpha, 0.25));
}

#[test]
fn prepend_is_left_multiplication() {
    let mut a = Transform2D::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
    a.prepend(1.0, 0.0, 0.0, 1.0, 5.0, 0.0);
    // scale first, then translate
    assert_eq!(a.transform_point(1.0, 0.0), Point::new(7.0, 0.0));

    let mut b = Transform2D::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
    b.append(1.0, 0.0, 0.0, 1.0, 5.0, 0.0);
    assert_eq!(b.transform_point(1.0, 0.0), Point::new(12.0, 0.0));
}

#[test]
fn invert_round_trips_points() {
    let mut t = Transform2D::identity();
    t.append_transform(12.0, -3.0, 2.0, 0.5, 30.0, 0.0, 0.0, 1.0, 2.0);
    let inv = t.invert().expect("invertible");
    let p = t.transform_point(7.0, 9.0);
    let back = inv.transform_point(p.x, p.y);
    assert!(approx(back.x, 7.0));
    assert!(approx(back.y, 9.0));

    assert!(Transform2D::new(0.0, 0.0, 0.0, 0.0, 1.0, 1.0).invert().is_none());
}

#[test]
fn snapping_only_applies_to_pure_translations() {
    let t = Transform2D::new(1.0, 0.0, 0.0, 1.0, 10.4, 20.5);
    let s = t.snapped(true);
    assert_eq!(s.translation(), Vec2::new(10.0, 21.0));
    assert_eq!(t.snapped(false), t);

    let scaled = Transform2D::new(2.0, 0.0, 0.0, 1.0, 10.4, 20.5);
    assert_eq!(scaled.snapped(true), scaled);
}

#[test]
fn reinitialize_copies_backend_private_state() {
    let mut parent = Transform2D::new(1.0, 0.0, 0.0, 1.0, 4.0, 4.0);
    parent.alpha = 0.3;
    parent.blend = BlendMode::Lighter;
    parent.shadow = Some(Shadow {
        color: Rgba8Premul::transparent(),
        offset_x: 1.0,
        offset_y: 2.0,
        blur: 3.0,
    });

    let mut pooled = Transform2D::new(9.0, 9.0, 9.0, 9.0, 9.0, 9.0);
    pooled.reinitialize(&parent);
    assert_eq!(pooled, parent);

    pooled.reset();
    assert!(pooled.is_identity());
    assert_eq!(pooled.blend, BlendMode::SourceOver);
}

#[test]
fn affine_interop_preserves_coefficients() {
    let t = Transform2D::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
    let back = Transform2D::from_affine(t.to_affine());
    assert_eq!(back.coeffs(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

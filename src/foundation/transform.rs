//! Accumulated 2D affine transform used by every backend.
//!
//! A [`Transform2D`] wraps a [`kurbo::Affine`] mapping local points to surface points
//! (`x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`). Besides the affine part it carries the
//! accumulated opacity and two backend-private fields (shadow and blend mode) that composition
//! copies through untouched.

use crate::foundation::core::{Affine, Point, Rgba8Premul, Vec2};
use crate::foundation::math::{deg_to_rad, snap_px};

/// Drop shadow state carried along the transform stack.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shadow {
    /// Shadow color.
    pub color: Rgba8Premul,
    /// Horizontal offset in surface pixels.
    pub offset_x: f64,
    /// Vertical offset in surface pixels.
    pub offset_y: f64,
    /// Blur radius in surface pixels.
    pub blur: f64,
}

/// Compositing operator carried along the transform stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Normal "source over" compositing.
    #[default]
    SourceOver,
    /// Additive compositing.
    Lighter,
    /// Multiply compositing.
    Multiply,
    /// Screen compositing.
    Screen,
}

/// Mutable 2D affine transform with accumulated opacity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    /// Affine part, coefficients `[a, b, c, d, tx, ty]`.
    pub affine: Affine,
    /// Accumulated opacity. Never clamped.
    pub alpha: f64,
    /// Backend-private shadow state.
    pub shadow: Option<Shadow>,
    /// Backend-private blend mode.
    pub blend: BlendMode,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    /// The identity transform with full opacity.
    pub const fn identity() -> Self {
        Self {
            affine: Affine::IDENTITY,
            alpha: 1.0,
            shadow: None,
            blend: BlendMode::SourceOver,
        }
    }

    /// Create a transform from raw coefficients with full opacity.
    pub fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self::from_affine(Affine::new([a, b, c, d, tx, ty]))
    }

    /// Build a transform from a [`kurbo::Affine`] with full opacity.
    pub fn from_affine(affine: Affine) -> Self {
        Self {
            affine,
            ..Self::identity()
        }
    }

    /// Overwrite every field with `parent`'s state.
    ///
    /// Used by pooled traversal so a recycled instance starts from the accumulated parent.
    pub fn reinitialize(&mut self, parent: &Transform2D) {
        *self = *parent;
    }

    /// Reset to identity in place.
    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    /// Right-multiply by the given coefficients (`self = self * m`).
    pub fn append(&mut self, a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> &mut Self {
        self.affine = self.affine * Affine::new([a, b, c, d, tx, ty]);
        self
    }

    /// Left-multiply by the given coefficients (`self = m * self`).
    pub fn prepend(&mut self, a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> &mut Self {
        self.affine = Affine::new([a, b, c, d, tx, ty]) * self.affine;
        self
    }

    /// Append a node's local transform.
    ///
    /// The local transform is `T(x, y) * R(rotation) * K(skew_x, skew_y) * S(scale) * T(-reg)`.
    /// Angles are in degrees. Opacity is left untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn append_transform(
        &mut self,
        x: f64,
        y: f64,
        scale_x: f64,
        scale_y: f64,
        rotation: f64,
        skew_x: f64,
        skew_y: f64,
        reg_x: f64,
        reg_y: f64,
    ) -> &mut Self {
        let mut local = Affine::translate((x, y));
        if rotation % 360.0 != 0.0 {
            local = local * Affine::rotate(deg_to_rad(rotation));
        }
        if skew_x != 0.0 || skew_y != 0.0 {
            local = local * skew(deg_to_rad(skew_x), deg_to_rad(skew_y));
        }
        local = local * Affine::scale_non_uniform(scale_x, scale_y);
        if reg_x != 0.0 || reg_y != 0.0 {
            local = local * Affine::translate((-reg_x, -reg_y));
        }
        self.affine = self.affine * local;
        self
    }

    /// Compose `self ∘ other`: the affine part is multiplied, opacities multiply, and the
    /// backend-private fields of `self` are kept.
    pub fn compose(&self, other: &Transform2D) -> Transform2D {
        Transform2D {
            affine: self.affine * other.affine,
            alpha: self.alpha * other.alpha,
            ..*self
        }
    }

    /// Map a local point into surface space.
    pub fn transform_point(&self, x: f64, y: f64) -> Point {
        self.affine * Point::new(x, y)
    }

    /// Inverse affine transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Transform2D> {
        let det = self.affine.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Transform2D {
            affine: self.affine.inverse(),
            ..*self
        })
    }

    /// `true` when the affine part is the identity.
    pub fn is_identity(&self) -> bool {
        self.affine == Affine::IDENTITY
    }

    /// `true` when there is no rotation, skew or non-unit scale.
    pub fn is_pure_translation(&self) -> bool {
        let [a, b, c, d, _, _] = self.affine.as_coeffs();
        a == 1.0 && b == 0.0 && c == 0.0 && d == 1.0
    }

    /// Translation part `(tx, ty)`.
    pub fn translation(&self) -> Vec2 {
        self.affine.translation()
    }

    /// Apply the pixel-snapping policy.
    ///
    /// With `snap` on and a pure translation, `tx`/`ty` are rounded to whole pixels. Any other
    /// transform is returned unchanged.
    pub fn snapped(&self, snap: bool) -> Transform2D {
        let mut out = *self;
        if snap && self.is_pure_translation() {
            let t = self.translation();
            out.affine = self
                .affine
                .with_translation(Vec2::new(snap_px(t.x), snap_px(t.y)));
        }
        out
    }

    /// The six affine coefficients in `[a, b, c, d, tx, ty]` order.
    pub fn coeffs(&self) -> [f64; 6] {
        self.affine.as_coeffs()
    }

    /// The affine part as a [`kurbo::Affine`].
    pub fn to_affine(&self) -> Affine {
        self.affine
    }
}

// Skew keeps unit-length axes (each axis is rotated by its own angle), unlike
// `Affine::skew`, which shears by the tangent.
fn skew(kx: f64, ky: f64) -> Affine {
    let (sin_x, cos_x) = kx.sin_cos();
    let (sin_y, cos_y) = ky.sin_cos();
    Affine::new([cos_y, sin_y, -sin_x, cos_x, 0.0, 0.0])
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/transform.rs"]
mod tests;

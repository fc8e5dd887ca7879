use crate::foundation::transform::Transform2D;
use crate::scene::image::{FrameAtlas, ImageHandle};

/// Per-node transform and opacity properties.
///
/// Angles are in degrees. Deserializing fills missing fields with the identity values.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DisplayProps {
    /// Horizontal position in the parent's space.
    pub x: f64,
    /// Vertical position in the parent's space.
    pub y: f64,
    /// Registration (pivot) point, horizontal.
    pub reg_x: f64,
    /// Registration (pivot) point, vertical.
    pub reg_y: f64,
    /// Horizontal scale.
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Horizontal skew in degrees.
    pub skew_x: f64,
    /// Vertical skew in degrees.
    pub skew_y: f64,
    /// Opacity, nominally in `[0, 1]`.
    pub alpha: f64,
}

impl Default for DisplayProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            reg_x: 0.0,
            reg_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            alpha: 1.0,
        }
    }
}

impl DisplayProps {
    /// Identity properties translated to `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Append this node's local transform to `t` and multiply its opacity in.
    pub fn append_to(&self, t: &mut Transform2D) {
        t.append_transform(
            self.x,
            self.y,
            self.scale_x,
            self.scale_y,
            self.rotation,
            self.skew_x,
            self.skew_y,
            self.reg_x,
            self.reg_y,
        );
        t.alpha *= self.alpha;
    }

    /// This node's local transform on its own.
    pub fn local_transform(&self) -> Transform2D {
        let mut t = Transform2D::identity();
        self.append_to(&mut t);
        t
    }
}

/// Arguments forwarded to [`SceneNode::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TickParams {
    /// Milliseconds elapsed since the previous tick.
    pub delta_ms: f64,
    /// When set, nodes keep their current state.
    pub paused: bool,
}

/// What a node paints, resolved once per traversal step.
#[derive(Debug)]
pub enum NodeVariant<'a, N> {
    /// A whole image.
    Bitmap(&'a ImageHandle),
    /// One frame of a sprite sheet.
    AnimatedSprite {
        /// Index into `atlas`. Out-of-range frames are skipped.
        current_frame: usize,
        /// Frame lookup table.
        atlas: &'a FrameAtlas,
    },
    /// Ordered children, painted back to front.
    Container(&'a [N]),
    /// A pre-rendered bitmap that replaces the node's subtree.
    CachedSubtree {
        /// The cached pixels.
        bitmap: &'a ImageHandle,
        /// Changes whenever the bitmap is regenerated.
        cache_id: u64,
    },
}

/// Read-only view of a scene-graph node, as consumed by renderers.
pub trait SceneNode: Sized {
    /// Invisible nodes and their subtrees are skipped.
    fn is_visible(&self) -> bool;

    /// Transform and opacity properties.
    fn props(&self) -> DisplayProps;

    /// Which rendering variant this node is.
    fn variant(&self) -> NodeVariant<'_, Self>;

    /// Advance per-frame state. The default does nothing.
    fn tick(&mut self, params: Option<&TickParams>) {
        let _ = params;
    }
}

/// Advance an explicit display-list root by one tick.
pub fn tick_display_list<N: SceneNode>(root: &mut N, params: Option<&TickParams>) {
    root.tick(params);
}

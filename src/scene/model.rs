//! Reference snapshot implementation of [`SceneNode`].
//!
//! [`DisplayNode`] is a plain tree value with builder constructors. It is enough to drive every
//! renderer and to write tests against; applications with their own scene graph implement
//! [`SceneNode`] directly instead.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::scene::image::{FrameAtlas, ImageHandle};
use crate::scene::node::{DisplayProps, NodeVariant, SceneNode, TickParams};

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

/// Animated sprite state.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    /// Frame lookup table.
    pub atlas: FrameAtlas,
    /// Frame currently shown.
    pub current_frame: usize,
    /// Whether [`SceneNode::tick`] advances the frame.
    pub playing: bool,
}

/// Content of a [`DisplayNode`].
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// A whole image.
    Bitmap(ImageHandle),
    /// One frame of a sprite sheet.
    Sprite(Sprite),
    /// Ordered children.
    Container(Vec<DisplayNode>),
}

/// A pre-rendered bitmap standing in for a node's subtree.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedBitmap {
    /// The cached pixels.
    pub bitmap: ImageHandle,
    /// Fresh for every call to [`DisplayNode::set_cache`].
    pub cache_id: u64,
}

/// Snapshot scene node.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayNode {
    /// Hidden nodes are skipped along with their children.
    pub visible: bool,
    /// Transform and opacity.
    pub props: DisplayProps,
    /// What the node paints.
    pub kind: NodeKind,
    cache: Option<CachedBitmap>,
}

impl DisplayNode {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            visible: true,
            props: DisplayProps::default(),
            kind,
            cache: None,
        }
    }

    /// A bitmap leaf.
    pub fn bitmap(image: ImageHandle) -> Self {
        Self::with_kind(NodeKind::Bitmap(image))
    }

    /// A stopped sprite showing frame 0.
    pub fn sprite(atlas: FrameAtlas) -> Self {
        Self::with_kind(NodeKind::Sprite(Sprite {
            atlas,
            current_frame: 0,
            playing: false,
        }))
    }

    /// A container with the given children.
    pub fn container(children: Vec<DisplayNode>) -> Self {
        Self::with_kind(NodeKind::Container(children))
    }

    /// Move to `(x, y)`.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.props.x = x;
        self.props.y = y;
        self
    }

    /// Replace every display property.
    pub fn with_props(mut self, props: DisplayProps) -> Self {
        self.props = props;
        self
    }

    /// Set opacity.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.props.alpha = alpha;
        self
    }

    /// Set scale.
    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.props.scale_x = scale_x;
        self.props.scale_y = scale_y;
        self
    }

    /// Set rotation in degrees.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.props.rotation = degrees;
        self
    }

    /// Set skew in degrees.
    pub fn with_skew(mut self, skew_x: f64, skew_y: f64) -> Self {
        self.props.skew_x = skew_x;
        self.props.skew_y = skew_y;
        self
    }

    /// Set the registration point.
    pub fn with_reg(mut self, reg_x: f64, reg_y: f64) -> Self {
        self.props.reg_x = reg_x;
        self.props.reg_y = reg_y;
        self
    }

    /// Hide the node.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Start or stop sprite playback. No effect on other kinds.
    pub fn playing(mut self, playing: bool) -> Self {
        if let NodeKind::Sprite(s) = &mut self.kind {
            s.playing = playing;
        }
        self
    }

    /// Jump a sprite to `frame`. No effect on other kinds.
    pub fn goto_frame(&mut self, frame: usize) {
        if let NodeKind::Sprite(s) = &mut self.kind {
            s.current_frame = frame;
        }
    }

    /// Children of a container, empty for leaves.
    pub fn children(&self) -> &[DisplayNode] {
        match &self.kind {
            NodeKind::Container(c) => c.as_slice(),
            _ => &[],
        }
    }

    /// Mutable children of a container, or `None` for leaves.
    pub fn children_mut(&mut self) -> Option<&mut Vec<DisplayNode>> {
        match &mut self.kind {
            NodeKind::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Append a child. Leaves ignore the call and return `false`.
    pub fn push_child(&mut self, child: DisplayNode) -> bool {
        match self.children_mut() {
            Some(c) => {
                c.push(child);
                true
            }
            None => false,
        }
    }

    /// Install a cached bitmap for this subtree and return its fresh cache id.
    pub fn set_cache(&mut self, bitmap: ImageHandle) -> u64 {
        let cache_id = NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed);
        self.cache = Some(CachedBitmap { bitmap, cache_id });
        cache_id
    }

    /// Drop the cached bitmap; the subtree renders normally again.
    pub fn uncache(&mut self) {
        self.cache = None;
    }

    /// Current cached bitmap, if any.
    pub fn cache(&self) -> Option<&CachedBitmap> {
        self.cache.as_ref()
    }
}

impl SceneNode for DisplayNode {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn props(&self) -> DisplayProps {
        self.props
    }

    fn variant(&self) -> NodeVariant<'_, Self> {
        if let Some(c) = &self.cache {
            return NodeVariant::CachedSubtree {
                bitmap: &c.bitmap,
                cache_id: c.cache_id,
            };
        }
        match &self.kind {
            NodeKind::Bitmap(image) => NodeVariant::Bitmap(image),
            NodeKind::Sprite(s) => NodeVariant::AnimatedSprite {
                current_frame: s.current_frame,
                atlas: &s.atlas,
            },
            NodeKind::Container(children) => NodeVariant::Container(children.as_slice()),
        }
    }

    fn tick(&mut self, params: Option<&TickParams>) {
        if params.is_some_and(|p| p.paused) {
            return;
        }
        match &mut self.kind {
            NodeKind::Sprite(s) if s.playing && !s.atlas.is_empty() => {
                s.current_frame = (s.current_frame + 1) % s.atlas.len();
            }
            NodeKind::Container(children) => {
                for child in children {
                    child.tick(params);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;

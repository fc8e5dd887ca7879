//! Shared depth-first traversal of a display list.
//!
//! Every backend walks the tree with [`traverse`] and receives one [`Leaf`] per painted node,
//! together with the accumulated world transform. Containers never paint.

use crate::foundation::error::PaintResult;
use crate::foundation::transform::Transform2D;
use crate::scene::image::{Frame, FrameRect, ImageHandle};
use crate::scene::node::{NodeVariant, SceneNode};

/// A paintable node resolved from its [`NodeVariant`].
#[derive(Clone, Copy, Debug)]
pub enum Leaf<'a> {
    /// A whole image.
    Bitmap(&'a ImageHandle),
    /// A sprite-sheet frame.
    Frame(&'a Frame),
    /// A cached subtree bitmap.
    Cached {
        /// The cached pixels.
        bitmap: &'a ImageHandle,
        /// Identity of this generation of the cache.
        cache_id: u64,
    },
}

impl<'a> Leaf<'a> {
    /// Image the leaf samples from.
    pub fn image(&self) -> &'a ImageHandle {
        match *self {
            Leaf::Bitmap(image) => image,
            Leaf::Frame(frame) => &frame.image,
            Leaf::Cached { bitmap, .. } => bitmap,
        }
    }

    /// Region of [`Leaf::image`] that is painted.
    pub fn source_rect(&self) -> FrameRect {
        match *self {
            Leaf::Frame(frame) => frame.rect,
            _ => {
                let image = self.image();
                FrameRect::new(
                    0.0,
                    0.0,
                    f64::from(image.width()),
                    f64::from(image.height()),
                )
            }
        }
    }
}

/// Receives leaves from [`traverse`] in paint order.
pub trait LeafSink {
    /// Paint one leaf with its accumulated transform (opacity included, snapping not applied).
    fn paint_leaf(&mut self, leaf: Leaf<'_>, world: &Transform2D) -> PaintResult<()>;
}

/// Snapshot of [`TransformPool`] counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransformPoolStats {
    /// Transforms ever allocated by the pool.
    pub allocated: usize,
    /// Transforms currently on the free list.
    pub available: usize,
}

/// Free list of boxed transforms reused across recursion frames and across frames.
#[derive(Debug, Default)]
pub struct TransformPool {
    free: Vec<Box<Transform2D>>,
    allocated: usize,
}

impl TransformPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a transform initialized to `parent`'s state.
    pub fn checkout(&mut self, parent: &Transform2D) -> Box<Transform2D> {
        match self.free.pop() {
            Some(mut t) => {
                t.reinitialize(parent);
                t
            }
            None => {
                self.allocated += 1;
                Box::new(*parent)
            }
        }
    }

    /// Return a transform to the free list.
    pub fn restore(&mut self, t: Box<Transform2D>) {
        self.free.push(t);
    }

    /// Current counters.
    pub fn stats(&self) -> TransformPoolStats {
        TransformPoolStats {
            allocated: self.allocated,
            available: self.free.len(),
        }
    }
}

/// Walk `node` depth first, composing transforms and handing each visible leaf to `sink`.
pub fn traverse<N: SceneNode, S: LeafSink + ?Sized>(
    node: &N,
    parent: &Transform2D,
    pool: &mut TransformPool,
    sink: &mut S,
) -> PaintResult<()> {
    if !node.is_visible() {
        return Ok(());
    }
    let mut world = pool.checkout(parent);
    node.props().append_to(&mut world);

    let out = match node.variant() {
        NodeVariant::Bitmap(image) => sink.paint_leaf(Leaf::Bitmap(image), &world),
        NodeVariant::CachedSubtree { bitmap, cache_id } => {
            sink.paint_leaf(Leaf::Cached { bitmap, cache_id }, &world)
        }
        NodeVariant::AnimatedSprite {
            current_frame,
            atlas,
        } => match atlas.frame(current_frame) {
            Some(frame) => sink.paint_leaf(Leaf::Frame(frame), &world),
            None => {
                tracing::trace!(current_frame, frames = atlas.len(), "sprite frame missing");
                Ok(())
            }
        },
        NodeVariant::Container(children) => children
            .iter()
            .try_for_each(|child| traverse(child, &world, pool, sink)),
    };

    pool.restore(world);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/traverse.rs"]
mod tests;

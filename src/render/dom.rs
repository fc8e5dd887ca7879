//! DOM-like markup backend.
//!
//! The surface is a relatively positioned `div`; every painted leaf becomes one absolutely
//! positioned child with an increasing `z-index` and a CSS `matrix(...)` transform.

use std::fmt::Write as _;

use crate::foundation::core::SurfaceSize;
use crate::foundation::error::PaintResult;
use crate::foundation::math::round_to_digits;
use crate::foundation::transform::Transform2D;
use crate::render::backend::{RenderSettings, Renderer, RendererCore, requested_size};
use crate::render::markup::{
    ElementTree, MarkupSink, MarkupString, MarkupSurface, MarkupTarget, fmt_num, matrix_args,
};
use crate::render::traverse::{Leaf, LeafSink, TransformPool, TransformPoolStats, traverse};
use crate::scene::node::SceneNode;

/// DOM-like renderer writing into a markup target `T`.
pub struct DomRenderer<N, T = ElementTree> {
    core: RendererCore<N, MarkupSurface<T>>,
    pool: TransformPool,
}

/// DOM-like renderer producing a serialized string.
pub type DomStringRenderer<N> = DomRenderer<N, MarkupString>;

impl<N: SceneNode, T: MarkupTarget> DomRenderer<N, T> {
    /// Renderer with no surface yet.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            core: RendererCore::new(settings),
            pool: TransformPool::new(),
        }
    }

    /// Transform pool counters.
    pub fn transform_pool_stats(&self) -> TransformPoolStats {
        self.pool.stats()
    }

    fn emit(&mut self, root: Option<&N>) -> PaintResult<()> {
        let snap = self.core.settings().snap_to_pixel;
        let Some(surface) = self.core.surface_mut() else {
            return Ok(());
        };
        let size = surface.size();
        let mut sink = surface.content_mut().begin();
        open_surface(&mut sink, size);
        let out = match root {
            Some(root) => {
                let mut leaves = DomSink {
                    sink: &mut sink,
                    z_index: 0,
                    snap,
                };
                traverse(root, &Transform2D::identity(), &mut self.pool, &mut leaves)
            }
            None => Ok(()),
        };
        sink.finish();
        out
    }
}

fn open_surface(sink: &mut impl MarkupSink, size: SurfaceSize) {
    sink.open("div");
    sink.attr(
        "style",
        &format!(
            "position:relative;overflow:hidden;width:{}px;height:{}px",
            size.width, size.height
        ),
    );
}

impl<N: SceneNode, T: MarkupTarget> Renderer<N> for DomRenderer<N, T> {
    type Surface = MarkupSurface<T>;

    fn core(&self) -> &RendererCore<N, MarkupSurface<T>> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut RendererCore<N, MarkupSurface<T>> {
        &mut self.core
    }

    fn get_surface(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
    ) -> PaintResult<&mut MarkupSurface<T>> {
        let current = self.core.surface().map(MarkupSurface::size);
        let size = requested_size(width, height, current, self.core.settings());
        self.core.surface_or_insert(
            size,
            |size| Ok(MarkupSurface::new(size)),
            |s, size| {
                s.set_size(size);
                Ok(())
            },
        )
    }

    fn clear(&mut self) -> PaintResult<()> {
        self.emit(None)
    }

    #[tracing::instrument(skip_all)]
    fn render_root(&mut self, root: &N) -> PaintResult<()> {
        self.emit(Some(root))
    }
}

struct DomSink<'a, S> {
    sink: &'a mut S,
    z_index: u32,
    snap: bool,
}

impl<S: MarkupSink> LeafSink for DomSink<'_, S> {
    fn paint_leaf(&mut self, leaf: Leaf<'_>, world: &Transform2D) -> PaintResult<()> {
        let t = world.snapped(self.snap);
        self.z_index += 1;

        let mut style = format!(
            "position:absolute;left:0;top:0;z-index:{};transform-origin:0 0;transform:matrix({})",
            self.z_index,
            matrix_args(&t)
        );
        if t.alpha != 1.0 {
            let _ = write!(style, ";opacity:{}", fmt_num(round_to_digits(t.alpha, 5)));
        }

        let image = leaf.image();
        match leaf {
            Leaf::Frame(frame) => {
                let r = frame.rect;
                let _ = write!(
                    style,
                    ";width:{}px;height:{}px;background-image:url('{}');background-position:{}px {}px",
                    fmt_num(r.width),
                    fmt_num(r.height),
                    image.src(),
                    fmt_num(-r.x),
                    fmt_num(-r.y)
                );
                self.sink.open("div");
                self.sink.attr("style", &style);
            }
            Leaf::Bitmap(_) | Leaf::Cached { .. } => {
                self.sink.open("img");
                self.sink.attr("src", image.src());
                self.sink.attr("width", &image.width().to_string());
                self.sink.attr("height", &image.height().to_string());
                self.sink.attr("style", &style);
            }
        }
        self.sink.close();
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/dom.rs"]
mod tests;

//! SVG-like markup backend.
//!
//! Bitmaps become `image` elements. Sprite frames become an `image` of the whole sheet, shifted by
//! the frame origin inside a `g` clipped to the frame size. Clip paths are shared per frame size
//! and emitted in a trailing `defs` block.

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

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// SVG-like renderer writing into a markup target `T`.
pub struct SvgRenderer<N, T = ElementTree> {
    core: RendererCore<N, MarkupSurface<T>>,
    pool: TransformPool,
}

/// SVG-like renderer producing a serialized string.
pub type SvgStringRenderer<N> = SvgRenderer<N, MarkupString>;

impl<N: SceneNode, T: MarkupTarget> SvgRenderer<N, T> {
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

        let mut clips = Vec::new();
        let out = match root {
            Some(root) => {
                let mut leaves = SvgSink {
                    sink: &mut sink,
                    clips: &mut clips,
                    snap,
                };
                traverse(root, &Transform2D::identity(), &mut self.pool, &mut leaves)
            }
            None => Ok(()),
        };
        write_clip_defs(&mut sink, &clips);
        sink.finish();
        out
    }
}

fn open_surface(sink: &mut impl MarkupSink, size: SurfaceSize) {
    sink.open("svg");
    sink.attr("xmlns", SVG_NS);
    sink.attr("xmlns:xlink", XLINK_NS);
    sink.attr("version", "1.1");
    sink.attr("width", &size.width.to_string());
    sink.attr("height", &size.height.to_string());
}

fn write_clip_defs(sink: &mut impl MarkupSink, clips: &[(f64, f64)]) {
    if clips.is_empty() {
        return;
    }
    sink.open("defs");
    for (i, &(w, h)) in clips.iter().enumerate() {
        sink.open("clipPath");
        sink.attr("id", &clip_id(i));
        sink.open("rect");
        sink.attr("width", &fmt_num(w));
        sink.attr("height", &fmt_num(h));
        sink.close();
        sink.close();
    }
    sink.close();
}

fn clip_id(i: usize) -> String {
    format!("clip_{i}")
}

impl<N: SceneNode, T: MarkupTarget> Renderer<N> for SvgRenderer<N, T> {
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

struct SvgSink<'a, S> {
    sink: &'a mut S,
    clips: &'a mut Vec<(f64, f64)>,
    snap: bool,
}

impl<S: MarkupSink> SvgSink<'_, S> {
    fn clip_for(&mut self, w: f64, h: f64) -> usize {
        match self.clips.iter().position(|&(cw, ch)| cw == w && ch == h) {
            Some(i) => i,
            None => {
                self.clips.push((w, h));
                self.clips.len() - 1
            }
        }
    }

    fn opacity(&mut self, t: &Transform2D) {
        if t.alpha != 1.0 {
            self.sink
                .attr("opacity", &fmt_num(round_to_digits(t.alpha, 5)));
        }
    }
}

impl<S: MarkupSink> LeafSink for SvgSink<'_, S> {
    fn paint_leaf(&mut self, leaf: Leaf<'_>, world: &Transform2D) -> PaintResult<()> {
        let t = world.snapped(self.snap);
        let image = leaf.image();
        let width = image.width().to_string();
        let height = image.height().to_string();

        match leaf {
            Leaf::Frame(frame) => {
                let r = frame.rect;
                let clip = self.clip_for(r.width, r.height);
                self.sink.open("g");
                if t.is_pure_translation() {
                    let offset = t.translation();
                    self.sink.attr(
                        "transform",
                        &format!(
                            "translate({},{})",
                            fmt_num(round_to_digits(offset.x, 5)),
                            fmt_num(round_to_digits(offset.y, 5))
                        ),
                    );
                } else {
                    self.sink
                        .attr("transform", &format!("matrix({})", matrix_args(&t)));
                }
                self.sink
                    .attr("clip-path", &format!("url(#{})", clip_id(clip)));
                self.opacity(&t);
                self.sink.open("image");
                self.sink.attr("xlink:href", image.src());
                self.sink.attr("x", &fmt_num(-r.x));
                self.sink.attr("y", &fmt_num(-r.y));
                self.sink.attr("width", &width);
                self.sink.attr("height", &height);
                self.sink.close();
                self.sink.close();
            }
            Leaf::Bitmap(_) | Leaf::Cached { .. } => {
                self.sink.open("image");
                self.sink.attr("xlink:href", image.src());
                if t.is_pure_translation() {
                    let offset = t.translation();
                    self.sink.attr("x", &fmt_num(round_to_digits(offset.x, 5)));
                    self.sink.attr("y", &fmt_num(round_to_digits(offset.y, 5)));
                } else {
                    self.sink
                        .attr("transform", &format!("matrix({})", matrix_args(&t)));
                }
                self.sink.attr("width", &width);
                self.sink.attr("height", &height);
                self.opacity(&t);
                self.sink.close();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/svg.rs"]
mod tests;

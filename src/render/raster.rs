//! Immediate-mode raster backend over `vello_cpu`.
//!
//! Draw commands accumulate in a `vello_cpu::RenderContext` from one [`Renderer::clear`] to the
//! next; every render resolves the accumulated commands into the surface pixmap.

use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::{FrameRGBA, SurfaceSize};
use crate::foundation::error::{PaintError, PaintResult};
use crate::foundation::transform::Transform2D;
use crate::render::backend::{RenderSettings, Renderer, RendererCore, requested_size};
use crate::render::traverse::{Leaf, LeafSink, TransformPool, TransformPoolStats, traverse};
use crate::scene::image::{ImageHandle, ImageId};
use crate::scene::node::SceneNode;

/// Premultiplied RGBA8 pixel surface.
pub struct RasterSurface {
    size: SurfaceSize,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl RasterSurface {
    /// Transparent surface of `size`.
    pub fn new(size: SurfaceSize) -> PaintResult<Self> {
        let (w, h) = size.to_u16()?;
        Ok(Self {
            size,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    /// Surface dimensions.
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) -> PaintResult<()> {
        if size == self.size {
            return Ok(());
        }
        let (w, h) = size.to_u16()?;
        self.ctx = vello_cpu::RenderContext::new(w, h);
        self.pixmap = vello_cpu::Pixmap::new(w, h);
        self.size = size;
        tracing::debug!(width = size.width, height = size.height, "raster surface resized");
        Ok(())
    }

    fn present(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
    }

    /// Copy the current pixels out as a premultiplied frame.
    pub fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.size.width,
            height: self.size.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

/// Immediate raster renderer.
pub struct RasterRenderer<N> {
    core: RendererCore<N, RasterSurface>,
    pool: TransformPool,
    images: HashMap<ImageId, vello_cpu::Image>,
}

impl<N: SceneNode> RasterRenderer<N> {
    /// Renderer with no surface yet.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            core: RendererCore::new(settings),
            pool: TransformPool::new(),
            images: HashMap::new(),
        }
    }

    /// Transform pool counters.
    pub fn transform_pool_stats(&self) -> TransformPoolStats {
        self.pool.stats()
    }

    /// Current pixels, or `None` without a surface.
    pub fn to_frame(&self) -> Option<FrameRGBA> {
        self.core.surface().map(RasterSurface::to_frame)
    }
}

impl<N: SceneNode> Renderer<N> for RasterRenderer<N> {
    type Surface = RasterSurface;

    fn core(&self) -> &RendererCore<N, RasterSurface> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut RendererCore<N, RasterSurface> {
        &mut self.core
    }

    fn get_surface(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
    ) -> PaintResult<&mut RasterSurface> {
        let current = self.core.surface().map(RasterSurface::size);
        let size = requested_size(width, height, current, self.core.settings());
        self.core.surface_or_insert(
            size,
            |size| {
                tracing::debug!(width = size.width, height = size.height, "raster surface created");
                RasterSurface::new(size)
            },
            RasterSurface::resize,
        )
    }

    fn clear(&mut self) -> PaintResult<()> {
        let clear = self.core.settings().clear_rgba;
        let Some(surface) = self.core.surface_mut() else {
            return Ok(());
        };
        surface.ctx.reset();
        if let Some([r, g, b, a]) = clear {
            let ctx = &mut surface.ctx;
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(surface.size.width),
                f64::from(surface.size.height),
            ));
        }
        surface.present();
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    fn render_root(&mut self, root: &N) -> PaintResult<()> {
        let snap = self.core.settings().snap_to_pixel;
        let Some(surface) = self.core.surface_mut() else {
            return Ok(());
        };
        let mut sink = RasterSink {
            ctx: &mut surface.ctx,
            images: &mut self.images,
            snap,
        };
        traverse(root, &Transform2D::identity(), &mut self.pool, &mut sink)?;
        surface.present();
        Ok(())
    }
}

struct RasterSink<'a> {
    ctx: &'a mut vello_cpu::RenderContext,
    images: &'a mut HashMap<ImageId, vello_cpu::Image>,
    snap: bool,
}

impl LeafSink for RasterSink<'_> {
    fn paint_leaf(&mut self, leaf: Leaf<'_>, world: &Transform2D) -> PaintResult<()> {
        let image = leaf.image();
        let rect = leaf.source_rect();
        if image.width() == 0 || image.height() == 0 || rect.width <= 0.0 || rect.height <= 0.0 {
            return Ok(());
        }
        let t = world.snapped(self.snap);
        let paint = image_paint(self.images, image)?;
        let opacity = t.alpha.clamp(0.0, 1.0) as f32;

        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::new(t.coeffs()));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::translate((-rect.x, -rect.y)));
        self.ctx.set_paint(paint);
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            rect.width,
            rect.height,
        ));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
        Ok(())
    }
}

fn image_paint(
    cache: &mut HashMap<ImageId, vello_cpu::Image>,
    image: &ImageHandle,
) -> PaintResult<vello_cpu::Image> {
    if let Some(p) = cache.get(&image.id()) {
        return Ok(p.clone());
    }
    let pixmap = pixmap_from_premul_bytes(image.rgba8_premul(), image.width(), image.height())?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };
    cache.insert(image.id(), paint.clone());
    Ok(paint)
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> PaintResult<vello_cpu::Pixmap> {
    let size = SurfaceSize::new(width, height);
    let (w, h) = size.to_u16()?;
    if bytes.len() != size.pixel_count().saturating_mul(4) {
        return Err(PaintError::validation("pixmap byte len mismatch"));
    }
    // Bytes are already premultiplied, which is what the pixmap stores.
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;

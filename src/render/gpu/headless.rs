//! In-memory [`GpuDevice`] that records every call and rasterizes batches on the CPU.
//!
//! Quads are filled with nearest-neighbour sampling and premultiplied source-over blending, which
//! is enough to compare coverage against the other backends.

use std::collections::BTreeMap;

use crate::foundation::core::{FrameRGBA, Point, Rect, Rgba8Premul, SurfaceSize};
use crate::foundation::error::{PaintError, PaintResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::backend::BatchLimits;
use crate::render::gpu::batch::{VERTICES_PER_QUAD, Vertex};
use crate::render::gpu::device::{DrawBatch, GpuDevice, TextureId};

/// A recorded draw call.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    /// Vertices as submitted.
    pub vertices: Vec<Vertex>,
    /// Textures bound to slots `0..textures.len()`.
    pub textures: Vec<TextureId>,
    /// Submitted index count.
    pub index_count: u32,
}

impl DrawCall {
    /// Quads in this draw.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_QUAD
    }

    /// Axis-aligned bounds of quad `i`, or `None` when out of range.
    pub fn quad_bounds(&self, i: usize) -> Option<Rect> {
        let quad = self.quad(i)?;
        let mut r = Rect::from_points(pos(&quad[0]), pos(&quad[2]));
        r = r.union_pt(pos(&quad[1])).union_pt(pos(&quad[3]));
        Some(r)
    }

    /// Texture bound to the slot quad `i` samples from.
    pub fn quad_texture(&self, i: usize) -> Option<TextureId> {
        let quad = self.quad(i)?;
        self.textures.get(quad[0].texcoord[2] as usize).copied()
    }

    fn quad(&self, i: usize) -> Option<&[Vertex]> {
        let start = i.checked_mul(VERTICES_PER_QUAD)?;
        self.vertices.get(start..start + VERTICES_PER_QUAD)
    }
}

fn pos(v: &Vertex) -> Point {
    Point::new(f64::from(v.position[0]), f64::from(v.position[1]))
}

#[derive(Debug)]
struct HeadlessTexture {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Recording device with a CPU render target.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    fail_init: Option<String>,
    init_calls: usize,
    max_quads: usize,
    size: SurfaceSize,
    target: Vec<u8>,
    next_id: u64,
    textures: BTreeMap<TextureId, HeadlessTexture>,
    uploads: Vec<TextureId>,
    released: Vec<TextureId>,
    draws: Vec<DrawCall>,
}

impl HeadlessDevice {
    /// A device that initializes successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// A device whose initialization fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_init: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Times [`GpuDevice::initialize`] was called.
    pub fn init_calls(&self) -> usize {
        self.init_calls
    }

    /// Current target size.
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Every draw call since creation or the last [`HeadlessDevice::take_draws`].
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Drain recorded draw calls.
    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }

    /// Every texture ever uploaded, in upload order.
    pub fn uploads(&self) -> &[TextureId] {
        &self.uploads
    }

    /// Every texture released, in release order.
    pub fn released(&self) -> &[TextureId] {
        &self.released
    }

    /// Textures currently resident.
    pub fn live_textures(&self) -> Vec<TextureId> {
        self.textures.keys().copied().collect()
    }

    fn blend_quad(&mut self, quad: &[Vertex], textures: &[TextureId]) {
        let Some(tex) = textures
            .get(quad[0].texcoord[2] as usize)
            .and_then(|id| self.textures.get(id))
        else {
            return;
        };
        let p0 = pos(&quad[0]);
        let eu = pos(&quad[3]) - p0;
        let ev = pos(&quad[1]) - p0;
        let det = eu.x * ev.y - eu.y * ev.x;
        if det == 0.0 || !det.is_finite() {
            return;
        }

        let (w, h) = (self.size.width as i64, self.size.height as i64);
        let bounds = quad
            .iter()
            .fold(Rect::from_points(p0, p0), |r, v| r.union_pt(pos(v)));
        let x0 = (bounds.x0.floor() as i64).clamp(0, w);
        let x1 = (bounds.x1.ceil() as i64).clamp(0, w);
        let y0 = (bounds.y0.floor() as i64).clamp(0, h);
        let y1 = (bounds.y1.ceil() as i64).clamp(0, h);

        let uv0 = (f64::from(quad[0].texcoord[0]), f64::from(quad[0].texcoord[1]));
        let du = (
            f64::from(quad[3].texcoord[0]) - uv0.0,
            f64::from(quad[3].texcoord[1]) - uv0.1,
        );
        let dv = (
            f64::from(quad[1].texcoord[0]) - uv0.0,
            f64::from(quad[1].texcoord[1]) - uv0.1,
        );
        let alpha = u16::from((quad[0].alpha.clamp(0.0, 1.0) * 255.0).round() as u8);

        for y in y0..y1 {
            for x in x0..x1 {
                let d = Point::new(x as f64 + 0.5, y as f64 + 0.5) - p0;
                let s = (d.x * ev.y - d.y * ev.x) / det;
                let t = (eu.x * d.y - eu.y * d.x) / det;
                if !(0.0..1.0).contains(&s) || !(0.0..1.0).contains(&t) {
                    continue;
                }
                let u = uv0.0 + s * du.0 + t * dv.0;
                let v = uv0.1 + s * du.1 + t * dv.1;
                let tx = ((u * f64::from(tex.width)).floor() as i64).clamp(0, i64::from(tex.width) - 1);
                let ty = ((v * f64::from(tex.height)).floor() as i64).clamp(0, i64::from(tex.height) - 1);
                let si = ((ty as usize) * (tex.width as usize) + tx as usize) * 4;
                let di = ((y as usize) * (self.size.width as usize) + x as usize) * 4;
                let (Some(src), Some(dst)) = (tex.data.get(si..si + 4), self.target.get_mut(di..di + 4))
                else {
                    continue;
                };
                let sa = mul_div255_u8(u16::from(src[3]), alpha);
                let inv = 255 - u16::from(sa);
                for c in 0..4 {
                    let s = mul_div255_u8(u16::from(src[c]), alpha);
                    dst[c] = s.saturating_add(mul_div255_u8(u16::from(dst[c]), inv));
                }
            }
        }
    }
}

impl GpuDevice for HeadlessDevice {
    fn initialize(&mut self, limits: &BatchLimits) -> PaintResult<()> {
        self.init_calls += 1;
        if let Some(reason) = &self.fail_init {
            return Err(PaintError::init(reason.clone()));
        }
        self.max_quads = limits.max_quads;
        Ok(())
    }

    fn resize(&mut self, size: SurfaceSize) -> PaintResult<()> {
        self.size = size;
        self.target = vec![0; size.pixel_count().saturating_mul(4)];
        Ok(())
    }

    fn clear(&mut self, rgba: Option<[u8; 4]>) -> PaintResult<()> {
        let px = rgba
            .map(|[r, g, b, a]| Rgba8Premul::from_straight_rgba(r, g, b, a).to_array())
            .unwrap_or([0; 4]);
        for dst in self.target.chunks_exact_mut(4) {
            dst.copy_from_slice(&px);
        }
        Ok(())
    }

    fn upload_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba8_premul: &[u8],
    ) -> PaintResult<TextureId> {
        if width == 0 || height == 0 {
            return Err(PaintError::validation("texture must be non-empty"));
        }
        if rgba8_premul.len() != SurfaceSize::new(width, height).pixel_count().saturating_mul(4) {
            return Err(PaintError::validation("texture byte len mismatch"));
        }
        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(
            id,
            HeadlessTexture {
                width,
                height,
                data: rgba8_premul.to_vec(),
            },
        );
        self.uploads.push(id);
        Ok(id)
    }

    fn release_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_some() {
            self.released.push(id);
        }
    }

    fn draw(&mut self, batch: &DrawBatch<'_>) -> PaintResult<()> {
        if batch.vertices.len() > self.max_quads.saturating_mul(VERTICES_PER_QUAD) {
            return Err(PaintError::surface("draw exceeds vertex buffer capacity"));
        }
        for quad in batch.vertices.chunks_exact(VERTICES_PER_QUAD) {
            self.blend_quad(quad, batch.textures);
        }
        self.draws.push(DrawCall {
            vertices: batch.vertices.to_vec(),
            textures: batch.textures.to_vec(),
            index_count: batch.index_count,
        });
        Ok(())
    }

    fn read_pixels(&mut self) -> PaintResult<FrameRGBA> {
        Ok(FrameRGBA {
            width: self.size.width,
            height: self.size.height,
            data: self.target.clone(),
            premultiplied: true,
        })
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/render/gpu/headless.rs"]
mod tests;

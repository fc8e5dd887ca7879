//! Vertex layout and the fixed-capacity quad batch.

use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{PaintError, PaintResult};

/// Vertices emitted per quad.
pub const VERTICES_PER_QUAD: usize = 4;
/// Indices drawn per quad (two triangles).
pub const INDICES_PER_QUAD: usize = 6;
/// `f32` components per vertex.
pub const FLOATS_PER_VERTEX: usize = 7;

/// One batched vertex.
///
/// `texcoord.z` carries the texture slot index as a float.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Surface-space position in pixels; `z` is always 0.
    pub position: [f32; 3],
    /// Normalized texture coordinate plus slot index.
    pub texcoord: [f32; 3],
    /// Accumulated opacity.
    pub alpha: f32,
}

const _: () = assert!(std::mem::size_of::<Vertex>() == FLOATS_PER_VERTEX * 4);

/// Static index list for `max_quads` quads: `[j, j+1, j+2, j, j+2, j+3]` per quad.
pub fn quad_indices(max_quads: usize) -> Vec<u32> {
    let mut out = Vec::with_capacity(max_quads.saturating_mul(INDICES_PER_QUAD));
    for q in 0..max_quads {
        let j = (q * VERTICES_PER_QUAD) as u32;
        out.extend_from_slice(&[j, j + 1, j + 2, j, j + 2, j + 3]);
    }
    out
}

/// Unit-square corners in emission order.
pub(crate) const UNIT_CORNERS: [(f64, f64); 4] = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];

/// Dense vertex buffer that never grows past its initial capacity.
#[derive(Debug, Default)]
pub struct VertexBatch {
    vertices: Vec<Vertex>,
    max_quads: usize,
}

impl VertexBatch {
    /// Batch holding at most `max_quads` quads, allocated up front.
    pub fn new(max_quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(max_quads.saturating_mul(VERTICES_PER_QUAD)),
            max_quads,
        }
    }

    /// Whether one more quad fits.
    pub fn has_room(&self) -> bool {
        self.quad_count() < self.max_quads
    }

    /// Append one quad. Fails (and writes nothing) when the batch is full; callers flush on
    /// [`VertexBatch::has_room`] first.
    ///
    /// `corners` follow the unit-square order `(0,0), (0,1), (1,1), (1,0)`; `uv` is the source
    /// rectangle in normalized texture space.
    pub fn push_quad(
        &mut self,
        corners: [Point; 4],
        uv: Rect,
        slot: u32,
        alpha: f32,
    ) -> PaintResult<()> {
        if !self.has_room() {
            return Err(PaintError::validation(format!(
                "vertex batch full at {} quads",
                self.max_quads
            )));
        }
        let uvs = [
            (uv.x0, uv.y0),
            (uv.x0, uv.y1),
            (uv.x1, uv.y1),
            (uv.x1, uv.y0),
        ];
        for (p, (u, v)) in corners.iter().zip(uvs) {
            self.vertices.push(Vertex {
                position: [p.x as f32, p.y as f32, 0.0],
                texcoord: [u as f32, v as f32, slot as f32],
                alpha,
            });
        }
        Ok(())
    }

    /// Written vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Written quads.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_QUAD
    }

    /// Quad capacity.
    pub fn max_quads(&self) -> usize {
        self.max_quads
    }

    /// `true` when nothing has been written since the last reset.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Forget written vertices; capacity is kept.
    pub fn reset(&mut self) {
        self.vertices.clear();
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/render/gpu/batch.rs"]
mod tests;

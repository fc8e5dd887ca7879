use crate::foundation::core::{FrameRGBA, SurfaceSize};
use crate::foundation::error::PaintResult;
use crate::render::backend::BatchLimits;
use crate::render::gpu::batch::Vertex;

/// Handle to a texture resident on a [`GpuDevice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// One flushed batch.
#[derive(Clone, Copy, Debug)]
pub struct DrawBatch<'a> {
    /// Written vertices, four per quad.
    pub vertices: &'a [Vertex],
    /// Textures bound to slots `0..textures.len()`.
    pub textures: &'a [TextureId],
    /// Indices to draw from the static quad index buffer.
    pub index_count: u32,
}

/// Device operations the batched renderer needs.
///
/// Calls arrive in a fixed order: `initialize` once, then `resize` whenever the surface size
/// changes, then any mix of the rest.
pub trait GpuDevice {
    /// Acquire the context, compile shaders and allocate vertex/index buffers.
    ///
    /// Failures must be reported as [`crate::PaintError::Init`].
    fn initialize(&mut self, limits: &BatchLimits) -> PaintResult<()>;

    /// Set the render target size.
    fn resize(&mut self, size: SurfaceSize) -> PaintResult<()>;

    /// Clear the render target to a straight-alpha color, or transparent.
    fn clear(&mut self, rgba: Option<[u8; 4]>) -> PaintResult<()>;

    /// Upload premultiplied RGBA8 pixels as a new texture.
    fn upload_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba8_premul: &[u8],
    ) -> PaintResult<TextureId>;

    /// Release a texture. Unknown ids are ignored.
    fn release_texture(&mut self, id: TextureId);

    /// Draw one batch over the current target contents.
    fn draw(&mut self, batch: &DrawBatch<'_>) -> PaintResult<()>;

    /// Read the render target back as premultiplied RGBA8.
    fn read_pixels(&mut self) -> PaintResult<FrameRGBA>;
}

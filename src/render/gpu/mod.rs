//! Batched GPU backend.
//!
//! One render pass linearizes the display list into a single vertex batch. The batch is flushed
//! (one indexed draw) whenever the vertex buffer is full or every texture slot is taken, and once
//! more at the end of the pass. Image textures stay resident for the renderer's lifetime; textures
//! of cached subtrees are evicted after any pass that did not use them.

/// Vertex layout and quad batch.
pub mod batch;
/// Device seam.
pub mod device;
/// Recording CPU device.
pub mod headless;
#[cfg(feature = "gpu")]
mod shaders;
pub(crate) mod textures;
/// wgpu device.
#[cfg(feature = "gpu")]
pub mod wgpu_device;

use std::collections::HashMap;

use crate::foundation::core::{FrameRGBA, Rect, SurfaceSize};
use crate::foundation::error::{PaintError, PaintResult};
use crate::foundation::transform::Transform2D;
use crate::render::backend::{BatchLimits, RenderSettings, Renderer, RendererCore, requested_size};
use crate::render::gpu::batch::{INDICES_PER_QUAD, UNIT_CORNERS, VertexBatch};
use crate::render::gpu::device::{DrawBatch, GpuDevice, TextureId};
use crate::render::gpu::textures::{CachePool, SlotTable};
use crate::render::traverse::{Leaf, LeafSink, TransformPool, TransformPoolStats, traverse};
use crate::scene::image::{ImageHandle, ImageId};
use crate::scene::node::SceneNode;

/// Counters for the most recent render pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Draw calls issued.
    pub flushes: u64,
    /// Quads written.
    pub quads: u64,
    /// Textures uploaded (images and cache bitmaps).
    pub texture_uploads: u64,
    /// Cached-subtree lookups served by a resident texture.
    pub cache_hits: u64,
    /// Cached-subtree lookups that needed an upload.
    pub cache_misses: u64,
    /// Cache textures released at the end of the pass.
    pub cache_evictions: u64,
}

/// GPU render target size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GpuSurface {
    size: SurfaceSize,
}

impl GpuSurface {
    /// Surface of `size`.
    pub fn new(size: SurfaceSize) -> Self {
        Self { size }
    }

    /// Surface dimensions.
    pub fn size(&self) -> SurfaceSize {
        self.size
    }
}

#[derive(Debug)]
enum InitState {
    Pending,
    Ready,
    Failed(String),
}

/// Batched renderer over a [`GpuDevice`].
pub struct GpuRenderer<N, D> {
    core: RendererCore<N, GpuSurface>,
    device: D,
    limits: BatchLimits,
    state: InitState,
    device_size: Option<SurfaceSize>,
    batch: VertexBatch,
    slots: SlotTable,
    cache: CachePool,
    images: HashMap<ImageId, TextureId>,
    pool: TransformPool,
    stats: BatchStats,
}

impl<N: SceneNode, D: GpuDevice> GpuRenderer<N, D> {
    /// Renderer over `device`. The device is initialized lazily by the first clear or render.
    pub fn new(device: D, settings: RenderSettings, limits: BatchLimits) -> Self {
        let limits = limits.clamped();
        Self {
            core: RendererCore::new(settings),
            device,
            limits,
            state: InitState::Pending,
            device_size: None,
            batch: VertexBatch::default(),
            slots: SlotTable::new(limits.max_texture_slots),
            cache: CachePool::default(),
            images: HashMap::new(),
            pool: TransformPool::new(),
            stats: BatchStats::default(),
        }
    }

    /// The device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The device, mutably.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Effective (clamped) limits.
    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// Counters of the last render pass.
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Transform pool counters.
    pub fn transform_pool_stats(&self) -> TransformPoolStats {
        self.pool.stats()
    }

    /// Number of resident cache textures.
    pub fn cached_textures(&self) -> usize {
        self.cache.len()
    }

    /// Whether a cache texture for `cache_id` is resident.
    pub fn has_cached_texture(&self, cache_id: u64) -> bool {
        self.cache.contains(cache_id)
    }

    /// Read the render target back.
    pub fn read_pixels(&mut self) -> PaintResult<FrameRGBA> {
        self.ensure_initialized()?;
        self.sync_device_size()?;
        self.device.read_pixels()
    }

    fn ensure_initialized(&mut self) -> PaintResult<()> {
        match &self.state {
            InitState::Ready => return Ok(()),
            InitState::Failed(reason) => return Err(PaintError::init(reason.clone())),
            InitState::Pending => {}
        }
        match self.device.initialize(&self.limits) {
            Ok(()) => {
                self.batch = VertexBatch::new(self.limits.max_quads);
                self.state = InitState::Ready;
                tracing::debug!(
                    max_quads = self.limits.max_quads,
                    max_texture_slots = self.limits.max_texture_slots,
                    "gpu renderer initialized"
                );
                Ok(())
            }
            Err(e) => {
                let reason = match e {
                    PaintError::Init(reason) => reason,
                    other => other.to_string(),
                };
                tracing::debug!(%reason, "gpu renderer initialization failed");
                self.state = InitState::Failed(reason.clone());
                Err(PaintError::init(reason))
            }
        }
    }

    fn sync_device_size(&mut self) -> PaintResult<()> {
        let Some(size) = self.core.surface().map(GpuSurface::size) else {
            return Ok(());
        };
        if self.device_size != Some(size) {
            self.device.resize(size)?;
            self.device_size = Some(size);
        }
        Ok(())
    }
}

impl<N: SceneNode, D: GpuDevice> Renderer<N> for GpuRenderer<N, D> {
    type Surface = GpuSurface;

    fn core(&self) -> &RendererCore<N, GpuSurface> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut RendererCore<N, GpuSurface> {
        &mut self.core
    }

    fn get_surface(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
    ) -> PaintResult<&mut GpuSurface> {
        let current = self.core.surface().map(GpuSurface::size);
        let size = requested_size(width, height, current, self.core.settings());
        size.to_u16()?;
        if matches!(self.state, InitState::Ready) && self.device_size != Some(size) {
            self.device.resize(size)?;
            self.device_size = Some(size);
        }
        self.core.surface_or_insert(
            size,
            |size| {
                tracing::debug!(width = size.width, height = size.height, "gpu surface created");
                Ok(GpuSurface::new(size))
            },
            |s, size| {
                s.size = size;
                Ok(())
            },
        )
    }

    fn clear(&mut self) -> PaintResult<()> {
        self.ensure_initialized()?;
        if self.core.surface().is_none() {
            return Ok(());
        }
        self.sync_device_size()?;
        self.device.clear(self.core.settings().clear_rgba)
    }

    #[tracing::instrument(skip_all)]
    fn render_root(&mut self, root: &N) -> PaintResult<()> {
        self.ensure_initialized()?;
        if self.core.surface().is_none() {
            return Ok(());
        }
        self.sync_device_size()?;

        let mut stats = BatchStats::default();
        let mut sink = BatchSink {
            device: &mut self.device,
            batch: &mut self.batch,
            slots: &mut self.slots,
            cache: &mut self.cache,
            images: &mut self.images,
            stats: &mut stats,
            snap: self.core.settings().snap_to_pixel,
        };
        let walked = traverse(root, &Transform2D::identity(), &mut self.pool, &mut sink);
        // Drain and evict even on error so the next pass starts clean.
        let drained = sink.flush("end of pass");

        for texture in self.cache.evict_unused() {
            self.device.release_texture(texture);
            stats.cache_evictions += 1;
        }
        if stats.cache_evictions > 0 {
            tracing::debug!(evicted = stats.cache_evictions, "cache textures evicted");
        }
        self.stats = stats;
        walked.and(drained)
    }
}

struct BatchSink<'a, D> {
    device: &'a mut D,
    batch: &'a mut VertexBatch,
    slots: &'a mut SlotTable,
    cache: &'a mut CachePool,
    images: &'a mut HashMap<ImageId, TextureId>,
    stats: &'a mut BatchStats,
    snap: bool,
}

impl<D: GpuDevice> BatchSink<'_, D> {
    fn flush(&mut self, reason: &'static str) -> PaintResult<()> {
        let out = if self.batch.is_empty() {
            Ok(())
        } else {
            let quads = self.batch.quad_count();
            tracing::trace!(reason, quads, textures = self.slots.bound().len(), "flush");
            self.stats.flushes += 1;
            index_count(quads).and_then(|index_count| {
                self.device.draw(&DrawBatch {
                    vertices: self.batch.vertices(),
                    textures: self.slots.bound(),
                    index_count,
                })
            })
        };
        self.batch.reset();
        self.slots.clear();
        out
    }

    fn upload(&mut self, image: &ImageHandle) -> PaintResult<TextureId> {
        self.stats.texture_uploads += 1;
        self.device
            .upload_texture(image.width(), image.height(), image.rgba8_premul())
    }

    /// Resident texture for `leaf`, uploading on first use.
    fn texture_for(&mut self, leaf: &Leaf<'_>) -> PaintResult<TextureId> {
        match *leaf {
            Leaf::Cached { bitmap, cache_id } => {
                if let Some(entry) = self.cache.touch(cache_id) {
                    self.stats.cache_hits += 1;
                    return Ok(entry.texture);
                }
                self.stats.cache_misses += 1;
                let texture = self.upload(bitmap)?;
                self.cache.insert(cache_id, texture);
                Ok(texture)
            }
            Leaf::Bitmap(_) | Leaf::Frame(_) => {
                let image = leaf.image();
                if let Some(&texture) = self.images.get(&image.id()) {
                    return Ok(texture);
                }
                let texture = self.upload(image)?;
                self.images.insert(image.id(), texture);
                Ok(texture)
            }
        }
    }

    fn slot_for(&mut self, texture: TextureId) -> PaintResult<usize> {
        if let Some(slot) = self.slots.lookup(texture) {
            return Ok(slot);
        }
        if self.slots.is_full() {
            self.flush("texture slots exhausted")?;
        }
        let slot = self.slots.bind(texture);
        tracing::trace!(slot, texture = texture.0, "bind texture");
        Ok(slot)
    }
}

fn index_count(quads: usize) -> PaintResult<u32> {
    quads
        .checked_mul(INDICES_PER_QUAD)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| PaintError::validation(format!("index count overflow at {quads} quads")))
}

impl<D: GpuDevice> LeafSink for BatchSink<'_, D> {
    fn paint_leaf(&mut self, leaf: Leaf<'_>, world: &Transform2D) -> PaintResult<()> {
        let image = leaf.image();
        let src = leaf.source_rect();
        if image.width() == 0 || image.height() == 0 || src.width <= 0.0 || src.height <= 0.0 {
            tracing::trace!(src = image.src(), "empty leaf skipped");
            return Ok(());
        }
        if !self.batch.has_room() {
            self.flush("vertex buffer full")?;
        }
        let texture = self.texture_for(&leaf)?;
        let slot = self.slot_for(texture)?;

        let t = world.snapped(self.snap);
        let corners = UNIT_CORNERS.map(|(u, v)| t.transform_point(u * src.width, v * src.height));

        let (tw, th) = (f64::from(image.width()), f64::from(image.height()));
        let uv = Rect::new(
            src.x / tw,
            src.y / th,
            (src.x + src.width) / tw,
            (src.y + src.height) / th,
        );

        self.batch.push_quad(corners, uv, slot as u32, t.alpha as f32)?;
        self.stats.quads += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/render/gpu/renderer.rs"]
mod tests;

//! Hardware [`GpuDevice`] on wgpu with an offscreen `Rgba8Unorm` render target.

use std::collections::HashMap;

use wgpu::util::DeviceExt as _;

use crate::foundation::core::{FrameRGBA, Rgba8Premul, SurfaceSize};
use crate::foundation::error::{PaintError, PaintResult};
use crate::render::backend::BatchLimits;
use crate::render::gpu::batch::{VERTICES_PER_QUAD, Vertex, quad_indices};
use crate::render::gpu::device::{DrawBatch, GpuDevice, TextureId};
use crate::render::gpu::shaders::{SAMPLER_BINDING, batch_shader_source};

struct Target {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    bytes_per_row: u32,
    size: SurfaceSize,
}

struct Context {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    textures_layout: wgpu::BindGroupLayout,
    viewport: wgpu::Buffer,
    viewport_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    max_quads: usize,
    blank: wgpu::TextureView,
}

/// wgpu-backed device. Construction is cheap; the adapter is requested by
/// [`GpuDevice::initialize`].
#[derive(Default)]
pub struct WgpuDevice {
    ctx: Option<Context>,
    target: Option<Target>,
    textures: HashMap<TextureId, wgpu::TextureView>,
    next_id: u64,
}

impl std::fmt::Debug for WgpuDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuDevice")
            .field("initialized", &self.ctx.is_some())
            .field("size", &self.target.as_ref().map(|t| t.size))
            .field("textures", &self.textures.len())
            .finish()
    }
}

impl WgpuDevice {
    /// Uninitialized device.
    pub fn new() -> Self {
        Self::default()
    }

    fn ctx(&self) -> PaintResult<&Context> {
        self.ctx
            .as_ref()
            .ok_or_else(|| PaintError::surface("gpu device not initialized"))
    }

    fn target(&self) -> PaintResult<&Target> {
        self.target
            .as_ref()
            .ok_or_else(|| PaintError::surface("gpu render target not sized"))
    }

    fn pass(
        ctx: &Context,
        target: &Target,
        load: wgpu::LoadOp<wgpu::Color>,
        draw: impl FnOnce(&mut wgpu::RenderPass<'_>),
    ) {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scenepaint_batch_encoder"),
            });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scenepaint_batch_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            draw(&mut rp);
        }
        ctx.queue.submit(Some(encoder.finish()));
    }
}

fn request_context(limits: &BatchLimits) -> PaintResult<Context> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .map_err(|e| match e {
        wgpu::RequestAdapterError::NotFound { .. } => PaintError::init("no gpu adapter available"),
        other => PaintError::init(format!("wgpu request_adapter failed: {other:?}")),
    })?;
    let info = adapter.get_info();
    tracing::info!(adapter = %info.name, backend = ?info.backend, "gpu adapter selected");

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("scenepaint_device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        experimental_features: wgpu::ExperimentalFeatures::default(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
    }))
    .map_err(|e| PaintError::init(format!("wgpu request_device failed: {e:?}")))?;

    let vertex_bytes = (limits.max_quads as u64)
        .checked_mul((VERTICES_PER_QUAD * std::mem::size_of::<Vertex>()) as u64)
        .filter(|&b| b <= device.limits().max_buffer_size)
        .ok_or_else(|| {
            PaintError::init(format!(
                "vertex buffer for {} quads exceeds device limits",
                limits.max_quads
            ))
        })?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..SAMPLER_BINDING)
        .map(|binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        })
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: SAMPLER_BINDING,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });
    let textures_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scenepaint_textures_bgl"),
        entries: &entries,
    });
    let viewport_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scenepaint_viewport_bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scenepaint_batch_shader"),
        source: wgpu::ShaderSource::Wgsl(batch_shader_source().into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scenepaint_batch_pl"),
        bind_group_layouts: &[&textures_layout, &viewport_layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("scenepaint_batch_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3,
                    1 => Float32x3,
                    2 => Float32
                ],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: wgpu::TextureFormat::Rgba8Unorm,
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(PaintError::init(format!("batch pipeline creation failed: {err}")));
    }

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("scenepaint_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let viewport = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("scenepaint_viewport"),
        size: 16,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let viewport_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scenepaint_viewport_bg"),
        layout: &viewport_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: viewport.as_entire_binding(),
        }],
    });

    let vertices = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("scenepaint_vertices"),
        size: vertex_bytes,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("scenepaint_indices"),
        contents: bytemuck::cast_slice(&quad_indices(limits.max_quads)),
        usage: wgpu::BufferUsages::INDEX,
    });

    // Unused slots still need a view bound.
    let blank = create_texture(&device, &queue, 1, 1, &[0; 4], "scenepaint_blank");

    Ok(Context {
        device,
        queue,
        pipeline,
        textures_layout,
        viewport,
        viewport_group,
        sampler,
        vertices,
        indices,
        max_quads: limits.max_quads,
        blank,
    })
}

fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    width: u32,
    height: u32,
    rgba8_premul: &[u8],
    label: &str,
) -> wgpu::TextureView {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        rgba8_premul,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

impl GpuDevice for WgpuDevice {
    fn initialize(&mut self, limits: &BatchLimits) -> PaintResult<()> {
        let ctx = request_context(limits)?;
        tracing::debug!(max_quads = ctx.max_quads, "wgpu batch pipeline ready");
        self.ctx = Some(ctx);
        Ok(())
    }

    fn resize(&mut self, size: SurfaceSize) -> PaintResult<()> {
        size.to_u16()?;
        let ctx = self.ctx()?;
        let bytes_per_row = align_to(
            size.width
                .checked_mul(4)
                .ok_or_else(|| PaintError::surface("render target width overflow"))?,
            wgpu::COPY_BYTES_PER_ROW_ALIGNMENT,
        );
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scenepaint_target"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let readback = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scenepaint_readback"),
            size: u64::from(bytes_per_row) * u64::from(size.height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let viewport = [size.width as f32, size.height as f32, 0.0, 0.0];
        ctx.queue
            .write_buffer(&ctx.viewport, 0, bytemuck::cast_slice(&viewport));

        tracing::debug!(width = size.width, height = size.height, "wgpu target resized");
        self.target = Some(Target {
            texture,
            view,
            readback,
            bytes_per_row,
            size,
        });
        Ok(())
    }

    fn clear(&mut self, rgba: Option<[u8; 4]>) -> PaintResult<()> {
        let (ctx, target) = (self.ctx()?, self.target()?);
        let color = match rgba {
            Some([r, g, b, a]) => {
                let p = Rgba8Premul::from_straight_rgba(r, g, b, a);
                wgpu::Color {
                    r: f64::from(p.r) / 255.0,
                    g: f64::from(p.g) / 255.0,
                    b: f64::from(p.b) / 255.0,
                    a: f64::from(p.a) / 255.0,
                }
            }
            None => wgpu::Color::TRANSPARENT,
        };
        Self::pass(ctx, target, wgpu::LoadOp::Clear(color), |_| {});
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
        let ctx = self.ctx()?;
        let view = create_texture(
            &ctx.device,
            &ctx.queue,
            width,
            height,
            rgba8_premul,
            "scenepaint_texture",
        );
        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(id, view);
        Ok(id)
    }

    fn release_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
    }

    fn draw(&mut self, batch: &DrawBatch<'_>) -> PaintResult<()> {
        let (ctx, target) = (self.ctx()?, self.target()?);
        if batch.vertices.len() > ctx.max_quads.saturating_mul(VERTICES_PER_QUAD) {
            return Err(PaintError::surface("draw exceeds vertex buffer capacity"));
        }
        if batch.textures.len() > SAMPLER_BINDING as usize {
            return Err(PaintError::surface("draw binds more textures than slots"));
        }

        let mut views: Vec<&wgpu::TextureView> = Vec::with_capacity(SAMPLER_BINDING as usize);
        for id in batch.textures {
            let view = self
                .textures
                .get(id)
                .ok_or_else(|| PaintError::surface(format!("unknown texture {}", id.0)))?;
            views.push(view);
        }
        views.resize(SAMPLER_BINDING as usize, &ctx.blank);

        let mut entries: Vec<wgpu::BindGroupEntry<'_>> = views
            .iter()
            .zip(0u32..)
            .map(|(view, binding)| wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: SAMPLER_BINDING,
            resource: wgpu::BindingResource::Sampler(&ctx.sampler),
        });
        let textures_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scenepaint_textures_bg"),
            layout: &ctx.textures_layout,
            entries: &entries,
        });

        ctx.queue
            .write_buffer(&ctx.vertices, 0, bytemuck::cast_slice(batch.vertices));
        Self::pass(ctx, target, wgpu::LoadOp::Load, |rp| {
            rp.set_pipeline(&ctx.pipeline);
            rp.set_bind_group(0, &textures_group, &[]);
            rp.set_bind_group(1, &ctx.viewport_group, &[]);
            rp.set_vertex_buffer(0, ctx.vertices.slice(..));
            rp.set_index_buffer(ctx.indices.slice(..), wgpu::IndexFormat::Uint32);
            rp.draw_indexed(0..batch.index_count, 0, 0..1);
        });
        Ok(())
    }

    fn read_pixels(&mut self) -> PaintResult<FrameRGBA> {
        let (ctx, target) = (self.ctx()?, self.target()?);
        let SurfaceSize { width, height } = target.size;

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scenepaint_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &target.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(target.bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue.submit(Some(encoder.finish()));

        let slice = target.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        ctx.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| PaintError::surface(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| PaintError::surface("readback channel closed"))?
            .map_err(|e| PaintError::surface(format!("readback map failed: {e:?}")))?;

        let mapped = slice.get_mapped_range();
        let row_bytes = (width as usize) * 4;
        let padded = target.bytes_per_row as usize;
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * padded;
            data.extend_from_slice(&mapped[start..start + row_bytes]);
        }
        drop(mapped);
        target.readback.unmap();

        Ok(FrameRGBA {
            width,
            height,
            data,
            premultiplied: true,
        })
    }
}

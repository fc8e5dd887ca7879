//! scenepaint renders retained 2D display lists.
//!
//! A display list is a tree of [`SceneNode`]s: bitmaps, sprite-sheet frames, containers and cached
//! subtrees, each carrying position, scale, rotation, skew, registration point and opacity. Every
//! backend implements the same [`Renderer`] contract:
//!
//! - [`RasterRenderer`] paints into a CPU pixmap via `vello_cpu`
//! - [`DomRenderer`] and [`SvgRenderer`] emit markup, as a live element tree or as a string
//! - [`GpuRenderer`] linearizes the list into batched, textured quads over a [`GpuDevice`]
//!
//! Per frame, callers usually run [`Renderer::update`]: clear, advance animations, render.
#![warn(missing_docs)]

mod foundation;

/// Renderer contract and backends.
pub mod render;
/// Display-list model.
pub mod scene;

pub use crate::foundation::core::{
    Affine, FrameRGBA, Point, Rect, Rgba8Premul, SurfaceSize, Vec2,
};
pub use crate::foundation::error::{PaintError, PaintResult};
pub use crate::foundation::transform::{BlendMode, Shadow, Transform2D};

pub use crate::render::backend::{
    BatchLimits, MAX_QUADS_LIMIT, MAX_TEXTURE_SLOTS_LIMIT, RenderSettings, Renderer, RendererCore,
};
pub use crate::render::dom::{DomRenderer, DomStringRenderer};
pub use crate::render::gpu::device::{DrawBatch, GpuDevice, TextureId};
pub use crate::render::gpu::headless::{DrawCall, HeadlessDevice};
#[cfg(feature = "gpu")]
pub use crate::render::gpu::wgpu_device::WgpuDevice;
pub use crate::render::gpu::{BatchStats, GpuRenderer, GpuSurface};
pub use crate::render::markup::{Element, ElementTree, MarkupString, MarkupSurface};
pub use crate::render::raster::{RasterRenderer, RasterSurface};
pub use crate::render::svg::{SvgRenderer, SvgStringRenderer};
pub use crate::render::traverse::TransformPoolStats;
pub use crate::scene::image::{Frame, FrameAtlas, FrameRect, ImageHandle, ImageId};
pub use crate::scene::model::{CachedBitmap, DisplayNode, NodeKind, Sprite};
pub use crate::scene::node::{DisplayProps, NodeVariant, SceneNode, TickParams, tick_display_list};

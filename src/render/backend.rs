use crate::foundation::core::SurfaceSize;
use crate::foundation::error::{PaintError, PaintResult};
use crate::scene::node::{SceneNode, TickParams};

/// Backend-agnostic settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Round pure-translation transforms to whole pixels before painting.
    pub snap_to_pixel: bool,
    /// Whether [`Renderer::update`] ticks the root before rendering.
    pub tick_on_update: bool,
    /// Width used when [`Renderer::get_surface`] receives `None`.
    pub default_width: u32,
    /// Height used when [`Renderer::get_surface`] receives `None`.
    pub default_height: u32,
    /// If set, pixel backends clear to this straight-alpha RGBA8 color.
    pub clear_rgba: Option<[u8; 4]>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            snap_to_pixel: true,
            tick_on_update: true,
            default_width: 640,
            default_height: 480,
            clear_rgba: None,
        }
    }
}

impl RenderSettings {
    /// Parse settings from JSON. Missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> PaintResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| PaintError::serde(format!("render settings JSON: {e}")))
    }

    /// Default surface size.
    pub fn default_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.default_width, self.default_height)
    }
}

/// Largest quad count accepted by [`BatchLimits`].
///
/// At 112 bytes per quad the vertex buffer stays under wgpu's default 256 MiB buffer limit, and
/// the index count stays far inside `u32`.
pub const MAX_QUADS_LIMIT: usize = 1 << 21;
/// Texture units available to one batched draw.
pub const MAX_TEXTURE_SLOTS_LIMIT: usize = 16;

/// Capacity limits for the batched GPU backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BatchLimits {
    /// Quads held by the vertex buffer before a forced flush.
    pub max_quads: usize,
    /// Distinct textures bound per draw before a forced flush.
    pub max_texture_slots: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_quads: 5000,
            max_texture_slots: MAX_TEXTURE_SLOTS_LIMIT,
        }
    }
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
}

impl BatchLimits {
    /// Apply `SCENEPAINT_MAX_QUADS` / `SCENEPAINT_MAX_TEXTURE_SLOTS` when set, then clamp.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env_usize("SCENEPAINT_MAX_QUADS") {
            self.max_quads = n;
        }
        if let Some(n) = env_usize("SCENEPAINT_MAX_TEXTURE_SLOTS") {
            self.max_texture_slots = n;
        }
        self.clamped()
    }

    /// Clamp both limits into their supported ranges.
    pub fn clamped(self) -> Self {
        Self {
            max_quads: self.max_quads.clamp(1, MAX_QUADS_LIMIT),
            max_texture_slots: self.max_texture_slots.clamp(1, MAX_TEXTURE_SLOTS_LIMIT),
        }
    }
}

/// State shared by every renderer: the configured root, the surface and settings.
#[derive(Debug)]
pub struct RendererCore<N, S> {
    root: Option<N>,
    surface: Option<S>,
    settings: RenderSettings,
}

impl<N, S> RendererCore<N, S> {
    /// Empty core with no root and no surface.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            root: None,
            surface: None,
            settings,
        }
    }

    /// Settings in effect.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Configured root, if any.
    pub fn root(&self) -> Option<&N> {
        self.root.as_ref()
    }

    /// Mutable configured root, if any.
    pub fn root_mut(&mut self) -> Option<&mut N> {
        self.root.as_mut()
    }

    /// Replace the root, returning the previous one.
    pub fn set_root(&mut self, root: Option<N>) -> Option<N> {
        std::mem::replace(&mut self.root, root)
    }

    /// Current surface, if any.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Mutable current surface, if any.
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Replace the surface, returning the previous one.
    pub fn set_surface(&mut self, surface: Option<S>) -> Option<S> {
        std::mem::replace(&mut self.surface, surface)
    }

    /// Return the surface, creating it with `create` or resizing it in place with `resize`.
    pub fn surface_or_insert(
        &mut self,
        size: SurfaceSize,
        create: impl FnOnce(SurfaceSize) -> PaintResult<S>,
        resize: impl FnOnce(&mut S, SurfaceSize) -> PaintResult<()>,
    ) -> PaintResult<&mut S> {
        if let Some(s) = self.surface.as_mut() {
            resize(s, size)?;
        } else {
            self.surface = Some(create(size)?);
        }
        self.surface
            .as_mut()
            .ok_or_else(|| PaintError::surface("surface missing after creation"))
    }
}

/// The rendering contract every backend implements.
///
/// Per frame a caller typically runs [`Renderer::update`], which clears the surface, ticks the
/// root and paints it. All state is owned by the renderer instance.
pub trait Renderer<N: SceneNode> {
    /// Output surface type.
    type Surface;

    /// Shared state.
    fn core(&self) -> &RendererCore<N, Self::Surface>;

    /// Shared state, mutably.
    fn core_mut(&mut self) -> &mut RendererCore<N, Self::Surface>;

    /// Create the surface if absent, otherwise resize it in place, and return it.
    ///
    /// Missing dimensions fall back to the current size, then to the configured default size.
    fn get_surface(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
    ) -> PaintResult<&mut Self::Surface>;

    /// Wipe all visible output on the surface.
    fn clear(&mut self) -> PaintResult<()>;

    /// Paint `root` onto the configured surface. A missing surface is a no-op.
    fn render_root(&mut self, root: &N) -> PaintResult<()>;

    /// Settings in effect.
    fn settings<'a>(&'a self) -> &'a RenderSettings
    where
        N: 'a,
    {
        self.core().settings()
    }

    /// Configure the root painted by [`Renderer::render`], returning the previous one.
    fn set_root(&mut self, root: N) -> Option<N> {
        self.core_mut().set_root(Some(root))
    }

    /// Remove and return the configured root.
    fn take_root(&mut self) -> Option<N> {
        self.core_mut().set_root(None)
    }

    /// Configured root, if any.
    fn root(&self) -> Option<&N> {
        self.core().root()
    }

    /// Mutable configured root, if any.
    fn root_mut(&mut self) -> Option<&mut N> {
        self.core_mut().root_mut()
    }

    /// Current surface, if any.
    fn surface<'a>(&'a self) -> Option<&'a Self::Surface>
    where
        N: 'a,
    {
        self.core().surface()
    }

    /// Swap in an explicit surface, returning the previous one.
    fn set_surface(&mut self, surface: Option<Self::Surface>) -> Option<Self::Surface> {
        self.core_mut().set_surface(surface)
    }

    /// Advance the configured root. No-op without a root.
    fn tick(&mut self, params: Option<&TickParams>) {
        if let Some(root) = self.core_mut().root_mut() {
            root.tick(params);
        }
    }

    /// Paint the configured root. No-op without a root.
    fn render(&mut self) -> PaintResult<()> {
        let Some(root) = self.core_mut().set_root(None) else {
            return Ok(());
        };
        let out = self.render_root(&root);
        self.core_mut().set_root(Some(root));
        out
    }

    /// Paint `root` (or the configured root when `None`) onto the caller's `surface`.
    ///
    /// The caller's surface stands in for the configured one for the duration of the call and is
    /// handed back afterwards, whatever the outcome. An empty slot is a no-op like a missing
    /// configured surface.
    fn render_into(
        &mut self,
        root: Option<&N>,
        surface: &mut Option<Self::Surface>,
    ) -> PaintResult<()> {
        let configured = self.core_mut().set_surface(surface.take());
        let out = match root {
            Some(root) => self.render_root(root),
            None => self.render(),
        };
        *surface = self.core_mut().set_surface(configured);
        out
    }

    /// `clear`, optionally `tick`, then `render`.
    fn update(&mut self, params: Option<&TickParams>) -> PaintResult<()> {
        self.clear()?;
        if self.settings().tick_on_update {
            self.tick(params);
        }
        self.render()
    }
}

/// Resolve requested surface dimensions against the current surface size or the defaults.
pub(crate) fn requested_size(
    width: Option<u32>,
    height: Option<u32>,
    current: Option<SurfaceSize>,
    settings: &RenderSettings,
) -> SurfaceSize {
    SurfaceSize::resolve(width, height, current.unwrap_or(settings.default_size()))
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;

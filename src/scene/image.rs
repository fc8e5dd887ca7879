use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::{Rect, Rgba8Premul, SurfaceSize};
use crate::foundation::error::{PaintError, PaintResult};
use crate::foundation::math::premultiply_rgba8_in_place;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an [`ImageHandle`]. Texture pools key on this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl ImageId {
    fn next() -> Self {
        Self(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

struct ImageData {
    id: ImageId,
    src: String,
    width: u32,
    height: u32,
    rgba8_premul: Vec<u8>,
}

/// Cheaply clonable handle to an immutable, premultiplied RGBA8 image.
///
/// Every constructor assigns a fresh [`ImageId`]; clones share it.
#[derive(Clone)]
pub struct ImageHandle(Arc<ImageData>);

impl std::fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.0.id)
            .field("src", &self.0.src)
            .field("width", &self.0.width)
            .field("height", &self.0.height)
            .finish()
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for ImageHandle {}

impl ImageHandle {
    /// Build from straight-alpha RGBA8 bytes. Pixels are premultiplied on construction.
    pub fn from_rgba8(
        src: impl Into<String>,
        width: u32,
        height: u32,
        rgba8: Vec<u8>,
    ) -> PaintResult<Self> {
        let mut bytes = rgba8;
        premultiply_rgba8_in_place(&mut bytes);
        Self::from_premul_rgba8(src, width, height, bytes)
    }

    /// Build from bytes that are already premultiplied.
    pub fn from_premul_rgba8(
        src: impl Into<String>,
        width: u32,
        height: u32,
        rgba8_premul: Vec<u8>,
    ) -> PaintResult<Self> {
        let expected = SurfaceSize::new(width, height)
            .pixel_count()
            .saturating_mul(4);
        if rgba8_premul.len() != expected {
            return Err(PaintError::validation(format!(
                "image byte len mismatch: expected {expected}, got {}",
                rgba8_premul.len()
            )));
        }
        Ok(Self(Arc::new(ImageData {
            id: ImageId::next(),
            src: src.into(),
            width,
            height,
            rgba8_premul,
        })))
    }

    /// Decode encoded image bytes (PNG, JPEG, ...) with the `image` crate.
    pub fn decode(src: impl Into<String>, bytes: &[u8]) -> PaintResult<Self> {
        let src = src.into();
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|e| PaintError::validation(format!("decode image '{src}': {e}")))?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(src, width, height, rgba.into_raw())
    }

    /// A `width` x `height` image filled with one color.
    pub fn solid(
        src: impl Into<String>,
        width: u32,
        height: u32,
        color: Rgba8Premul,
    ) -> PaintResult<Self> {
        let px = color.to_array();
        let n = SurfaceSize::new(width, height).pixel_count();
        let mut bytes = Vec::with_capacity(n.saturating_mul(4));
        for _ in 0..n {
            bytes.extend_from_slice(&px);
        }
        Self::from_premul_rgba8(src, width, height, bytes)
    }

    /// Identity shared by every clone of this handle.
    pub fn id(&self) -> ImageId {
        self.0.id
    }

    /// Source reference emitted by markup backends.
    pub fn src(&self) -> &str {
        &self.0.src
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.0.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.0.height
    }

    /// Premultiplied RGBA8 pixels, row-major.
    pub fn rgba8_premul(&self) -> &[u8] {
        &self.0.rgba8_premul
    }
}

/// Sub-rectangle of a sprite sheet, in source pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl FrameRect {
    /// Create a frame rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// As a kurbo rectangle.
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// One resolved animation frame: source image plus sub-rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Source sprite sheet.
    pub image: ImageHandle,
    /// Region of `image` holding this frame.
    pub rect: FrameRect,
}

/// Indexed list of sprite frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameAtlas {
    frames: Vec<Frame>,
}

impl FrameAtlas {
    /// Create an atlas from explicit frames.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Slice `image` into a grid of `frame_width` x `frame_height` cells, row-major.
    ///
    /// Partial cells at the right and bottom edges are dropped.
    pub fn from_grid(image: &ImageHandle, frame_width: u32, frame_height: u32) -> PaintResult<Self> {
        if frame_width == 0 || frame_height == 0 {
            return Err(PaintError::validation("sprite frame size must be non-zero"));
        }
        let cols = image.width() / frame_width;
        let rows = image.height() / frame_height;
        let mut frames = Vec::with_capacity((cols as usize).saturating_mul(rows as usize));
        for row in 0..rows {
            for col in 0..cols {
                frames.push(Frame {
                    image: image.clone(),
                    rect: FrameRect::new(
                        f64::from(col * frame_width),
                        f64::from(row * frame_height),
                        f64::from(frame_width),
                        f64::from(frame_height),
                    ),
                });
            }
        }
        Ok(Self { frames })
    }

    /// Frame at `index`, or `None` when out of range.
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when the atlas holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/image.rs"]
mod tests;

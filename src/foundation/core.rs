use crate::foundation::error::{PaintError, PaintResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Surface dimensions in pixels.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Create a size value.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Resolve optional requested dimensions against a current or default size.
    ///
    /// A missing dimension keeps the value from `fallback`.
    pub fn resolve(width: Option<u32>, height: Option<u32>, fallback: SurfaceSize) -> Self {
        Self {
            width: width.unwrap_or(fallback.width),
            height: height.unwrap_or(fallback.height),
        }
    }

    /// Number of pixels covered by the surface.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Narrow to `u16` dimensions, as required by the raster pipeline.
    pub fn to_u16(self) -> PaintResult<(u16, u16)> {
        let w: u16 = self.width.try_into().map_err(|_| {
            PaintError::validation(format!("surface width exceeds u16: {}", self.width))
        })?;
        let h: u16 = self.height.try_into().map_err(|_| {
            PaintError::validation(format!("surface height exceeds u16: {}", self.height))
        })?;
        if w == 0 || h == 0 {
            return Err(PaintError::validation(format!(
                "surface must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok((w, h))
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        use crate::foundation::math::mul_div255_u8;

        let a16 = u16::from(a);
        Self {
            r: mul_div255_u8(u16::from(r), a16),
            g: mul_div255_u8(u16::from(g), a16),
            b: mul_div255_u8(u16::from(b), a16),
            a,
        }
    }

    /// Byte layout as stored in pixel buffers.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**. The `premultiplied` flag is kept to make this explicit at
/// API boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data
            .get(i..i + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Pixel-aligned bounding box (max-exclusive) of every pixel matching `pred`.
    pub fn bounds_where(&self, mut pred: impl FnMut([u8; 4]) -> bool) -> Option<Rect> {
        let mut out: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                let Some(px) = self.pixel(x, y) else { continue };
                if !pred(px) {
                    continue;
                }
                out = Some(match out {
                    None => (x, y, x + 1, y + 1),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
                });
            }
        }
        out.map(|(x0, y0, x1, y1)| {
            Rect::new(f64::from(x0), f64::from(y0), f64::from(x1), f64::from(y1))
        })
    }

    /// Convert into a straight-alpha `image::RgbaImage` (for saving or inspection).
    pub fn to_rgba_image(&self) -> PaintResult<image::RgbaImage> {
        let mut bytes = self.data.clone();
        if self.premultiplied {
            crate::foundation::math::unpremultiply_rgba8_in_place(&mut bytes);
        }
        image::RgbaImage::from_raw(self.width, self.height, bytes)
            .ok_or_else(|| PaintError::surface("frame byte len does not match its dimensions"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

use std::sync::Arc;

use crate::foundation::core::{FrameSize, PixelRect};
use crate::foundation::error::{ZoomError, ZoomResult};

/// Colour table of at most 256 RGB entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    /// Maximum number of entries addressable by an 8-bit index.
    pub const MAX_COLORS: usize = 256;

    pub fn new(colors: Vec<[u8; 3]>) -> ZoomResult<Self> {
        if colors.is_empty() || colors.len() > Self::MAX_COLORS {
            return Err(ZoomError::invalid_dimension(format!(
                "palette must hold 1..=256 colors, got {}",
                colors.len()
            )));
        }
        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color(&self, index: u8) -> [u8; 3] {
        self.colors
            .get(usize::from(index))
            .copied()
            .unwrap_or([0, 0, 0])
    }

    /// Index of the entry with the smallest squared RGB distance; ties keep the lower index.
    pub fn nearest(&self, rgb: [f32; 3]) -> u8 {
        let mut best = 0usize;
        let mut best_d = f32::INFINITY;
        for (i, c) in self.colors.iter().enumerate() {
            let dr = rgb[0] - f32::from(c[0]);
            let dg = rgb[1] - f32::from(c[1]);
            let db = rgb[2] - f32::from(c[2]);
            let d = dr * dr + dg * dg + db * db;
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best as u8
    }

    /// Flat `r,g,b,r,g,b,...` bytes as written into a GIF colour table.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flatten().copied().collect()
    }
}

/// Pixel buffer with explicit bounds: a crop keeps the coordinates it was cut from.
pub trait Raster: Sized {
    fn bounds(&self) -> PixelRect;

    /// Copy the pixels of `rect` verbatim into a new raster whose bounds equal `rect`.
    fn crop(&self, rect: PixelRect) -> ZoomResult<Self>;

    /// Nearest-neighbour resample to `size`, anchored at the origin.
    fn resize_nearest(&self, size: FrameSize) -> ZoomResult<Self>;

    fn size(&self) -> FrameSize {
        self.bounds().size()
    }
}

/// Straight-alpha RGBA frame backed by an [`image::RgbaImage`].
#[derive(Clone, Debug, PartialEq)]
pub struct RgbaFrame {
    bounds: PixelRect,
    pixels: image::RgbaImage,
}

impl RgbaFrame {
    /// Wrap a decoded image; bounds are anchored at the origin.
    pub fn from_image(pixels: image::RgbaImage) -> ZoomResult<Self> {
        let size = FrameSize::new(pixels.width(), pixels.height())?;
        Ok(Self {
            bounds: PixelRect::from_size(size),
            pixels,
        })
    }

    pub fn pixels(&self) -> &image::RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> image::RgbaImage {
        self.pixels
    }

    /// Composite every pixel over an opaque `background`, dropping alpha.
    pub fn flatten(&self, background: [u8; 3]) -> Self {
        let mut out = self.pixels.clone();
        for p in out.pixels_mut() {
            let a = u32::from(p.0[3]);
            if a == 255 {
                continue;
            }
            for c in 0..3 {
                let fg = u32::from(p.0[c]) * a;
                let bg = u32::from(background[c]) * (255 - a);
                p.0[c] = ((fg + bg + 127) / 255) as u8;
            }
            p.0[3] = 255;
        }
        Self {
            bounds: self.bounds,
            pixels: out,
        }
    }

    /// Resample to `size` with one of `image`'s reconstruction filters.
    pub fn resize_filtered(
        &self,
        size: FrameSize,
        filter: image::imageops::FilterType,
    ) -> ZoomResult<Self> {
        let size = FrameSize::new(size.width, size.height)?;
        let pixels = image::imageops::resize(&self.pixels, size.width, size.height, filter);
        Ok(Self {
            bounds: PixelRect::from_size(size),
            pixels,
        })
    }

    fn local_offset(&self, rect: PixelRect) -> (u32, u32) {
        (
            (rect.min_x - self.bounds.min_x) as u32,
            (rect.min_y - self.bounds.min_y) as u32,
        )
    }
}

impl Raster for RgbaFrame {
    fn bounds(&self) -> PixelRect {
        self.bounds
    }

    fn crop(&self, rect: PixelRect) -> ZoomResult<Self> {
        check_crop(self.bounds, rect)?;
        let (x, y) = self.local_offset(rect);
        let pixels = image::imageops::crop_imm(
            &self.pixels,
            x,
            y,
            rect.width() as u32,
            rect.height() as u32,
        )
        .to_image();
        Ok(Self {
            bounds: rect,
            pixels,
        })
    }

    fn resize_nearest(&self, size: FrameSize) -> ZoomResult<Self> {
        let size = FrameSize::new(size.width, size.height)?;
        let src = self.size();
        let pixels = image::RgbaImage::from_fn(size.width, size.height, |x, y| {
            let sx = nearest_source(x, size.width, src.width);
            let sy = nearest_source(y, size.height, src.height);
            *self.pixels.get_pixel(sx, sy)
        });
        Ok(Self {
            bounds: PixelRect::from_size(size),
            pixels,
        })
    }
}

/// Palette-indexed frame. The palette is shared between frames cut from the same source.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedFrame {
    bounds: PixelRect,
    palette: Arc<Palette>,
    indices: Vec<u8>,
}

impl IndexedFrame {
    pub fn new(bounds: PixelRect, palette: Arc<Palette>, indices: Vec<u8>) -> ZoomResult<Self> {
        let expected = bounds.size().pixel_count();
        if indices.len() != expected {
            return Err(ZoomError::invalid_dimension(format!(
                "indexed frame {bounds} expects {expected} indices, got {}",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| usize::from(i) >= palette.len()) {
            return Err(ZoomError::invalid_dimension(format!(
                "palette index {bad} out of range for {} colors",
                palette.len()
            )));
        }
        Ok(Self {
            bounds,
            palette,
            indices,
        })
    }

    pub fn palette(&self) -> &Arc<Palette> {
        &self.palette
    }

    /// Row-major palette indices.
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Expand back to opaque RGBA.
    pub fn to_rgba(&self) -> image::RgbaImage {
        let size = self.size();
        let mut out = image::RgbaImage::new(size.width, size.height);
        for (p, &i) in out.pixels_mut().zip(self.indices.iter()) {
            let [r, g, b] = self.palette.color(i);
            *p = image::Rgba([r, g, b, 255]);
        }
        out
    }
}

impl Raster for IndexedFrame {
    fn bounds(&self) -> PixelRect {
        self.bounds
    }

    fn crop(&self, rect: PixelRect) -> ZoomResult<Self> {
        check_crop(self.bounds, rect)?;
        let stride = self.bounds.width() as usize;
        let x0 = (rect.min_x - self.bounds.min_x) as usize;
        let y0 = (rect.min_y - self.bounds.min_y) as usize;
        let w = rect.width() as usize;
        let mut indices = Vec::with_capacity(rect.size().pixel_count());
        for row in y0..y0 + rect.height() as usize {
            let start = row * stride + x0;
            indices.extend_from_slice(&self.indices[start..start + w]);
        }
        Ok(Self {
            bounds: rect,
            palette: self.palette.clone(),
            indices,
        })
    }

    fn resize_nearest(&self, size: FrameSize) -> ZoomResult<Self> {
        let size = FrameSize::new(size.width, size.height)?;
        let src = self.size();
        let stride = src.width as usize;
        let cols = (0..size.width)
            .map(|x| nearest_source(x, size.width, src.width) as usize)
            .collect::<Vec<_>>();
        let mut indices = Vec::with_capacity(size.pixel_count());
        for y in 0..size.height {
            let row = nearest_source(y, size.height, src.height) as usize * stride;
            indices.extend(cols.iter().map(|&sx| self.indices[row + sx]));
        }
        Ok(Self {
            bounds: PixelRect::from_size(size),
            palette: self.palette.clone(),
            indices,
        })
    }
}

fn check_crop(bounds: PixelRect, rect: PixelRect) -> ZoomResult<()> {
    if !rect.is_inside(bounds) {
        return Err(ZoomError::out_of_bounds(rect, bounds));
    }
    if rect.is_empty() {
        return Err(ZoomError::invalid_dimension(format!(
            "cannot crop to empty rectangle {rect}"
        )));
    }
    Ok(())
}

// Sample at the destination pixel centre: floor((d + 0.5) * src / dst).
fn nearest_source(d: u32, dst: u32, src: u32) -> u32 {
    let s = (u64::from(d) * 2 + 1) * u64::from(src) / (u64::from(dst) * 2);
    (s as u32).min(src.saturating_sub(1))
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;

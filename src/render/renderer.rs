use std::sync::Arc;

use crate::foundation::core::{FrameSize, PixelRect};
use crate::foundation::error::ZoomResult;
use crate::render::quantize::{quantize, remap};
use crate::render::raster::{IndexedFrame, Palette, Raster, RgbaFrame};

/// How a zoom window is resampled back up to the output size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMode {
    /// Sample palette indices directly; never introduces colours outside the palette.
    #[default]
    Nearest,
    /// Linear filter on full-colour pixels, then re-dithered onto the shared palette.
    Triangle,
    /// Cubic filter on full-colour pixels, then re-dithered onto the shared palette.
    CatmullRom,
    /// Lanczos (a=3) on full-colour pixels, then re-dithered onto the shared palette.
    Lanczos3,
}

impl ResampleMode {
    fn filter(self) -> Option<image::imageops::FilterType> {
        match self {
            Self::Nearest => None,
            Self::Triangle => Some(image::imageops::FilterType::Triangle),
            Self::CatmullRom => Some(image::imageops::FilterType::CatmullRom),
            Self::Lanczos3 => Some(image::imageops::FilterType::Lanczos3),
        }
    }
}

/// Read-only inputs shared by every render worker of one batch.
#[derive(Clone, Debug)]
pub struct RenderSource {
    /// Opaque (flattened) full-colour source.
    pub rgba: RgbaFrame,
    /// The source quantized onto the shared palette; also the first animation frame.
    pub quantized: Arc<IndexedFrame>,
    /// Whether filtered resampling re-dithers onto the palette.
    pub dither: bool,
}

impl RenderSource {
    /// Quantize `rgba` once; every zoom frame reuses the resulting palette.
    #[tracing::instrument(skip(rgba), fields(bounds = %rgba.bounds()))]
    pub fn prepare(rgba: RgbaFrame, palette_size: usize, dither: bool) -> ZoomResult<Self> {
        let quantized = Arc::new(quantize(&rgba, palette_size, dither)?);
        Ok(Self {
            rgba,
            quantized,
            dither,
        })
    }

    pub fn bounds(&self) -> PixelRect {
        self.rgba.bounds()
    }

    pub fn size(&self) -> FrameSize {
        self.rgba.size()
    }

    pub fn palette(&self) -> &Arc<Palette> {
        self.quantized.palette()
    }
}

/// Renders one zoom window into a palette frame the size of the source.
///
/// Implementations must be pure with respect to `source`; it is shared across workers, and a
/// timed-out batch may leave a render running after the caller has returned.
pub trait FrameRenderer: Send + Sync {
    fn render(&self, source: &RenderSource, target: PixelRect) -> ZoomResult<IndexedFrame>;
}

/// Default renderer: crop, resample to the source size, map onto the shared palette.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZoomRenderer {
    pub resample: ResampleMode,
}

impl ZoomRenderer {
    pub fn new(resample: ResampleMode) -> Self {
        Self { resample }
    }
}

impl FrameRenderer for ZoomRenderer {
    fn render(&self, source: &RenderSource, target: PixelRect) -> ZoomResult<IndexedFrame> {
        let size = source.size();
        match self.resample.filter() {
            None => source.quantized.crop(target)?.resize_nearest(size),
            Some(filter) => {
                let resized = source.rgba.crop(target)?.resize_filtered(size, filter)?;
                remap(&resized, source.palette().clone(), source.dither)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;

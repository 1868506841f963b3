//! Palette building and error-diffusion mapping.

use std::collections::BTreeSet;
use std::sync::Arc;

use color_quant::NeuQuant;

use crate::foundation::error::{ZoomError, ZoomResult};
use crate::render::raster::{IndexedFrame, Palette, Raster, RgbaFrame};

/// NeuQuant sampling factor: 1 is slowest and best, 30 fastest.
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// Error-diffusion weights over a 5-wide, 3-row window centred on the current pixel (sum 48/48).
pub const DIFFUSION_KERNEL: [[f32; 5]; 3] = [
    [0.0, 0.0, 0.0, 7.0 / 48.0, 5.0 / 48.0],
    [3.0 / 48.0, 5.0 / 48.0, 7.0 / 48.0, 5.0 / 48.0, 3.0 / 48.0],
    [1.0 / 48.0, 3.0 / 48.0, 5.0 / 48.0, 3.0 / 48.0, 1.0 / 48.0],
];

/// Build a palette of at most `palette_size` colours and map `image` onto it.
///
/// Alpha is ignored; flatten translucent input first. Never fails for valid sizes.
pub fn quantize(image: &RgbaFrame, palette_size: usize, dither: bool) -> ZoomResult<IndexedFrame> {
    if !(1..=Palette::MAX_COLORS).contains(&palette_size) {
        return Err(ZoomError::invalid_dimension(format!(
            "palette size must be within 1..=256, got {palette_size}"
        )));
    }
    if dither {
        let palette = Arc::new(build_palette(image, palette_size)?);
        return remap(image, palette, true);
    }
    if let Some(exact) = distinct_colors(image, palette_size) {
        return remap(image, Arc::new(Palette::new(exact)?), false);
    }

    // Without dithering NeuQuant maps pixels through its own colour index.
    let nq = train(image, palette_size);
    let palette = Arc::new(Palette::new(neuquant_colors(&nq, palette_size))?);
    let indices = image
        .pixels()
        .pixels()
        .map(|p| nq.index_of(&p.0) as u8)
        .collect();
    IndexedFrame::new(image.bounds(), palette, indices)
}

/// Map `image` onto an existing palette.
pub fn remap(image: &RgbaFrame, palette: Arc<Palette>, dither: bool) -> ZoomResult<IndexedFrame> {
    let indices = if dither {
        diffuse(image, &palette)
    } else {
        image
            .pixels()
            .pixels()
            .map(|p| palette.nearest([f32::from(p.0[0]), f32::from(p.0[1]), f32::from(p.0[2])]))
            .collect()
    };
    IndexedFrame::new(image.bounds(), palette, indices)
}

fn diffuse(image: &RgbaFrame, palette: &Palette) -> Vec<u8> {
    let w = image.pixels().width() as usize;
    let h = image.pixels().height() as usize;
    let mut work = image
        .pixels()
        .pixels()
        .map(|p| [f32::from(p.0[0]), f32::from(p.0[1]), f32::from(p.0[2])])
        .collect::<Vec<_>>();
    let mut out = vec![0u8; w * h];

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let want = work[i].map(|c| c.clamp(0.0, 255.0));
            let idx = palette.nearest(want);
            out[i] = idx;

            let got = palette.color(idx);
            let err = [
                want[0] - f32::from(got[0]),
                want[1] - f32::from(got[1]),
                want[2] - f32::from(got[2]),
            ];
            if err == [0.0; 3] {
                continue;
            }
            for (dy, row) in DIFFUSION_KERNEL.iter().enumerate() {
                let ny = y + dy;
                if ny >= h {
                    break;
                }
                for (k, &weight) in row.iter().enumerate() {
                    if weight == 0.0 {
                        continue;
                    }
                    let Some(nx) = (x + k).checked_sub(2) else {
                        continue;
                    };
                    if nx >= w {
                        continue;
                    }
                    let n = &mut work[ny * w + nx];
                    for c in 0..3 {
                        n[c] += err[c] * weight;
                    }
                }
            }
        }
    }
    out
}

/// Build a palette of at most `max_colors` entries for `image`.
///
/// Images with no more distinct colours than that keep them exactly, in ascending RGB order.
/// Anything else is trained with NeuQuant at sample factor 10; the result is deterministic
/// for identical input.
pub fn build_palette(image: &RgbaFrame, max_colors: usize) -> ZoomResult<Palette> {
    if let Some(exact) = distinct_colors(image, max_colors) {
        return Palette::new(exact);
    }
    let nq = train(image, max_colors);
    Palette::new(neuquant_colors(&nq, max_colors))
}

fn train(image: &RgbaFrame, max_colors: usize) -> NeuQuant {
    NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, max_colors, image.pixels().as_raw())
}

fn neuquant_colors(nq: &NeuQuant, max_colors: usize) -> Vec<[u8; 3]> {
    (0..max_colors)
        .map(|i| nq.lookup(i).map_or([0, 0, 0], |c| [c[0], c[1], c[2]]))
        .collect()
}

// `None` as soon as more than `max_colors` distinct colours are seen.
fn distinct_colors(image: &RgbaFrame, max_colors: usize) -> Option<Vec<[u8; 3]>> {
    let mut seen = BTreeSet::new();
    for p in image.pixels().pixels() {
        seen.insert([p.0[0], p.0[1], p.0[2]]);
        if seen.len() > max_colors {
            return None;
        }
    }
    Some(seen.into_iter().collect())
}

#[cfg(test)]
#[path = "../../tests/unit/render/quantize.rs"]
mod tests;

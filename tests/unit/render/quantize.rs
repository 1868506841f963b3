use super::*;
use crate::foundation::core::PixelRect;

fn frame(w: u32, h: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> RgbaFrame {
    RgbaFrame::from_image(image::RgbaImage::from_fn(w, h, |x, y| {
        let [r, g, b] = f(x, y);
        image::Rgba([r, g, b, 255])
    }))
    .unwrap()
}

#[test]
fn kernel_weights_sum_to_one() {
    let sum: f32 = DIFFUSION_KERNEL.iter().flatten().sum();
    assert!((sum - 1.0).abs() < 1e-6);
    assert_eq!(DIFFUSION_KERNEL[0][..3], [0.0, 0.0, 0.0]);
}

#[test]
fn few_colors_are_kept_exactly() {
    let img = frame(4, 4, |x, _| if x < 2 { [255, 0, 0] } else { [0, 0, 255] });
    let q = quantize(&img, 256, true).unwrap();
    assert_eq!(q.palette().len(), 2);
    assert_eq!(q.to_rgba(), *img.pixels());
    assert_eq!(q.bounds(), PixelRect::new(0, 0, 4, 4).unwrap());
}

#[test]
fn palette_size_is_respected() {
    let img = frame(32, 32, |x, y| [(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8]);
    for n in [2usize, 16, 64] {
        let q = quantize(&img, n, false).unwrap();
        assert!(q.palette().len() <= n, "{} > {n}", q.palette().len());
        assert!(q.indices().iter().all(|&i| usize::from(i) < q.palette().len()));
    }
}

#[test]
fn quantization_is_deterministic() {
    let img = frame(24, 16, |x, y| [(x * 10) as u8, (y * 15) as u8, ((x ^ y) * 9) as u8]);
    let a = quantize(&img, 8, true).unwrap();
    let b = quantize(&img, 8, true).unwrap();
    assert_eq!(a, b);
}

#[test]
fn dithering_preserves_average_tone() {
    // Mid-grey against a black/white palette: dithering should land near 50% white.
    let img = frame(32, 32, |_, _| [128, 128, 128]);
    let palette = Arc::new(Palette::new(vec![[0, 0, 0], [255, 255, 255]]).unwrap());

    let flat = remap(&img, palette.clone(), false).unwrap();
    let flat_white = flat.indices().iter().filter(|&&i| i == 1).count();
    assert!(flat_white == 0 || flat_white == 1024);

    let dithered = remap(&img, palette, true).unwrap();
    let white = dithered.indices().iter().filter(|&&i| i == 1).count();
    let ratio = white as f64 / 1024.0;
    assert!((0.4..0.6).contains(&ratio), "white ratio {ratio}");
}

#[test]
fn invalid_palette_size_is_rejected() {
    let img = frame(2, 2, |_, _| [1, 2, 3]);
    assert!(quantize(&img, 0, false).is_err());
    assert!(quantize(&img, 257, false).is_err());
}

#[test]
fn exact_palette_keeps_distinct_clusters() {
    let img = frame(8, 8, |x, y| match (x < 4, y < 4) {
        (true, true) => [250, 10, 10],
        (false, true) => [10, 250, 10],
        (true, false) => [10, 10, 250],
        (false, false) => [240, 240, 240],
    });
    let p = build_palette(&img, 4).unwrap();
    assert_eq!(
        p.colors(),
        &[[10, 10, 250], [10, 250, 10], [240, 240, 240], [250, 10, 10]]
    );
}

#[test]
fn neuquant_palette_fills_requested_size_and_tracks_the_image() {
    let img = frame(32, 32, |x, y| [(x * 8) as u8, (y * 8) as u8, 96]);
    let p = build_palette(&img, 64).unwrap();
    assert_eq!(p.len(), 64);
    assert_eq!(p, build_palette(&img, 64).unwrap());

    for dither in [false, true] {
        let q = quantize(&img, 64, dither).unwrap();
        let out = q.to_rgba();
        let total_err: u64 = img
            .pixels()
            .pixels()
            .zip(out.pixels())
            .map(|(a, b)| (0..3).map(|c| u64::from(a.0[c].abs_diff(b.0[c]))).sum::<u64>())
            .sum();
        let mean = total_err as f64 / (32.0 * 32.0 * 3.0);
        assert!(mean < 40.0, "dither={dither} mean channel error {mean}");
    }
}

#[test]
fn diffusion_spreads_error_over_the_kernel_footprint() {
    // Greys 0..=20 are exact palette entries; 240 is the only other entry.
    let mut colors = (0..=20u8).map(|v| [v, v, v]).collect::<Vec<_>>();
    colors.push([240, 240, 240]);
    let palette = Arc::new(Palette::new(colors).unwrap());

    // A 68 grey at (2, 0) maps to 20 and leaves an error of exactly 48 on a background of 10.
    let img = frame(5, 3, |x, y| if (x, y) == (2, 0) { [68; 3] } else { [10; 3] });
    let q = remap(&img, palette, true).unwrap();

    #[rustfmt::skip]
    let expected: [u8; 15] = [
        10, 10, 20, 17, 15,
        13, 15, 17, 15, 13,
        11, 13, 15, 13, 11,
    ];
    assert_eq!(q.indices(), &expected);
}

use super::*;

fn gradient(w: u32, h: u32) -> RgbaFrame {
    RgbaFrame::from_image(image::RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x * 10) as u8, (y * 10) as u8, 0, 255])
    }))
    .unwrap()
}

fn indexed_ramp(w: u32, h: u32) -> IndexedFrame {
    let palette = Arc::new(Palette::new((0..=255u8).map(|v| [v, v, v]).collect()).unwrap());
    let bounds = PixelRect::from_size(FrameSize::new(w, h).unwrap());
    let indices = (0..w * h).map(|i| (i % 256) as u8).collect();
    IndexedFrame::new(bounds, palette, indices).unwrap()
}

#[test]
fn crop_keeps_source_coordinates_and_pixels() {
    let img = gradient(8, 6);
    let rect = PixelRect::new(2, 1, 5, 4).unwrap();
    let cropped = img.crop(rect).unwrap();
    assert_eq!(cropped.bounds(), rect);
    assert_eq!(cropped.pixels().dimensions(), (3, 3));
    assert_eq!(cropped.pixels().get_pixel(0, 0).0, [20, 10, 0, 255]);
    assert_eq!(cropped.pixels().get_pixel(2, 2).0, [40, 30, 0, 255]);
}

#[test]
fn crop_of_crop_uses_absolute_coordinates() {
    let img = gradient(8, 6);
    let first = img.crop(PixelRect::new(2, 1, 7, 6).unwrap()).unwrap();
    let second = first.crop(PixelRect::new(3, 2, 4, 3).unwrap()).unwrap();
    assert_eq!(second.pixels().get_pixel(0, 0).0, [30, 20, 0, 255]);
}

#[test]
fn crop_outside_bounds_fails() {
    let img = gradient(8, 6);
    let err = img.crop(PixelRect::new(4, 4, 9, 6).unwrap()).unwrap_err();
    assert!(matches!(err, ZoomError::OutOfBounds { .. }));

    let indexed = indexed_ramp(4, 4);
    let err = indexed.crop(PixelRect::new(-1, 0, 2, 2).unwrap()).unwrap_err();
    assert!(matches!(err, ZoomError::OutOfBounds { .. }));
}

#[test]
fn crop_to_empty_rect_fails() {
    let img = gradient(8, 6);
    let err = img.crop(PixelRect::new(2, 2, 2, 4).unwrap()).unwrap_err();
    assert!(matches!(err, ZoomError::InvalidDimension(_)));
}

#[test]
fn indexed_crop_copies_rows() {
    let img = indexed_ramp(4, 3);
    let cropped = img.crop(PixelRect::new(1, 1, 3, 3).unwrap()).unwrap();
    assert_eq!(cropped.indices(), &[5, 6, 9, 10]);
    assert!(Arc::ptr_eq(cropped.palette(), img.palette()));
}

#[test]
fn nearest_upscale_duplicates_source_pixels() {
    let img = indexed_ramp(2, 2);
    let big = img.resize_nearest(FrameSize::new(4, 4).unwrap()).unwrap();
    assert_eq!(big.bounds(), PixelRect::new(0, 0, 4, 4).unwrap());
    assert_eq!(
        big.indices(),
        &[0, 0, 1, 1, 0, 0, 1, 1, 2, 2, 3, 3, 2, 2, 3, 3]
    );
}

#[test]
fn nearest_resize_of_crop_rebases_to_origin() {
    let img = gradient(8, 6);
    let cropped = img.crop(PixelRect::new(4, 3, 8, 6).unwrap()).unwrap();
    let out = cropped.resize_nearest(FrameSize::new(8, 6).unwrap()).unwrap();
    assert_eq!(out.bounds(), PixelRect::new(0, 0, 8, 6).unwrap());
    assert_eq!(out.pixels().get_pixel(0, 0).0, [40, 30, 0, 255]);
    assert_eq!(out.pixels().get_pixel(7, 5).0, [70, 50, 0, 255]);
}

#[test]
fn resize_to_zero_is_invalid() {
    let img = indexed_ramp(2, 2);
    assert!(img.resize_nearest(FrameSize { width: 0, height: 2 }).is_err());
}

#[test]
fn flatten_composites_over_background() {
    let img = RgbaFrame::from_image(image::RgbaImage::from_fn(2, 1, |x, _| {
        if x == 0 {
            image::Rgba([255, 255, 255, 0])
        } else {
            image::Rgba([200, 100, 0, 255])
        }
    }))
    .unwrap();
    let flat = img.flatten([10, 20, 30]);
    assert_eq!(flat.pixels().get_pixel(0, 0).0, [10, 20, 30, 255]);
    assert_eq!(flat.pixels().get_pixel(1, 0).0, [200, 100, 0, 255]);
}

#[test]
fn indexed_frame_validates_inputs() {
    let palette = Arc::new(Palette::new(vec![[0, 0, 0], [255, 255, 255]]).unwrap());
    let bounds = PixelRect::new(0, 0, 2, 1).unwrap();
    assert!(IndexedFrame::new(bounds, palette.clone(), vec![0]).is_err());
    assert!(IndexedFrame::new(bounds, palette.clone(), vec![0, 2]).is_err());
    let ok = IndexedFrame::new(bounds, palette, vec![0, 1]).unwrap();
    assert_eq!(ok.to_rgba().get_pixel(1, 0).0, [255, 255, 255, 255]);
}

#[test]
fn palette_limits_and_nearest() {
    assert!(Palette::new(vec![]).is_err());
    assert!(Palette::new(vec![[0, 0, 0]; 257]).is_err());
    let p = Palette::new(vec![[0, 0, 0], [250, 0, 0], [0, 0, 250]]).unwrap();
    assert_eq!(p.nearest([200.0, 10.0, 0.0]), 1);
    assert_eq!(p.nearest([10.0, 10.0, 10.0]), 0);
    assert_eq!(p.to_rgb_bytes(), vec![0, 0, 0, 250, 0, 0, 0, 0, 250]);
}

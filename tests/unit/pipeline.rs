use super::*;
use crate::ZoomError;
use crate::detect::{Candidate, FixedSubject};
use crate::encode::sink::InMemorySink;
use crate::render::raster::IndexedFrame;
use crate::schedule::SchedulerOpts;
use std::sync::Mutex;

fn rect(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> PixelRect {
    PixelRect::new(min_x, min_y, max_x, max_y).unwrap()
}

fn gradient(w: u32, h: u32) -> image::RgbaImage {
    image::RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x * 6) as u8, (y * 8) as u8, ((x + y) * 3) as u8, 255])
    })
}

fn config(steps: usize) -> ZoomConfig {
    ZoomConfig {
        zoom_steps: steps,
        palette_size: 32,
        threading: SchedulerOpts {
            threads: Some(2),
            timeout_ms: None,
        },
        ..ZoomConfig::default()
    }
}

struct NoSubject;

impl SubjectDetector for NoSubject {
    fn detect(&self, _image: &image::RgbaImage) -> ZoomResult<Vec<crate::detect::Candidate>> {
        Ok(Vec::new())
    }
}

struct Outside;

impl SubjectDetector for Outside {
    fn detect(&self, _image: &image::RgbaImage) -> ZoomResult<Vec<Candidate>> {
        Ok(vec![Candidate::new(rect(500, 500, 600, 600), 1.0)])
    }
}

/// Delegates to the default renderer and records every window it is handed.
struct Recording {
    inner: ZoomRenderer,
    targets: Mutex<Vec<PixelRect>>,
}

impl FrameRenderer for Recording {
    fn render(&self, source: &RenderSource, target: PixelRect) -> ZoomResult<IndexedFrame> {
        self.targets.lock().unwrap().push(target);
        self.inner.render(source, target)
    }
}

#[test]
fn run_builds_shared_peak_loop() {
    let pipeline = ZoomPipeline::new(config(4)).unwrap();
    let seq = pipeline.run(gradient(40, 30), rect(10, 10, 20, 20)).unwrap();

    assert_eq!(seq.len(), 9);
    assert_eq!(seq.loop_count(), 0);
    let frames = seq.frames();
    for k in 0..frames.len() / 2 {
        assert_eq!(frames[k].image.indices(), frames[frames.len() - 1 - k].image.indices());
    }
    assert!(frames.iter().all(|f| f.delay_ms == 50));
    assert!(frames.iter().all(|f| f.image.size() == frames[0].image.size()));
    assert_eq!(frames[0].image.size().width, 40);
}

#[test]
fn first_frame_is_the_still_frame() {
    let pipeline = ZoomPipeline::new(config(3)).unwrap();
    let zoomed = pipeline.run(gradient(40, 30), rect(5, 5, 25, 20)).unwrap();
    let still = pipeline.run_still(gradient(40, 30)).unwrap();
    assert_eq!(still.len(), 1);
    assert_eq!(zoomed.frames()[0].image.indices(), still.frames()[0].image.indices());
}

#[test]
fn renderer_only_sees_in_bounds_windows() {
    let recording = Recording {
        inner: ZoomRenderer::default(),
        targets: Mutex::new(Vec::new()),
    };
    let pipeline = ZoomPipeline::new(config(6)).unwrap().with_renderer(recording);
    pipeline.run(gradient(40, 30), rect(30, 2, 39, 6)).unwrap();

    let full = rect(0, 0, 40, 30);
    let targets = pipeline.renderer.targets.lock().unwrap().clone();
    assert_eq!(targets.len(), 6);
    assert!(targets.iter().all(|t| t.is_inside(full)), "{targets:?}");
}

#[test]
fn mirrored_layout_is_even() {
    let cfg = ZoomConfig {
        ping_pong: crate::animation::PingPong::Mirrored,
        ..config(3)
    };
    let seq = ZoomPipeline::new(cfg)
        .unwrap()
        .run(gradient(20, 20), rect(5, 5, 10, 10))
        .unwrap();
    assert_eq!(seq.len(), 8);
}

#[test]
fn detected_subject_drives_the_zoom() {
    let pipeline = ZoomPipeline::new(config(2)).unwrap();
    let detected = pipeline
        .run_detected(gradient(40, 30), &FixedSubject(rect(8, 6, 24, 18)))
        .unwrap();
    let direct = pipeline.run(gradient(40, 30), rect(8, 6, 24, 18)).unwrap();
    assert_eq!(detected.len(), direct.len());
    for (a, b) in detected.frames().iter().zip(direct.frames()) {
        assert_eq!(a.image.indices(), b.image.indices());
    }
}

#[test]
fn empty_detection_is_typed() {
    let pipeline = ZoomPipeline::new(config(2)).unwrap();
    let err = pipeline.run_detected(gradient(10, 10), &NoSubject).unwrap_err();
    assert!(matches!(err, ZoomError::DetectionEmpty));
    let err = pipeline.run_detected(gradient(10, 10), &Outside).unwrap_err();
    assert!(matches!(err, ZoomError::DetectionEmpty));
}

#[test]
fn subject_outside_image_is_out_of_bounds() {
    let pipeline = ZoomPipeline::new(config(2)).unwrap();
    let err = pipeline.run(gradient(10, 10), rect(5, 5, 15, 9)).unwrap_err();
    assert!(matches!(err, ZoomError::OutOfBounds { .. }));
}

#[test]
fn cancelled_token_stops_the_batch() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let pipeline = ZoomPipeline::new(config(3)).unwrap().with_cancel(cancel);
    let err = pipeline.run(gradient(20, 20), rect(5, 5, 10, 10)).unwrap_err();
    assert!(matches!(err, ZoomError::Cancelled));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let err = ZoomPipeline::new(config(0)).err().unwrap();
    assert!(matches!(err, ZoomError::Config(_)));
}

#[test]
fn write_streams_every_slot() {
    let pipeline = ZoomPipeline::new(config(2)).unwrap();
    let seq = pipeline.run(gradient(16, 16), rect(4, 4, 8, 8)).unwrap();
    let mut sink = InMemorySink::new();
    pipeline.write(&seq, &mut sink).unwrap();
    assert_eq!(sink.frames().len(), seq.len());
    assert!(sink.is_finished());
}

//! End-to-end generation: image + subject in, animation sequence out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::animation::{AnimationSequence, assemble_results};
use crate::config::ZoomConfig;
use crate::detect::{SubjectDetector, clip_candidates, select_subject};
use crate::encode::sink::{AnimationSink, write_sequence};
use crate::foundation::core::PixelRect;
use crate::foundation::error::ZoomResult;
use crate::geometry::lock_aspect;
use crate::render::raster::{Raster, RgbaFrame};
use crate::render::renderer::{FrameRenderer, RenderSource, ZoomRenderer};
use crate::schedule::{CancelToken, dispatch, plan_zoom_path, tasks_for_path};

/// Stage timings shorter than this are not logged.
const CHECKPOINT_MIN: Duration = Duration::from_millis(10);

/// One generation request's worth of wiring. Holds no state between runs.
pub struct ZoomPipeline<R: FrameRenderer + 'static = ZoomRenderer> {
    config: ZoomConfig,
    renderer: Arc<R>,
    cancel: CancelToken,
}

impl ZoomPipeline {
    /// Validate `config` and build a pipeline with the default renderer.
    pub fn new(config: ZoomConfig) -> ZoomResult<Self> {
        config.validate()?;
        Ok(Self {
            renderer: Arc::new(ZoomRenderer::new(config.resample)),
            config,
            cancel: CancelToken::new(),
        })
    }
}

impl<R: FrameRenderer + 'static> ZoomPipeline<R> {
    /// Replace the per-frame renderer.
    pub fn with_renderer<S: FrameRenderer + 'static>(self, renderer: S) -> ZoomPipeline<S> {
        ZoomPipeline {
            config: self.config,
            renderer: Arc::new(renderer),
            cancel: self.cancel,
        }
    }

    /// Observe `cancel` between render tasks.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Zoom from the full frame into `subject` and back out.
    #[tracing::instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn run(&self, image: image::RgbaImage, subject: PixelRect) -> ZoomResult<AnimationSequence> {
        let mut clock = Checkpoints::start();
        let source = self.prepare(image)?;
        clock.mark("quantize");
        self.zoom(source, subject, &mut clock)
    }

    /// Ask `detector` for the subject, then [`Self::run`].
    ///
    /// Fails with [`crate::ZoomError::DetectionEmpty`] when no candidate survives clipping
    /// to the image bounds; callers typically fall back to [`Self::run_still`].
    #[tracing::instrument(skip(self, image, detector), fields(width = image.width(), height = image.height()))]
    pub fn run_detected(
        &self,
        image: image::RgbaImage,
        detector: &dyn SubjectDetector,
    ) -> ZoomResult<AnimationSequence> {
        let mut clock = Checkpoints::start();
        let rgba = RgbaFrame::from_image(image)?;
        let candidates = detector.detect(rgba.pixels())?;
        let found = candidates.len();
        let subject = select_subject(&clip_candidates(candidates, rgba.bounds()))?;
        tracing::debug!(found, subject = %subject, "selected subject");
        clock.mark("detect");

        let source = self.prepare_frame(rgba)?;
        clock.mark("quantize");
        self.zoom(source, subject, &mut clock)
    }

    /// Full-frame-only animation: one quantized frame, no zoom.
    #[tracing::instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn run_still(&self, image: image::RgbaImage) -> ZoomResult<AnimationSequence> {
        let mut clock = Checkpoints::start();
        let source = self.prepare(image)?;
        clock.mark("quantize");
        Ok(AnimationSequence::still(
            source.quantized,
            self.config.delay_ms,
            self.config.loop_count,
        ))
    }

    /// Stream `seq` into `sink`, timing the encode stage.
    pub fn write(&self, seq: &AnimationSequence, sink: &mut dyn AnimationSink) -> ZoomResult<()> {
        let mut clock = Checkpoints::start();
        write_sequence(seq, sink)?;
        clock.mark("encode");
        Ok(())
    }

    fn prepare(&self, image: image::RgbaImage) -> ZoomResult<RenderSource> {
        self.prepare_frame(RgbaFrame::from_image(image)?)
    }

    fn prepare_frame(&self, rgba: RgbaFrame) -> ZoomResult<RenderSource> {
        let flat = rgba.flatten(self.config.background);
        RenderSource::prepare(flat, self.config.palette_size, self.config.dither)
    }

    fn zoom(
        &self,
        source: RenderSource,
        subject: PixelRect,
        clock: &mut Checkpoints,
    ) -> ZoomResult<AnimationSequence> {
        let cfg = &self.config;
        let full = source.bounds();
        let locked = lock_aspect(full, subject)?;
        let path = plan_zoom_path(full, locked, cfg.zoom_steps)?;
        tracing::debug!(full = %full, subject = %subject, locked = %locked, "zoom target locked");

        let full_frame = source.quantized.clone();
        let renderer: Arc<dyn FrameRenderer> = self.renderer.clone();
        let tasks = tasks_for_path(&path, cfg.ping_pong);
        let results = dispatch(
            Arc::new(source),
            &tasks,
            renderer,
            &cfg.threading,
            &self.cancel,
        )?;
        clock.mark("render");

        assemble_results(
            full_frame,
            results,
            cfg.delay_ms,
            cfg.loop_count,
            cfg.ping_pong,
        )
    }
}

struct Checkpoints {
    last: Instant,
}

impl Checkpoints {
    fn start() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    fn mark(&mut self, stage: &'static str) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        if elapsed >= CHECKPOINT_MIN {
            tracing::debug!(stage, elapsed_ms = elapsed.as_millis() as u64, "checkpoint");
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;

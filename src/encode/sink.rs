use std::sync::Arc;

use crate::animation::AnimationSequence;
use crate::foundation::error::{ZoomError, ZoomResult};
use crate::render::raster::{IndexedFrame, Palette, Raster};

/// Configuration provided to an [`AnimationSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Number of frames that will be pushed.
    pub frame_count: usize,
    /// Repeat count; `0` loops forever.
    pub loop_count: u16,
    /// Palette shared by every frame, when there is one.
    pub global_palette: Option<Arc<Palette>>,
}

/// Sink contract for consuming animation frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing slot order.
pub trait AnimationSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ZoomResult<()>;
    /// Push one frame with its display delay.
    fn push_frame(&mut self, slot: usize, frame: &IndexedFrame, delay_ms: u32) -> ZoomResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> ZoomResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(usize, IndexedFrame, u32)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured `(slot, frame, delay_ms)` triples in push order.
    pub fn frames(&self) -> &[(usize, IndexedFrame, u32)] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl AnimationSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ZoomResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, slot: usize, frame: &IndexedFrame, delay_ms: u32) -> ZoomResult<()> {
        self.frames.push((slot, frame.clone(), delay_ms));
        Ok(())
    }

    fn end(&mut self) -> ZoomResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Stream `seq` into `sink`: one `begin`, every slot in order, one `end`.
///
/// The sink gets a global palette when all frames share one.
#[tracing::instrument(skip_all, fields(frames = seq.len()))]
pub fn write_sequence(seq: &AnimationSequence, sink: &mut dyn AnimationSink) -> ZoomResult<()> {
    let size = seq
        .size()
        .ok_or_else(|| ZoomError::encode("cannot encode an empty animation"))?;
    let cfg = SinkConfig {
        width: size.width,
        height: size.height,
        frame_count: seq.len(),
        loop_count: seq.loop_count(),
        global_palette: shared_palette(seq),
    };

    sink.begin(cfg)?;
    for (slot, frame) in seq.frames().iter().enumerate() {
        sink.push_frame(slot, &frame.image, frame.delay_ms)?;
    }
    sink.end()
}

fn shared_palette(seq: &AnimationSequence) -> Option<Arc<Palette>> {
    let mut frames = seq.frames().iter();
    let first = frames.next()?.image.palette();
    frames
        .all(|f| Arc::ptr_eq(f.image.palette(), first) || f.image.palette() == first)
        .then(|| first.clone())
}

/// Check a pushed frame against the sink configuration.
pub(crate) fn check_frame(cfg: &SinkConfig, frame: &IndexedFrame) -> ZoomResult<()> {
    let size = frame.size();
    if size.width != cfg.width || size.height != cfg.height {
        return Err(ZoomError::encode(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            size.width, size.height, cfg.width, cfg.height
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;

//! Ping-pong animation assembly.

use std::sync::Arc;

use smallvec::{SmallVec, smallvec};

use crate::foundation::core::FrameSize;
use crate::foundation::error::{ZoomError, ZoomResult};
use crate::render::raster::{IndexedFrame, Raster};
use crate::schedule::FrameResult;

/// Layout of the zoom-in/zoom-out loop for `n` zoom frames `z0..z(n-1)` and full frame `f`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PingPong {
    /// `[f, z0..z(n-1), z(n-2)..z0, f]`: the deepest frame appears once (odd length).
    #[default]
    SharedPeak,
    /// `[f, z0..z(n-1), z(n-1)..z0, f]`: every frame mirrored, deepest frame held twice
    /// (even length).
    Mirrored,
}

impl PingPong {
    /// Total slots for `n` zoom frames.
    pub fn len(self, n: usize) -> usize {
        match self {
            Self::SharedPeak => 2 * n + 1,
            Self::Mirrored => 2 * n + 2,
        }
    }

    /// Slots holding the untouched full frame.
    pub fn full_slots(self, n: usize) -> SmallVec<[usize; 2]> {
        let last = self.len(n) - 1;
        if last == 0 { smallvec![0] } else { smallvec![0, last] }
    }

    /// Forward and mirrored slots of zoom frame `i`; one slot when they coincide.
    pub fn zoom_slots(self, i: usize, n: usize) -> SmallVec<[usize; 2]> {
        let forward = i + 1;
        let mirrored = self.len(n) - 1 - forward;
        if forward == mirrored {
            smallvec![forward]
        } else {
            smallvec![forward, mirrored]
        }
    }
}

/// One displayed frame.
#[derive(Clone, Debug)]
pub struct AnimationFrame {
    /// Shared with the mirrored slot when both show the same render.
    pub image: Arc<IndexedFrame>,
    pub delay_ms: u32,
}

/// Ordered frames plus a loop count; `loop_count == 0` means loop forever.
#[derive(Clone, Debug)]
pub struct AnimationSequence {
    frames: Vec<AnimationFrame>,
    loop_count: u16,
}

impl AnimationSequence {
    /// A full-frame-only animation, for callers with no usable subject.
    pub fn still(full: Arc<IndexedFrame>, delay_ms: u32, loop_count: u16) -> Self {
        Self {
            frames: vec![AnimationFrame {
                image: full,
                delay_ms,
            }],
            loop_count,
        }
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    pub fn size(&self) -> Option<FrameSize> {
        self.frames.first().map(|f| f.image.size())
    }

    /// Override the delay of a single slot.
    pub fn set_delay(&mut self, slot: usize, delay_ms: u32) -> ZoomResult<()> {
        let len = self.frames.len();
        let frame = self.frames.get_mut(slot).ok_or_else(|| {
            ZoomError::invalid_dimension(format!("slot {slot} out of range for {len} frames"))
        })?;
        frame.delay_ms = delay_ms;
        Ok(())
    }
}

/// Build the ping-pong loop from the quantized full frame and the zoom frames in path order.
pub fn assemble(
    full: Arc<IndexedFrame>,
    zoom_frames: &[Arc<IndexedFrame>],
    delay_ms: u32,
    loop_count: u16,
    layout: PingPong,
) -> ZoomResult<AnimationSequence> {
    let n = zoom_frames.len();
    let placed = zoom_frames
        .iter()
        .enumerate()
        .map(|(i, image)| (layout.zoom_slots(i, n), image.clone()));
    fill_slots(full, n, placed, delay_ms, loop_count, layout)
}

/// Build the loop directly from scheduler results, trusting the slots each result carries.
pub fn assemble_results(
    full: Arc<IndexedFrame>,
    results: Vec<FrameResult>,
    delay_ms: u32,
    loop_count: u16,
    layout: PingPong,
) -> ZoomResult<AnimationSequence> {
    let n = results.len();
    let placed = results.into_iter().map(|r| (r.slots, r.image));
    fill_slots(full, n, placed, delay_ms, loop_count, layout)
}

fn fill_slots(
    full: Arc<IndexedFrame>,
    n: usize,
    placed: impl Iterator<Item = (SmallVec<[usize; 2]>, Arc<IndexedFrame>)>,
    delay_ms: u32,
    loop_count: u16,
    layout: PingPong,
) -> ZoomResult<AnimationSequence> {
    let len = layout.len(n);
    let size = full.size();
    let mut slots: Vec<Option<Arc<IndexedFrame>>> = vec![None; len];
    for slot in layout.full_slots(n) {
        slots[slot] = Some(full.clone());
    }
    for (targets, image) in placed {
        if image.size() != size {
            return Err(ZoomError::invalid_dimension(format!(
                "zoom frame is {}x{}, expected {}x{}",
                image.size().width,
                image.size().height,
                size.width,
                size.height
            )));
        }
        for slot in targets {
            let cell = slots.get_mut(slot).ok_or_else(|| {
                ZoomError::invalid_dimension(format!("slot {slot} out of range for {len} frames"))
            })?;
            *cell = Some(image.clone());
        }
    }

    let frames = slots
        .into_iter()
        .enumerate()
        .map(|(slot, image)| {
            image
                .map(|image| AnimationFrame { image, delay_ms })
                .ok_or_else(|| {
                    ZoomError::Other(anyhow::anyhow!("internal error: slot {slot} left empty"))
                })
        })
        .collect::<ZoomResult<Vec<_>>>()?;
    Ok(AnimationSequence { frames, loop_count })
}

#[cfg(test)]
#[path = "../tests/unit/animation.rs"]
mod tests;

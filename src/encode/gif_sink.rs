use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use gif::{Encoder, Frame, Repeat};

use crate::animation::AnimationSequence;
use crate::encode::sink::{AnimationSink, SinkConfig, check_frame, write_sequence};
use crate::foundation::error::{ZoomError, ZoomResult};
use crate::render::raster::{IndexedFrame, Palette};

/// Convert a millisecond delay to GIF centiseconds.
///
/// Rounds to the nearest centisecond; a non-zero delay never collapses to zero.
pub fn delay_centiseconds(delay_ms: u32) -> u16 {
    if delay_ms == 0 {
        return 0;
    }
    let cs = (u64::from(delay_ms) + 5) / 10;
    cs.clamp(1, u64::from(u16::MAX)) as u16
}

/// Sink writing an animated GIF into `W`.
///
/// Frames sharing the sequence palette reference the global colour table; any other frame
/// carries a local table.
pub struct GifSink<W: Write> {
    writer: Option<W>,
    encoder: Option<Encoder<W>>,
    cfg: Option<SinkConfig>,
    last_slot: Option<usize>,
}

impl<W: Write> GifSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            encoder: None,
            cfg: None,
            last_slot: None,
        }
    }

    /// Return the underlying writer after `end`; `None` while encoding is still in progress.
    pub fn into_inner(self) -> Option<W> {
        self.writer
    }

    fn global_palette(&self) -> Option<&Arc<Palette>> {
        self.cfg.as_ref().and_then(|c| c.global_palette.as_ref())
    }
}

impl<W: Write> AnimationSink for GifSink<W> {
    fn begin(&mut self, cfg: SinkConfig) -> ZoomResult<()> {
        let (width, height) = gif_dimensions(cfg.width, cfg.height)?;
        let writer = self
            .writer
            .take()
            .ok_or_else(|| ZoomError::encode("gif sink already started"))?;

        let global = cfg
            .global_palette
            .as_ref()
            .map(|p| p.to_rgb_bytes())
            .unwrap_or_default();
        let mut encoder = Encoder::new(writer, width, height, &global)
            .map_err(|e| ZoomError::encode(format!("failed to start gif stream: {e}")))?;

        let repeat = if cfg.loop_count == 0 {
            Repeat::Infinite
        } else {
            Repeat::Finite(cfg.loop_count)
        };
        encoder
            .set_repeat(repeat)
            .map_err(|e| ZoomError::encode(format!("failed to write loop extension: {e}")))?;

        tracing::debug!(
            width,
            height,
            frames = cfg.frame_count,
            loop_count = cfg.loop_count,
            global_palette = !global.is_empty(),
            "gif stream started"
        );
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.last_slot = None;
        Ok(())
    }

    fn push_frame(&mut self, slot: usize, frame: &IndexedFrame, delay_ms: u32) -> ZoomResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ZoomError::encode("gif sink not started"))?;
        if let Some(last) = self.last_slot
            && slot <= last
        {
            return Err(ZoomError::encode(format!(
                "gif sink received out-of-order slot {slot} after {last}"
            )));
        }
        check_frame(cfg, frame)?;
        let (width, height) = gif_dimensions(cfg.width, cfg.height)?;

        let local = match self.global_palette() {
            Some(global) if global == frame.palette() => None,
            _ => Some(frame.palette().to_rgb_bytes()),
        };
        let gif_frame = Frame {
            width,
            height,
            delay: delay_centiseconds(delay_ms),
            palette: local,
            buffer: Cow::Borrowed(frame.indices()),
            ..Default::default()
        };

        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| ZoomError::encode("gif sink is already finalized"))?;
        encoder
            .write_frame(&gif_frame)
            .map_err(|e| ZoomError::encode(format!("failed to write gif frame {slot}: {e}")))?;
        self.last_slot = Some(slot);
        Ok(())
    }

    fn end(&mut self) -> ZoomResult<()> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| ZoomError::encode("gif sink not started"))?;
        let writer = encoder
            .into_inner()
            .map_err(|e| ZoomError::encode(format!("failed to finish gif stream: {e}")))?;
        self.writer = Some(writer);
        self.cfg = None;
        Ok(())
    }
}

/// Encode `seq` as an in-memory GIF byte stream.
pub fn encode_gif(seq: &AnimationSequence) -> ZoomResult<Vec<u8>> {
    let mut sink = GifSink::new(Vec::new());
    write_sequence(seq, &mut sink)?;
    sink.into_inner()
        .ok_or_else(|| ZoomError::encode("gif stream was not finalized"))
}

/// Encode `seq` into a GIF file at `path`, creating parent directories as needed.
pub fn write_gif_file(seq: &AnimationSequence, path: impl AsRef<Path>) -> ZoomResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            ZoomError::encode(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    let file = File::create(path).map_err(|e| {
        ZoomError::encode(format!("failed to create '{}': {e}", path.display()))
    })?;

    let mut sink = GifSink::new(BufWriter::new(file));
    write_sequence(seq, &mut sink)?;
    let mut writer = sink
        .into_inner()
        .ok_or_else(|| ZoomError::encode("gif stream was not finalized"))?;
    writer
        .flush()
        .map_err(|e| ZoomError::encode(format!("failed to flush '{}': {e}", path.display())))
}

fn gif_dimensions(width: u32, height: u32) -> ZoomResult<(u16, u16)> {
    let w = u16::try_from(width).ok().filter(|w| *w > 0);
    let h = u16::try_from(height).ok().filter(|h| *h > 0);
    match (w, h) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(ZoomError::encode(format!(
            "gif dimensions must be within 1..=65535, got {width}x{height}"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif_sink.rs"]
mod tests;

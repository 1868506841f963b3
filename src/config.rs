use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::animation::PingPong;
use crate::foundation::error::{ZoomError, ZoomResult};
use crate::render::renderer::ResampleMode;
use crate::schedule::SchedulerOpts;

/// Everything one generation request needs; passed explicitly into [`crate::ZoomPipeline`].
///
/// Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoomConfig {
    /// Number of intermediate windows between the full frame and the subject.
    pub zoom_steps: usize,
    /// Delay applied to every frame, in milliseconds.
    pub delay_ms: u32,
    /// Animation repeat count; `0` loops forever.
    pub loop_count: u16,
    /// Palette size, `2..=256`.
    pub palette_size: usize,
    /// Error-diffusion dithering during quantization.
    pub dither: bool,
    pub resample: ResampleMode,
    pub ping_pong: PingPong,
    /// Opaque colour translucent source pixels are flattened over.
    pub background: [u8; 3],
    pub threading: SchedulerOpts,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            zoom_steps: 9,
            delay_ms: 50,
            loop_count: 0,
            palette_size: 256,
            dither: true,
            resample: ResampleMode::Nearest,
            ping_pong: PingPong::SharedPeak,
            background: [0, 0, 0],
            threading: SchedulerOpts::default(),
        }
    }
}

impl ZoomConfig {
    pub fn from_reader<R: std::io::Read>(r: R) -> ZoomResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| ZoomError::config(format!("parse zoom config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> ZoomResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> ZoomResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ZoomError::config(format!("open zoom config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> ZoomResult<()> {
        if self.zoom_steps == 0 {
            return Err(ZoomError::config("'zoom_steps' must be >= 1"));
        }
        if !(2..=256).contains(&self.palette_size) {
            return Err(ZoomError::config(format!(
                "'palette_size' must be within 2..=256, got {}",
                self.palette_size
            )));
        }
        self.threading.validate()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;

//! Per-frame rendering: crop, resample and palette quantization.

pub mod quantize;
pub mod raster;
pub mod renderer;

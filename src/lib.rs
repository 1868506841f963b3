//! Okzoomer turns a still image into a looping zoom animation centred on a subject.
//!
//! The pipeline runs leaves first:
//!
//! - [`lock_aspect`] grows the subject rectangle to the frame's aspect ratio
//! - [`plan_zoom_path`] interpolates windows from the full frame to the subject, and
//!   [`dispatch`] renders them in parallel through a [`FrameRenderer`]
//! - [`assemble`] lays the frames out as a ping-pong [`AnimationSequence`]
//! - an [`AnimationSink`] such as [`GifSink`] encodes the result
//!
//! [`ZoomPipeline`] wires the stages together from an explicit [`ZoomConfig`].
#![forbid(unsafe_code)]

mod foundation;

pub mod animation;
pub mod config;
pub mod detect;
/// Output container sinks.
pub mod encode;
pub mod geometry;
pub mod pipeline;
/// Crop, resample and quantize.
pub mod render;
pub mod schedule;

pub use crate::foundation::core::{FrameSize, PixelRect};
pub use crate::foundation::error::{ZoomError, ZoomResult};

pub use crate::animation::{AnimationFrame, AnimationSequence, PingPong, assemble};
pub use crate::config::ZoomConfig;
pub use crate::detect::{Candidate, FixedSubject, SubjectDetector, select_subject};
pub use crate::encode::gif_sink::{GifSink, encode_gif, write_gif_file};
pub use crate::encode::sink::{AnimationSink, InMemorySink, SinkConfig, write_sequence};
pub use crate::geometry::{lock_aspect, lock_aspect_or_full};
pub use crate::pipeline::ZoomPipeline;
pub use crate::render::raster::{IndexedFrame, Palette, Raster, RgbaFrame};
pub use crate::render::renderer::{FrameRenderer, RenderSource, ResampleMode, ZoomRenderer};
pub use crate::schedule::{
    CancelToken, FrameResult, FrameTask, SchedulerOpts, dispatch, plan_zoom_path, render_all,
};

//! Encoding sinks.
//!
//! Sinks consume an assembled [`crate::AnimationSequence`] in slot order.

/// Animated GIF output via the `gif` crate.
pub mod gif_sink;
/// Generic sink trait and the in-memory sink.
pub mod sink;

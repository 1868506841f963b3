use crate::foundation::core::PixelRect;

/// Convenience result type used across okzoomer.
pub type ZoomResult<T> = Result<T, ZoomError>;

/// Error taxonomy for every pipeline stage.
#[derive(thiserror::Error, Debug)]
pub enum ZoomError {
    /// A rectangle is not contained in the bound it must stay inside.
    #[error("out of bounds: {rect} is not contained in {bounds}")]
    OutOfBounds { rect: PixelRect, bounds: PixelRect },

    /// Zero or negative width/height, a zero step count, or a malformed buffer.
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    /// A worker failed; the whole batch is discarded.
    ///
    /// `index` is the lowest failing frame and `failed` counts every failed task.
    #[error("render failure: frame #{index} failed ({failed} task(s) failed in batch): {source}")]
    RenderFailure {
        index: usize,
        failed: usize,
        #[source]
        source: Box<ZoomError>,
    },

    /// The subject detector produced no usable candidate.
    #[error("detection empty: the subject detector returned no candidates")]
    DetectionEmpty,

    /// The caller's [`crate::CancelToken`] fired before the batch finished.
    #[error("render batch cancelled")]
    Cancelled,

    /// The batch deadline passed before every frame was collected.
    #[error("render batch timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Invalid configuration values or an unreadable config file.
    #[error("config error: {0}")]
    Config(String),

    /// Output container failures, including I/O on the destination.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or internal invariants.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ZoomError {
    /// Build a [`ZoomError::OutOfBounds`] value.
    pub fn out_of_bounds(rect: PixelRect, bounds: PixelRect) -> Self {
        Self::OutOfBounds { rect, bounds }
    }

    /// Build a [`ZoomError::InvalidDimension`] value.
    pub fn invalid_dimension(msg: impl Into<String>) -> Self {
        Self::InvalidDimension(msg.into())
    }

    /// Build a [`ZoomError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`ZoomError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Errors that stem from caller-supplied data; retrying with the same input cannot succeed.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::InvalidDimension(_) | Self::Config(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

//! Subject-detector boundary and candidate selection.

use crate::foundation::core::PixelRect;
use crate::foundation::error::{ZoomError, ZoomResult};

/// One detection: a bounding box and the detector's confidence.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candidate {
    pub rect: PixelRect,
    pub score: f32,
}

impl Candidate {
    pub fn new(rect: PixelRect, score: f32) -> Self {
        Self { rect, score }
    }

    /// Square detection centred on `(col, row)` with side `scale`, as cascade detectors report.
    pub fn from_center(col: i32, row: i32, scale: i32, score: f32) -> ZoomResult<Self> {
        if scale <= 0 {
            return Err(ZoomError::invalid_dimension(format!(
                "detection scale must be > 0, got {scale}"
            )));
        }
        let half = scale / 2;
        let rect = PixelRect::new(col - half, row - half, col + half, row + half)?;
        Ok(Self { rect, score })
    }

    /// Selection weight: confidence times area.
    pub fn weight(&self) -> f64 {
        f64::from(self.score) * self.rect.area() as f64
    }
}

/// External detector that proposes subject rectangles for a decoded image.
pub trait SubjectDetector {
    fn detect(&self, image: &image::RgbaImage) -> ZoomResult<Vec<Candidate>>;
}

/// Detector that always reports a caller-supplied rectangle.
#[derive(Clone, Copy, Debug)]
pub struct FixedSubject(pub PixelRect);

impl SubjectDetector for FixedSubject {
    fn detect(&self, _image: &image::RgbaImage) -> ZoomResult<Vec<Candidate>> {
        Ok(vec![Candidate::new(self.0, 1.0)])
    }
}

/// Pick the candidate with the largest `score * area`.
///
/// Ties keep the candidate that came first in detector order. Candidates with a non-finite
/// score are ignored. A list with nothing usable is [`ZoomError::DetectionEmpty`].
pub fn select_subject(candidates: &[Candidate]) -> ZoomResult<PixelRect> {
    let mut best: Option<&Candidate> = None;
    for c in candidates {
        tracing::debug!(rect = %c.rect, score = c.score, weight = c.weight(), "subject candidate");
        if !c.score.is_finite() {
            tracing::warn!(rect = %c.rect, score = c.score, "ignoring candidate with non-finite score");
            continue;
        }
        if best.is_none_or(|b| c.weight() > b.weight()) {
            best = Some(c);
        }
    }
    best.map(|c| c.rect).ok_or(ZoomError::DetectionEmpty)
}

/// Clip candidates to `bounds`, dropping those that fall entirely outside.
pub fn clip_candidates(candidates: Vec<Candidate>, bounds: PixelRect) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter_map(|c| {
            c.rect
                .intersect(bounds)
                .map(|rect| Candidate { rect, ..c })
        })
        .collect()
}

#[cfg(test)]
#[path = "../tests/unit/detect.rs"]
mod tests;

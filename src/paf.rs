// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Line-integral scoring of candidate limbs over a part affinity field.

use ndarray::ArrayView2;

use crate::config::ParseConfig;
use crate::peaks::Peak;

/// Segments shorter than this (in map cells) are treated as self-loops.
pub const MIN_SEGMENT_LENGTH: f32 = 1e-3;

/// Outcome of scoring one candidate peak pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkScore {
    /// Mean projection of the field onto the segment direction, in `[-1, 1]`.
    Score(f32),
    /// Endpoints coincide.
    Degenerate,
    /// A sample's field vector strays too far from the segment direction.
    OffSegment,
}

impl LinkScore {
    /// Numeric score, with rejections reported as zero.
    #[must_use]
    pub const fn value(self) -> f32 {
        match self {
            Self::Score(s) => s,
            Self::Degenerate | Self::OffSegment => 0.0,
        }
    }
}

/// Bilinear sample of `channel` at map coordinate `(x, y)`.
///
/// Coordinates are clamped to the map; an empty map samples as zero.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bilinear(channel: ArrayView2<'_, f32>, x: f32, y: f32) -> f32 {
    let (height, width) = channel.dim();
    if height == 0 || width == 0 {
        return 0.0;
    }

    let x = x.clamp(0.0, (width - 1) as f32);
    let y = y.clamp(0.0, (height - 1) as f32);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let top = channel[[y0, x0]].mul_add(1.0 - fx, channel[[y0, x1]] * fx);
    let bottom = channel[[y1, x0]].mul_add(1.0 - fx, channel[[y1, x1]] * fx);
    top.mul_add(1.0 - fy, bottom * fy)
}

/// Scores candidate limbs by integrating a two-channel vector field along
/// the segment joining two peaks.
#[derive(Debug, Clone, Copy)]
pub struct LineIntegral {
    samples: usize,
    perpendicular_tolerance: f32,
    link_threshold: f32,
}

impl LineIntegral {
    /// Create a scorer.
    ///
    /// # Arguments
    ///
    /// * `samples` - Number of equally spaced samples, endpoints included.
    /// * `perpendicular_tolerance` - Largest allowed off-segment field component.
    /// * `link_threshold` - Minimum score for a pair to be eligible.
    #[must_use]
    pub const fn new(samples: usize, perpendicular_tolerance: f32, link_threshold: f32) -> Self {
        Self {
            samples,
            perpendicular_tolerance,
            link_threshold,
        }
    }

    /// Create a scorer from the link settings of a parser configuration.
    #[must_use]
    pub const fn from_config(config: &ParseConfig) -> Self {
        Self::new(
            config.line_integral_samples,
            config.perpendicular_tolerance,
            config.link_threshold,
        )
    }

    /// Score the segment from `source` to `target` against field channels
    /// `field_x` and `field_y`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(
        &self,
        field_x: ArrayView2<'_, f32>,
        field_y: ArrayView2<'_, f32>,
        source: &Peak,
        target: &Peak,
    ) -> LinkScore {
        let dx = target.x - source.x;
        let dy = target.y - source.y;
        let length = dx.hypot(dy);
        if length.is_nan() || length < MIN_SEGMENT_LENGTH {
            return LinkScore::Degenerate;
        }
        let (ux, uy) = (dx / length, dy / length);

        let n = self.samples.max(1);
        let mut total = 0.0f32;
        for k in 0..n {
            let t = if n == 1 {
                0.5
            } else {
                k as f32 / (n - 1) as f32
            };
            let px = dx.mul_add(t, source.x);
            let py = dy.mul_add(t, source.y);
            let fx = bilinear(field_x, px, py);
            let fy = bilinear(field_y, px, py);

            let along = fx.mul_add(ux, fy * uy);
            let perpendicular = fx.mul_add(uy, -(fy * ux)).abs();
            if perpendicular > self.perpendicular_tolerance {
                return LinkScore::OffSegment;
            }
            total += along;
        }

        LinkScore::Score((total / n as f32).clamp(-1.0, 1.0))
    }

    /// Whether a score makes the pair eligible for matching.
    #[must_use]
    pub fn is_eligible(&self, score: LinkScore) -> bool {
        match score {
            LinkScore::Score(s) => s >= self.link_threshold,
            LinkScore::Degenerate | LinkScore::OffSegment => false,
        }
    }
}

// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Peak extraction from confidence maps.
//!
//! Each confidence map channel is scanned for local maxima with a square
//! non-maximum-suppression window. Accepted maxima are refined to sub-pixel
//! precision with a weighted centroid over the same window, which recovers
//! some of the precision lost to the network's output stride.

use ndarray::{ArrayView2, ArrayView3, Axis};
use serde::Serialize;

use crate::config::ParseConfig;

/// Stable identity of a peak within one parse call.
///
/// `index` is the rank of the peak in its part's list, which is sorted by
/// descending confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PeakId {
    /// Part type the peak was detected for.
    pub part: usize,
    /// Position in the part's sorted peak list.
    pub index: usize,
}

/// A candidate location for one part type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    /// Identity used as the matching key.
    pub id: PeakId,
    /// Refined column in confidence map cells.
    pub x: f32,
    /// Refined row in confidence map cells.
    pub y: f32,
    /// Confidence map value at the maximum cell.
    pub confidence: f32,
}

/// Finds and refines local maxima in confidence map channels.
#[derive(Debug, Clone, Copy)]
pub struct PeakExtractor {
    threshold: f32,
    max_peaks: usize,
    radius: usize,
}

impl PeakExtractor {
    /// Create an extractor.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Minimum value for a peak.
    /// * `max_peaks` - Number of peaks kept per channel.
    /// * `radius` - Suppression and refinement window radius.
    #[must_use]
    pub const fn new(threshold: f32, max_peaks: usize, radius: usize) -> Self {
        Self {
            threshold,
            max_peaks,
            radius,
        }
    }

    /// Create an extractor from the peak settings of a parser configuration.
    #[must_use]
    pub const fn from_config(config: &ParseConfig) -> Self {
        Self::new(
            config.cmap_threshold,
            config.max_peaks_per_part,
            config.window_radius,
        )
    }

    /// Extract peaks for every channel of a `(parts, height, width)` map.
    #[must_use]
    pub fn extract(&self, cmap: ArrayView3<'_, f32>) -> Vec<Vec<Peak>> {
        cmap.axis_iter(Axis(0))
            .enumerate()
            .map(|(part, channel)| self.find_peaks(part, channel))
            .collect()
    }

    /// Extract peaks from a single channel.
    ///
    /// Peaks are ordered by descending confidence with ties in raster order,
    /// and truncated to the configured maximum.
    #[must_use]
    pub fn find_peaks(&self, part: usize, channel: ArrayView2<'_, f32>) -> Vec<Peak> {
        let (height, width) = channel.dim();
        let mut maxima: Vec<(usize, usize, f32)> = Vec::new();

        for row in 0..height {
            for col in 0..width {
                let value = channel[[row, col]];
                if value.is_nan() || value < self.threshold {
                    continue;
                }
                if self.is_local_max(channel, row, col, value) {
                    maxima.push((row, col, value));
                }
            }
        }

        // Stable sort keeps raster order among equal values
        maxima.sort_by(|a, b| b.2.total_cmp(&a.2));
        maxima.truncate(self.max_peaks);

        maxima
            .into_iter()
            .enumerate()
            .map(|(index, (row, col, confidence))| {
                let (x, y) = self.refine(channel, row, col);
                Peak {
                    id: PeakId { part, index },
                    x,
                    y,
                    confidence,
                }
            })
            .collect()
    }

    fn window(&self, center: usize, len: usize) -> std::ops::RangeInclusive<usize> {
        center.saturating_sub(self.radius)..=center.saturating_add(self.radius).min(len - 1)
    }

    fn is_local_max(
        &self,
        channel: ArrayView2<'_, f32>,
        row: usize,
        col: usize,
        value: f32,
    ) -> bool {
        let (height, width) = channel.dim();
        for r in self.window(row, height) {
            for c in self.window(col, width) {
                if channel[[r, c]] > value {
                    return false;
                }
            }
        }
        true
    }

    /// Weighted centroid of the clipped window around `(row, col)`.
    #[allow(clippy::cast_precision_loss)]
    fn refine(&self, channel: ArrayView2<'_, f32>, row: usize, col: usize) -> (f32, f32) {
        let (height, width) = channel.dim();
        let mut total = 0.0f32;
        let mut sum_x = 0.0f32;
        let mut sum_y = 0.0f32;

        for r in self.window(row, height) {
            for c in self.window(col, width) {
                let w = channel[[r, c]].max(0.0);
                total += w;
                sum_x += w * c as f32;
                sum_y += w * r as f32;
            }
        }

        if total > 0.0 && total.is_finite() {
            (sum_x / total, sum_y / total)
        } else {
            (col as f32, row as f32)
        }
    }
}

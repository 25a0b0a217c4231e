// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Result types for pose parsing.
//!
//! A [`ParseResult`] holds the assembled [`Skeleton`]s of one image together
//! with the intermediate peaks and connections, counters and stage timings.

use ndarray::{Array3, Axis};
use serde::Serialize;

use crate::error::{PoseError, Result};
use crate::matching::Connection;
use crate::peaks::{Peak, PeakId};

/// Factor mapping confidence map cells to source image pixels.
///
/// This is the network's output stride. A map cell `(col, row)` maps to the
/// image pixel `((col + 0.5) * x, (row + 0.5) * y)`, the centre of the
/// image patch the cell covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scale {
    /// Horizontal factor.
    pub x: f32,
    /// Vertical factor.
    pub y: f32,
}

impl Scale {
    /// Create a scale with separate horizontal and vertical factors.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ConfigError`] unless both factors are finite and
    /// positive.
    pub fn new(x: f32, y: f32) -> Result<Self> {
        for (axis, value) in [("x", x), ("y", y)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PoseError::ConfigError(format!(
                    "scale {axis} must be finite and positive (got {value})"
                )));
            }
        }
        Ok(Self { x, y })
    }

    /// Create a scale with the same factor on both axes.
    ///
    /// # Errors
    ///
    /// Same as [`Scale::new`].
    pub fn uniform(factor: f32) -> Result<Self> {
        Self::new(factor, factor)
    }

    /// Map a peak position to image pixels.
    #[must_use]
    pub fn apply(&self, map_x: f32, map_y: f32) -> (f32, f32) {
        ((map_x + 0.5) * self.x, (map_y + 0.5) * self.y)
    }
}

/// A part location in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoint {
    /// Horizontal pixel coordinate.
    pub x: f32,
    /// Vertical pixel coordinate.
    pub y: f32,
    /// Confidence of the underlying peak.
    pub confidence: f32,
}

/// One assembled person instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skeleton {
    /// Assigned peak per part type.
    pub parts: Vec<Option<PeakId>>,
    /// Location per part type, `None` when the part was not assigned.
    pub keypoints: Vec<Option<Keypoint>>,
    /// Mean confidence of the assigned peaks.
    pub confidence: f32,
}

impl Skeleton {
    /// Number of assigned parts.
    #[must_use]
    pub fn num_parts(&self) -> usize {
        self.parts.iter().filter(|p| p.is_some()).count()
    }

    /// Location of a part, if assigned.
    #[must_use]
    pub fn keypoint(&self, part: usize) -> Option<Keypoint> {
        self.keypoints.get(part).copied().flatten()
    }

    /// Peak assigned to a part, if any.
    #[must_use]
    pub fn peak(&self, part: usize) -> Option<PeakId> {
        self.parts.get(part).copied().flatten()
    }
}

/// Per-stage timing for one parse call (in milliseconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Speed {
    /// Peak extraction.
    pub peaks: f64,
    /// Line-integral scoring and matching.
    pub matching: f64,
    /// Skeleton assembly and rescaling.
    pub assembly: f64,
}

impl Speed {
    /// Total parse time.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.peaks + self.matching + self.assembly
    }
}

/// Counters collected during one parse call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Peaks kept per part type.
    pub peak_counts: Vec<usize>,
    /// Eligible candidate pairs over all limbs.
    pub candidate_pairs: usize,
    /// Connections committed by the matcher over all limbs.
    pub committed_connections: usize,
    /// Connections dropped during assembly to keep assignments exclusive.
    pub dropped_conflicts: usize,
}

/// Parsing output for one image.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    /// Skeletons by descending confidence.
    pub skeletons: Vec<Skeleton>,
    /// Peaks per part type in map coordinates.
    pub peaks: Vec<Vec<Peak>>,
    /// Committed connections per limb.
    pub connections: Vec<Vec<Connection>>,
    /// Confidence map size as (height, width).
    pub map_shape: (usize, usize),
    /// Scale used to map cells to pixels.
    pub scale: Scale,
    /// Counters.
    pub stats: ParseStats,
    /// Timing information.
    pub speed: Speed,
}

impl ParseResult {
    /// Number of skeletons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.skeletons.len()
    }

    /// Whether no skeleton was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skeletons.is_empty()
    }

    /// Image extent covered by the map as (height, width) in pixels.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn image_shape(&self) -> (f32, f32) {
        (
            self.map_shape.0 as f32 * self.scale.y,
            self.map_shape.1 as f32 * self.scale.x,
        )
    }

    /// Keypoints as an `(skeletons, parts, 3)` array of `(x, y, conf)`.
    ///
    /// Unassigned parts are all zeros.
    #[must_use]
    pub fn keypoints_array(&self) -> Array3<f32> {
        let num_parts = self.peaks.len();
        let mut data = Array3::zeros((self.skeletons.len(), num_parts, 3));
        for (mut row, skeleton) in data.axis_iter_mut(Axis(0)).zip(&self.skeletons) {
            for (part, kpt) in skeleton.keypoints.iter().enumerate() {
                if let Some(kpt) = kpt {
                    row[[part, 0]] = kpt.x;
                    row[[part, 1]] = kpt.y;
                    row[[part, 2]] = kpt.confidence;
                }
            }
        }
        data
    }

    /// Keypoint coordinates normalized by the image extent.
    #[must_use]
    pub fn keypoints_normalized(&self) -> Array3<f32> {
        let (h, w) = self.image_shape();
        let mut data = self.keypoints_array();
        if h > 0.0 && w > 0.0 {
            data.index_axis_mut(Axis(2), 0).mapv_inplace(|v| v / w);
            data.index_axis_mut(Axis(2), 1).mapv_inplace(|v| v / h);
        }
        data
    }

    /// One-line summary such as "2 skeletons (14, 9 parts), 3.1ms".
    #[must_use]
    pub fn verbose(&self) -> String {
        if self.skeletons.is_empty() {
            return format!("(no skeletons), {:.1}ms", self.speed.total());
        }
        let parts: Vec<String> = self
            .skeletons
            .iter()
            .map(|s| s.num_parts().to_string())
            .collect();
        format!(
            "{} skeleton{} ({} parts), {:.1}ms",
            self.skeletons.len(),
            if self.skeletons.len() == 1 { "" } else { "s" },
            parts.join(", "),
            self.speed.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(skeletons: Vec<Skeleton>) -> ParseResult {
        ParseResult {
            skeletons,
            peaks: vec![Vec::new(), Vec::new()],
            connections: vec![Vec::new()],
            map_shape: (10, 20),
            scale: Scale::uniform(4.0).unwrap(),
            stats: ParseStats::default(),
            speed: Speed {
                peaks: 1.0,
                matching: 2.0,
                assembly: 0.5,
            },
        }
    }

    fn skeleton() -> Skeleton {
        Skeleton {
            parts: vec![Some(PeakId { part: 0, index: 0 }), None],
            keypoints: vec![
                Some(Keypoint {
                    x: 40.0,
                    y: 20.0,
                    confidence: 0.8,
                }),
                None,
            ],
            confidence: 0.8,
        }
    }

    #[test]
    fn test_scale() {
        let scale = Scale::uniform(4.0).unwrap();
        assert_eq!(scale.apply(0.0, 1.0), (2.0, 6.0));
        assert!(Scale::uniform(0.0).is_err());
        assert!(Scale::new(1.0, f32::NAN).is_err());
        assert!(Scale::new(-2.0, 1.0).is_err());
    }

    #[test]
    fn test_skeleton_accessors() {
        let s = skeleton();
        assert_eq!(s.num_parts(), 1);
        assert!(s.keypoint(0).is_some());
        assert!(s.keypoint(1).is_none());
        assert!(s.keypoint(7).is_none());
        assert_eq!(s.peak(0), Some(PeakId { part: 0, index: 0 }));
    }

    #[test]
    fn test_keypoints_array() {
        let result = result_with(vec![skeleton()]);
        let data = result.keypoints_array();
        assert_eq!(data.shape(), &[1, 2, 3]);
        assert!((data[[0, 0, 0]] - 40.0).abs() < f32::EPSILON);
        assert!((data[[0, 0, 2]] - 0.8).abs() < f32::EPSILON);
        assert!(data[[0, 1, 2]].abs() < f32::EPSILON);

        // Image is 40 x 80 pixels
        let xyn = result.keypoints_normalized();
        assert!((xyn[[0, 0, 0]] - 0.5).abs() < 1e-6);
        assert!((xyn[[0, 0, 1]] - 0.5).abs() < 1e-6);
        assert!((xyn[[0, 0, 2]] - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_speed_and_verbose() {
        let result = result_with(vec![skeleton()]);
        assert!((result.speed.total() - 3.5).abs() < 1e-9);
        assert_eq!(result.verbose(), "1 skeleton (1 parts), 3.5ms");

        let empty = result_with(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.verbose(), "(no skeletons), 3.5ms");
    }
}

// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The parsing context tying topology, configuration and pipeline stages
//! together.

use std::sync::Arc;
use std::time::Instant;

use ndarray::{ArrayView3, ArrayView4, Axis};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::assembly::assemble;
use crate::config::ParseConfig;
use crate::error::{PoseError, Result};
use crate::matching::match_limbs;
use crate::paf::LineIntegral;
use crate::peaks::PeakExtractor;
use crate::results::{Keypoint, ParseResult, ParseStats, Scale, Skeleton, Speed};
use crate::topology::Topology;

/// Converts network outputs into skeletons.
///
/// A parser is built once and is read-only afterwards; it can be shared
/// across threads parsing different images.
///
/// # Example
///
/// ```rust
/// use ndarray::Array3;
/// use pafpose::{ParseConfig, PoseParser, Scale, Topology};
///
/// # fn main() -> pafpose::Result<()> {
/// let topology = Topology::new(&["neck", "hip"], &[("neck", "hip")])?;
/// let parser = PoseParser::new(topology, ParseConfig::default())?;
///
/// let cmap = Array3::<f32>::zeros((2, 32, 32));
/// let paf = Array3::<f32>::zeros((2, 32, 32));
/// let result = parser.parse(cmap.view(), paf.view(), Scale::uniform(8.0)?)?;
/// assert!(result.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PoseParser {
    topology: Arc<Topology>,
    config: ParseConfig,
    extractor: PeakExtractor,
    scorer: LineIntegral,
}

impl PoseParser {
    /// Create a parser.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ConfigError`] if the configuration is invalid.
    pub fn new(topology: impl Into<Arc<Topology>>, config: ParseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            topology: topology.into(),
            extractor: PeakExtractor::from_config(&config),
            scorer: LineIntegral::from_config(&config),
            config,
        })
    }

    /// The topology this parser was built with.
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The configuration this parser was built with.
    #[must_use]
    pub const fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Check tensor shapes against the topology.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ShapeMismatch`] if the channel counts differ from
    /// the part count and twice the limb count, or if the spatial dimensions
    /// of the two tensors differ.
    pub fn check_shapes(&self, cmap_shape: &[usize], paf_shape: &[usize]) -> Result<()> {
        let parts = self.topology.num_parts();
        let channels = self.topology.num_paf_channels();

        if cmap_shape.len() != 3 || paf_shape.len() != 3 {
            return Err(PoseError::ShapeMismatch(format!(
                "expected (channels, height, width) tensors, got cmap {cmap_shape:?} and paf {paf_shape:?}"
            )));
        }
        if cmap_shape[0] != parts {
            return Err(PoseError::ShapeMismatch(format!(
                "cmap has {} channels but the topology has {parts} parts",
                cmap_shape[0]
            )));
        }
        if paf_shape[0] != channels {
            return Err(PoseError::ShapeMismatch(format!(
                "paf has {} channels but the topology needs {channels}",
                paf_shape[0]
            )));
        }
        if cmap_shape[1..] != paf_shape[1..] {
            return Err(PoseError::ShapeMismatch(format!(
                "cmap is {}x{} but paf is {}x{}",
                cmap_shape[1], cmap_shape[2], paf_shape[1], paf_shape[2]
            )));
        }
        Ok(())
    }

    /// Parse one image.
    ///
    /// # Arguments
    ///
    /// * `cmap` - Confidence maps shaped `(parts, height, width)`.
    /// * `paf` - Part affinity fields shaped `(2 * limbs, height, width)`.
    /// * `scale` - Map cell to image pixel factor.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ShapeMismatch`] if the tensors do not fit the
    /// topology. No partial output is produced.
    pub fn parse(
        &self,
        cmap: ArrayView3<'_, f32>,
        paf: ArrayView3<'_, f32>,
        scale: Scale,
    ) -> Result<ParseResult> {
        self.check_shapes(cmap.shape(), paf.shape())?;
        Ok(self.parse_unchecked(cmap, paf, scale))
    }

    /// Parse a batch of images shaped `(batch, channels, height, width)`.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ShapeMismatch`] if the batch sizes differ or any
    /// image fails the shape check.
    pub fn parse_batch(
        &self,
        cmap: ArrayView4<'_, f32>,
        paf: ArrayView4<'_, f32>,
        scale: Scale,
    ) -> Result<Vec<ParseResult>> {
        if cmap.shape()[0] != paf.shape()[0] {
            return Err(PoseError::ShapeMismatch(format!(
                "cmap batch of {} but paf batch of {}",
                cmap.shape()[0],
                paf.shape()[0]
            )));
        }
        self.check_shapes(&cmap.shape()[1..], &paf.shape()[1..])?;

        let images: Vec<_> = cmap.axis_iter(Axis(0)).zip(paf.axis_iter(Axis(0))).collect();

        #[cfg(feature = "parallel")]
        if self.config.parallel {
            return Ok(images
                .into_par_iter()
                .map(|(c, p)| self.parse_unchecked(c, p, scale))
                .collect());
        }

        Ok(images
            .into_iter()
            .map(|(c, p)| self.parse_unchecked(c, p, scale))
            .collect())
    }

    #[allow(clippy::cast_precision_loss)]
    fn parse_unchecked(
        &self,
        cmap: ArrayView3<'_, f32>,
        paf: ArrayView3<'_, f32>,
        scale: Scale,
    ) -> ParseResult {
        let t0 = Instant::now();
        let peaks = self.extractor.extract(cmap);
        let t1 = Instant::now();
        let matches = match_limbs(&self.topology, paf, &peaks, &self.scorer, self.config.parallel);
        let t2 = Instant::now();
        let assembly = assemble(&peaks, &matches, self.config.min_assigned_parts);

        let skeletons = assembly
            .groups
            .into_iter()
            .map(|group| {
                let keypoints = group
                    .parts
                    .iter()
                    .map(|id| {
                        id.map(|id| {
                            let peak = &peaks[id.part][id.index];
                            let (x, y) = scale.apply(peak.x, peak.y);
                            Keypoint {
                                x,
                                y,
                                confidence: peak.confidence,
                            }
                        })
                    })
                    .collect();
                Skeleton {
                    parts: group.parts,
                    keypoints,
                    confidence: group.confidence,
                }
            })
            .collect();
        let t3 = Instant::now();

        let stats = ParseStats {
            peak_counts: peaks.iter().map(Vec::len).collect(),
            candidate_pairs: matches.iter().map(|m| m.candidates).sum(),
            committed_connections: matches.iter().map(|m| m.connections.len()).sum(),
            dropped_conflicts: assembly.dropped_conflicts,
        };

        let ms = |a: Instant, b: Instant| (b - a).as_secs_f64() * 1000.0;
        ParseResult {
            skeletons,
            connections: matches.into_iter().map(|m| m.connections).collect(),
            peaks,
            map_shape: (cmap.shape()[1], cmap.shape()[2]),
            scale,
            stats,
            speed: Speed {
                peaks: ms(t0, t1),
                matching: ms(t1, t2),
                assembly: ms(t2, t3),
            },
        }
    }
}

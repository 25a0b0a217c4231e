// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Parser configuration.
//!
//! This module defines the [`ParseConfig`] struct, which controls the tunable
//! parameters of the parsing pipeline: peak detection thresholds, the
//! non-maximum-suppression window, line-integral sampling and skeleton
//! filtering.

use crate::error::{PoseError, Result};

/// Configuration for part affinity field parsing.
///
/// Uses a builder pattern for convenient construction. Values are checked by
/// [`ParseConfig::validate`], which [`crate::PoseParser::new`] calls, so an
/// invalid configuration is rejected once at setup and never mid-parse.
///
/// # Example
///
/// ```rust
/// use pafpose::ParseConfig;
///
/// let config = ParseConfig::new()
///     .with_cmap_threshold(0.15)
///     .with_link_threshold(0.2)
///     .with_max_peaks_per_part(50)
///     .with_line_integral_samples(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParseConfig {
    /// Minimum confidence map value for a cell to be a peak.
    pub cmap_threshold: f32,
    /// Minimum line-integral score for a peak pair to be linked.
    pub link_threshold: f32,
    /// Maximum number of peaks kept per part type, highest confidence first.
    pub max_peaks_per_part: usize,
    /// Number of field samples taken along each candidate segment.
    pub line_integral_samples: usize,
    /// Radius of the square window used for peak suppression and refinement.
    /// A radius of 1 is a 3x3 window.
    pub window_radius: usize,
    /// Skeletons with fewer assigned parts than this are dropped.
    pub min_assigned_parts: usize,
    /// Largest field component perpendicular to a candidate segment that any
    /// sample may carry before the pair is rejected outright.
    pub perpendicular_tolerance: f32,
    /// Match limb types on rayon's thread pool.
    /// Output is identical either way.
    pub parallel: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            cmap_threshold: 0.1,
            link_threshold: 0.1,
            max_peaks_per_part: 100,
            line_integral_samples: 10,
            window_radius: 1,
            min_assigned_parts: 1,
            perpendicular_tolerance: 0.5,
            parallel: true,
        }
    }
}

impl ParseConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence map threshold.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Minimum cell value for a peak.
    #[must_use]
    pub const fn with_cmap_threshold(mut self, threshold: f32) -> Self {
        self.cmap_threshold = threshold;
        self
    }

    /// Set the link threshold for line-integral scores.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Minimum affinity score for a connection.
    #[must_use]
    pub const fn with_link_threshold(mut self, threshold: f32) -> Self {
        self.link_threshold = threshold;
        self
    }

    /// Set the maximum number of peaks kept per part type.
    #[must_use]
    pub const fn with_max_peaks_per_part(mut self, max: usize) -> Self {
        self.max_peaks_per_part = max;
        self
    }

    /// Set the number of samples taken along each candidate limb segment.
    #[must_use]
    pub const fn with_line_integral_samples(mut self, samples: usize) -> Self {
        self.line_integral_samples = samples;
        self
    }

    /// Set the suppression / refinement window radius.
    #[must_use]
    pub const fn with_window_radius(mut self, radius: usize) -> Self {
        self.window_radius = radius;
        self
    }

    /// Set the minimum number of assigned parts for an output skeleton.
    #[must_use]
    pub const fn with_min_assigned_parts(mut self, min: usize) -> Self {
        self.min_assigned_parts = min;
        self
    }

    /// Set the perpendicular field tolerance used by the line-integral scorer.
    #[must_use]
    pub const fn with_perpendicular_tolerance(mut self, tolerance: f32) -> Self {
        self.perpendicular_tolerance = tolerance;
        self
    }

    /// Enable or disable parallel limb matching.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ConfigError`] for negative or non-finite
    /// thresholds, and for zero peaks, samples or window radius.
    pub fn validate(&self) -> Result<()> {
        check_threshold("cmap_threshold", self.cmap_threshold)?;
        check_threshold("link_threshold", self.link_threshold)?;
        check_threshold("perpendicular_tolerance", self.perpendicular_tolerance)?;

        if self.max_peaks_per_part == 0 {
            return Err(PoseError::ConfigError(
                "max_peaks_per_part must be at least 1".to_string(),
            ));
        }
        if self.line_integral_samples == 0 {
            return Err(PoseError::ConfigError(
                "line_integral_samples must be at least 1".to_string(),
            ));
        }
        if self.window_radius == 0 {
            return Err(PoseError::ConfigError(
                "window_radius must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_threshold(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PoseError::ConfigError(format!(
            "{name} must be a finite, non-negative number (got {value})"
        )));
    }
    Ok(())
}

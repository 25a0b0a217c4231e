// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # pafpose
//!
//! Multi-person pose parsing for bottom-up pose networks. Given the two dense
//! outputs of such a network, a per-part confidence map (`cmap`) and a
//! per-limb part affinity field (`paf`), this crate finds body-part peaks,
//! scores candidate limbs by integrating the field along them, matches them
//! greedily and assembles the connections into individual skeletons.
//!
//! ## Pipeline
//!
//! 1. **Peaks** - non-maximum suppression and sub-pixel refinement per
//!    confidence map channel ([`peaks`]).
//! 2. **Line integral** - bilinear sampling of the limb's two field channels
//!    along the candidate segment ([`paf`]).
//! 3. **Matching** - ranked greedy commit per limb type, parallel across
//!    limbs ([`matching`]).
//! 4. **Assembly** - union-find over peak identities with first-assignment-wins
//!    conflict handling ([`assembly`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::Array3;
//! use pafpose::{ParseConfig, PoseParser, Scale, Topology};
//!
//! # fn main() -> pafpose::Result<()> {
//! let topology = Topology::new(&["neck", "hip"], &[("neck", "hip")])?;
//! let parser = PoseParser::new(topology, ParseConfig::new().with_cmap_threshold(0.2))?;
//!
//! // One neck at (row 4, col 8), one hip at (row 20, col 8)
//! let mut cmap = Array3::<f32>::zeros((2, 32, 32));
//! cmap[[0, 4, 8]] = 0.9;
//! cmap[[1, 20, 8]] = 0.8;
//!
//! // Field pointing down (+y) everywhere
//! let mut paf = Array3::<f32>::zeros((2, 32, 32));
//! paf.index_axis_mut(ndarray::Axis(0), 1).fill(1.0);
//!
//! let result = parser.parse(cmap.view(), paf.view(), Scale::uniform(4.0)?)?;
//! assert_eq!(result.len(), 1);
//! let neck = result.skeletons[0].keypoint(0).unwrap();
//! assert_eq!((neck.x, neck.y), (34.0, 18.0));
//! # Ok(())
//! # }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Inspect the built-in human pose topology
//! pafpose topology
//!
//! # Parse tensors saved as ndarray JSON
//! pafpose parse --cmap cmap.json --paf paf.json --scale 4
//! pafpose parse --cmap cmap.json --paf paf.json --json > skeletons.json
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`topology`] | [`Topology`] of parts, limbs and field channels |
//! | [`config`] | [`ParseConfig`] tuning parameters |
//! | [`parser`] | [`PoseParser`] entry point |
//! | [`results`] | Output types ([`ParseResult`], [`Skeleton`], [`Keypoint`]) |
//! | [`error`] | Error types ([`PoseError`], [`Result`]) |
//! | [`io`] | Tensor and result JSON files |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `parallel` | Limb matching and batches on rayon (default) |

// Modules
pub mod assembly;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod matching;
pub mod paf;
pub mod parser;
pub mod peaks;
pub mod results;
pub mod topology;

// Re-export main types for convenience
pub use config::ParseConfig;
pub use error::{PoseError, Result};
pub use matching::Connection;
pub use parser::PoseParser;
pub use peaks::{Peak, PeakId};
pub use results::{Keypoint, ParseResult, ParseStats, Scale, Skeleton, Speed};
pub use topology::{CocoCategory, Limb, Topology};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pafpose");
    }
}

// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Body topology: part types, limbs and the limb to field-channel mapping.
//!
//! A [`Topology`] is built once from a category description and then shared
//! read-only by every parse call. The i-th limb (in input order) is encoded by
//! part affinity field channels `2 * i` (x component) and `2 * i + 1`
//! (y component).

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PoseError, Result};

/// Part names of the built-in human pose topology (COCO keypoints plus neck).
pub const HUMAN_POSE_PARTS: [&str; 18] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
    "neck",
];

/// Limbs of the built-in human pose topology as 0-based part index pairs.
pub const HUMAN_POSE_LIMBS: [[usize; 2]; 21] = [
    [15, 13], // left ankle to left knee
    [13, 11], // left knee to left hip
    [16, 14], // right ankle to right knee
    [14, 12], // right knee to right hip
    [11, 12], // left hip to right hip
    [5, 7],   // left shoulder to left elbow
    [6, 8],   // right shoulder to right elbow
    [7, 9],   // left elbow to left wrist
    [8, 10],  // right elbow to right wrist
    [1, 2],   // left eye to right eye
    [0, 1],   // nose to left eye
    [0, 2],   // nose to right eye
    [1, 3],   // left eye to left ear
    [2, 4],   // right eye to right ear
    [3, 5],   // left ear to left shoulder
    [4, 6],   // right ear to right shoulder
    [17, 0],  // neck to nose
    [17, 5],  // neck to left shoulder
    [17, 6],  // neck to right shoulder
    [17, 11], // neck to left hip
    [17, 12], // neck to right hip
];

/// A connection between two part types and the field channels that encode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Limb {
    /// Source part type.
    pub source: usize,
    /// Target part type.
    pub target: usize,
    /// Field channel holding the x component of the limb direction.
    pub paf_x: usize,
    /// Field channel holding the y component of the limb direction.
    pub paf_y: usize,
}

impl Limb {
    /// Whether either endpoint of this limb is `part`.
    #[must_use]
    pub const fn touches(&self, part: usize) -> bool {
        self.source == part || self.target == part
    }
}

/// COCO-style category description.
///
/// `skeleton` entries are **1-based** indices into `keypoints`, as in COCO
/// annotation files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CocoCategory {
    /// Category name (e.g. "person").
    #[serde(default)]
    pub name: String,
    /// Supercategory name.
    #[serde(default)]
    pub supercategory: String,
    /// Part names in channel order.
    pub keypoints: Vec<String>,
    /// Limbs as 1-based index pairs.
    pub skeleton: Vec<[usize; 2]>,
}

/// Static description of part types and limbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    parts: Vec<String>,
    limbs: Vec<Limb>,
    index: HashMap<String, usize>,
}

impl Topology {
    /// Build a topology from part names and `(source, target)` name pairs.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ConfigError`] if the part list is empty, a part
    /// name is repeated, a limb names an unknown part, or the same ordered
    /// pair appears twice.
    pub fn new<P, L>(parts: &[P], limbs: &[(L, L)]) -> Result<Self>
    where
        P: AsRef<str>,
        L: AsRef<str>,
    {
        if parts.is_empty() {
            return Err(PoseError::ConfigError(
                "topology must define at least one part".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(parts.len());
        for (i, name) in parts.iter().enumerate() {
            let name = name.as_ref();
            if index.insert(name.to_string(), i).is_some() {
                return Err(PoseError::ConfigError(format!(
                    "part '{name}' is defined more than once"
                )));
            }
        }

        let lookup = |name: &str| {
            index.get(name).copied().ok_or_else(|| {
                PoseError::ConfigError(format!("limb references unknown part '{name}'"))
            })
        };

        let mut pairs = Vec::with_capacity(limbs.len());
        for (source, target) in limbs {
            pairs.push((lookup(source.as_ref())?, lookup(target.as_ref())?));
        }

        let parts = parts.iter().map(|p| p.as_ref().to_string()).collect();
        Self::from_indices(parts, &pairs, index)
    }

    /// Build a topology from a COCO category description.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ConfigError`] for out-of-range skeleton indices
    /// and for every condition rejected by [`Topology::new`].
    pub fn from_coco_category(category: &CocoCategory) -> Result<Self> {
        let num_parts = category.keypoints.len();
        let mut limbs = Vec::with_capacity(category.skeleton.len());
        for &[a, b] in &category.skeleton {
            for idx in [a, b] {
                if idx == 0 || idx > num_parts {
                    return Err(PoseError::ConfigError(format!(
                        "skeleton index {idx} out of range 1..={num_parts}"
                    )));
                }
            }
            limbs.push((
                category.keypoints[a - 1].as_str(),
                category.keypoints[b - 1].as_str(),
            ));
        }
        Self::new(&category.keypoints, &limbs)
    }

    /// Parse a COCO category description from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ConfigError`] if the JSON is malformed or the
    /// description is invalid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let category: CocoCategory = serde_json::from_str(json)
            .map_err(|e| PoseError::ConfigError(format!("invalid topology JSON: {e}")))?;
        Self::from_coco_category(&category)
    }

    /// Load a COCO category description from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Io`] if the file cannot be read, otherwise the
    /// errors of [`Topology::from_json_str`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The built-in 18-part, 21-limb human pose topology.
    #[must_use]
    pub fn human_pose() -> Self {
        let parts: Vec<String> = HUMAN_POSE_PARTS.iter().map(ToString::to_string).collect();
        let index = parts
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        let pairs: Vec<(usize, usize)> = HUMAN_POSE_LIMBS.iter().map(|&[a, b]| (a, b)).collect();

        Self {
            limbs: assign_channels(&pairs),
            parts,
            index,
        }
    }

    fn from_indices(
        parts: Vec<String>,
        pairs: &[(usize, usize)],
        index: HashMap<String, usize>,
    ) -> Result<Self> {
        let mut seen = HashSet::with_capacity(pairs.len());
        for &(source, target) in pairs {
            if !seen.insert((source, target)) {
                return Err(PoseError::ConfigError(format!(
                    "limb ('{}', '{}') is defined more than once",
                    parts[source], parts[target]
                )));
            }
        }

        Ok(Self {
            limbs: assign_channels(pairs),
            parts,
            index,
        })
    }

    /// Number of part types.
    #[must_use]
    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    /// Number of limbs.
    #[must_use]
    pub fn num_limbs(&self) -> usize {
        self.limbs.len()
    }

    /// Number of part affinity field channels the topology expects.
    #[must_use]
    pub fn num_paf_channels(&self) -> usize {
        self.limbs.len() * 2
    }

    /// All part names in channel order.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Name of a part type.
    #[must_use]
    pub fn part_name(&self, part: usize) -> Option<&str> {
        self.parts.get(part).map(String::as_str)
    }

    /// Index of a part type by name.
    #[must_use]
    pub fn part_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// All limbs in channel order.
    #[must_use]
    pub fn limbs(&self) -> &[Limb] {
        &self.limbs
    }

    /// Limbs with `part` as either endpoint, with their limb indices.
    pub fn limbs_touching(&self, part: usize) -> impl Iterator<Item = (usize, &Limb)> {
        self.limbs
            .iter()
            .enumerate()
            .filter(move |(_, limb)| limb.touches(part))
    }

    /// Names of parts that no limb connects.
    pub fn unconnected_parts(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .enumerate()
            .filter(|(part, _)| self.limbs_touching(*part).next().is_none())
            .map(|(_, name)| name.as_str())
    }

    /// Convert back to a COCO category description.
    #[must_use]
    pub fn to_coco_category(&self, name: &str) -> CocoCategory {
        CocoCategory {
            name: name.to_string(),
            supercategory: name.to_string(),
            keypoints: self.parts.clone(),
            skeleton: self
                .limbs
                .iter()
                .map(|l| [l.source + 1, l.target + 1])
                .collect(),
        }
    }
}

fn assign_channels(pairs: &[(usize, usize)]) -> Vec<Limb> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, &(source, target))| Limb {
            source,
            target,
            paf_x: 2 * i,
            paf_y: 2 * i + 1,
        })
        .collect()
}

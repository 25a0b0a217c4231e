// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Greedy bipartite matching of peaks into limb connections.
//!
//! For every limb type the candidate pairs are scored, ranked and committed
//! greedily so that each peak serves at most one connection of that limb
//! type. This is not an optimal assignment; it trades optimality for a
//! bounded `O(n·m log(n·m))` cost per limb.

use ndarray::{ArrayView3, Axis};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use crate::paf::LineIntegral;
use crate::peaks::{Peak, PeakId};
use crate::topology::{Limb, Topology};

/// A committed pairing of two peaks for one limb.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Connection {
    /// Limb index in the topology.
    pub limb: usize,
    /// Peak of the limb's source part type.
    pub source: PeakId,
    /// Peak of the limb's target part type.
    pub target: PeakId,
    /// Line-integral affinity score.
    pub score: f32,
}

/// Connections committed for one limb.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimbMatches {
    /// Connections in commit order.
    pub connections: Vec<Connection>,
    /// Number of pairs that passed the eligibility checks.
    pub candidates: usize,
}

/// Match one limb greedily.
///
/// Eligible pairs are ranked by descending score, then ascending source
/// index, then ascending target index.
#[must_use]
pub fn match_limb(
    limb_index: usize,
    limb: &Limb,
    paf: ArrayView3<'_, f32>,
    peaks: &[Vec<Peak>],
    scorer: &LineIntegral,
) -> LimbMatches {
    let sources = &peaks[limb.source];
    let targets = &peaks[limb.target];
    if sources.is_empty() || targets.is_empty() {
        return LimbMatches::default();
    }

    let field_x = paf.index_axis(Axis(0), limb.paf_x);
    let field_y = paf.index_axis(Axis(0), limb.paf_y);

    let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        for (j, target) in targets.iter().enumerate() {
            let score = scorer.score(field_x, field_y, source, target);
            if scorer.is_eligible(score) {
                candidates.push((score.value(), i, j));
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    // A limb joining a part type to itself draws both ends from one list
    let shared = limb.source == limb.target;
    let mut source_used = vec![false; sources.len()];
    let mut target_used = vec![false; targets.len()];
    let mut connections = Vec::new();

    for &(score, i, j) in &candidates {
        if shared {
            if source_used[i] || source_used[j] {
                continue;
            }
            source_used[i] = true;
            source_used[j] = true;
        } else {
            if source_used[i] || target_used[j] {
                continue;
            }
            source_used[i] = true;
            target_used[j] = true;
        }

        connections.push(Connection {
            limb: limb_index,
            source: sources[i].id,
            target: targets[j].id,
            score,
        });
    }

    LimbMatches {
        connections,
        candidates: candidates.len(),
    }
}

/// Match every limb of the topology.
///
/// With `parallel` set (and the `parallel` feature enabled) limbs are matched
/// on rayon's pool. The result is indexed by limb and is identical either way.
#[must_use]
pub fn match_limbs(
    topology: &Topology,
    paf: ArrayView3<'_, f32>,
    peaks: &[Vec<Peak>],
    scorer: &LineIntegral,
    parallel: bool,
) -> Vec<LimbMatches> {
    let limbs = topology.limbs();

    #[cfg(feature = "parallel")]
    if parallel {
        return limbs
            .par_iter()
            .enumerate()
            .map(|(i, limb)| match_limb(i, limb, paf, peaks, scorer))
            .collect();
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    limbs
        .iter()
        .enumerate()
        .map(|(i, limb)| match_limb(i, limb, paf, peaks, scorer))
        .collect()
}

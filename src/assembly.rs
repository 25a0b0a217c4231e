// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Skeleton assembly by union-find over peak identities.
//!
//! Every peak starts as its own group. Connections are applied in limb order
//! and then commit order; a connection whose two groups already hold
//! different peaks for the same part type is dropped, so the first-built
//! assignment of a part always wins.

use crate::matching::LimbMatches;
use crate::peaks::{Peak, PeakId};

/// A group of peaks assigned to one person, before coordinate rescaling.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledGroup {
    /// Creation order of the group (the flat index of its oldest peak).
    pub order: usize,
    /// Assigned peak per part type.
    pub parts: Vec<Option<PeakId>>,
    /// Mean confidence of the assigned peaks.
    pub confidence: f32,
}

impl AssembledGroup {
    /// Number of part types with an assigned peak.
    #[must_use]
    pub fn num_assigned(&self) -> usize {
        self.parts.iter().filter(|p| p.is_some()).count()
    }
}

/// Output of [`assemble`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    /// Groups ordered by descending confidence, then creation order.
    pub groups: Vec<AssembledGroup>,
    /// Connections discarded because they would double-assign a part type.
    pub dropped_conflicts: usize,
}

/// Index arena of peaks with parent pointers.
struct UnionFind {
    parent: Vec<usize>,
    /// Peaks of each root's group; empty for non-roots.
    members: Vec<Vec<PeakId>>,
}

impl UnionFind {
    fn new(peaks: &[Vec<Peak>]) -> Self {
        let members: Vec<Vec<PeakId>> = peaks.iter().flatten().map(|p| vec![p.id]).collect();
        Self {
            parent: (0..members.len()).collect(),
            members,
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn conflicts(&self, a: usize, b: usize) -> bool {
        self.members[a]
            .iter()
            .any(|x| self.members[b].iter().any(|y| y.part == x.part))
    }

    /// Merge two roots, keeping the older one as the new root.
    fn merge(&mut self, a: usize, b: usize) {
        let (keep, absorb) = if a < b { (a, b) } else { (b, a) };
        self.parent[absorb] = keep;
        let moved = std::mem::take(&mut self.members[absorb]);
        self.members[keep].extend(moved);
    }
}

/// Merge committed connections into skeleton groups.
///
/// # Arguments
///
/// * `peaks` - Per part sorted peaks, as produced by the peak extractor.
/// * `matches` - Per limb connections, indexed by limb.
/// * `min_assigned_parts` - Groups with fewer assigned parts are dropped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn assemble(
    peaks: &[Vec<Peak>],
    matches: &[LimbMatches],
    min_assigned_parts: usize,
) -> Assembly {
    let num_parts = peaks.len();
    let offsets: Vec<usize> = peaks
        .iter()
        .scan(0, |acc, part_peaks| {
            let start = *acc;
            *acc += part_peaks.len();
            Some(start)
        })
        .collect();
    let flat = |id: PeakId| offsets[id.part] + id.index;

    let mut uf = UnionFind::new(peaks);
    let mut dropped_conflicts = 0;

    for connection in matches.iter().flat_map(|m| &m.connections) {
        let a = uf.find(flat(connection.source));
        let b = uf.find(flat(connection.target));
        if a == b {
            continue;
        }
        if uf.conflicts(a, b) {
            dropped_conflicts += 1;
            continue;
        }
        uf.merge(a, b);
    }

    let mut groups: Vec<AssembledGroup> = Vec::new();
    for root in 0..uf.parent.len() {
        if uf.parent[root] != root || uf.members[root].len() < min_assigned_parts {
            continue;
        }

        let mut parts = vec![None; num_parts];
        let mut total = 0.0f32;
        for id in &uf.members[root] {
            parts[id.part] = Some(*id);
            total += peaks[id.part][id.index].confidence;
        }

        groups.push(AssembledGroup {
            order: root,
            parts,
            confidence: total / uf.members[root].len() as f32,
        });
    }

    groups.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.order.cmp(&b.order))
    });

    Assembly {
        groups,
        dropped_conflicts,
    }
}

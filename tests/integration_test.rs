// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the pose parsing pipeline

use std::collections::HashSet;

use ndarray::{Array3, Array4, s};
use pafpose::topology::HUMAN_POSE_LIMBS;
use pafpose::{ParseConfig, PoseError, PoseParser, Scale, Topology};

/// Map positions (col, row) of one person for the built-in human topology.
const PERSON: [(f32, f32); 18] = [
    (10.0, 4.0),  // nose
    (11.0, 3.0),  // left_eye
    (9.0, 3.0),   // right_eye
    (12.0, 4.0),  // left_ear
    (8.0, 4.0),   // right_ear
    (13.0, 8.0),  // left_shoulder
    (7.0, 8.0),   // right_shoulder
    (15.0, 12.0), // left_elbow
    (5.0, 12.0),  // right_elbow
    (16.0, 16.0), // left_wrist
    (4.0, 16.0),  // right_wrist
    (12.0, 18.0), // left_hip
    (8.0, 18.0),  // right_hip
    (12.0, 24.0), // left_knee
    (8.0, 24.0),  // right_knee
    (12.0, 30.0), // left_ankle
    (8.0, 30.0),  // right_ankle
    (10.0, 8.0),  // neck
];

/// Add a Gaussian blob to one confidence map channel.
#[allow(clippy::cast_precision_loss)]
fn add_blob(cmap: &mut Array3<f32>, part: usize, (cx, cy): (f32, f32), peak: f32) {
    let (_, height, width) = cmap.dim();
    for row in 0..height {
        for col in 0..width {
            let d2 = (col as f32 - cx).powi(2) + (row as f32 - cy).powi(2);
            let v = peak * (-d2 / 2.0).exp();
            if v > cmap[[part, row, col]] {
                cmap[[part, row, col]] = v;
            }
        }
    }
}

/// Write the unit limb direction into every cell within `width` of the segment.
#[allow(clippy::cast_precision_loss)]
fn paint_limb(paf: &mut Array3<f32>, limb: usize, from: (f32, f32), to: (f32, f32), width: f32) {
    let (_, height, map_width) = paf.dim();
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dy);
    let (ux, uy) = (dx / length, dy / length);

    for row in 0..height {
        for col in 0..map_width {
            let (px, py) = (col as f32 - from.0, row as f32 - from.1);
            let along = px * ux + py * uy;
            let across = (px * uy - py * ux).abs();
            if (-0.5..=length + 0.5).contains(&along) && across <= width {
                paf[[2 * limb, row, col]] = ux;
                paf[[2 * limb + 1, row, col]] = uy;
            }
        }
    }
}

/// Two people side by side, the left one more confident.
fn two_people() -> (Array3<f32>, Array3<f32>) {
    let mut cmap = Array3::<f32>::zeros((18, 36, 64));
    let mut paf = Array3::<f32>::zeros((42, 36, 64));

    for (offset, confidence) in [(0.0, 0.9), (30.0, 0.8)] {
        let shifted: Vec<(f32, f32)> = PERSON.iter().map(|&(x, y)| (x + offset, y)).collect();
        for (part, &pos) in shifted.iter().enumerate() {
            add_blob(&mut cmap, part, pos, confidence);
        }
        for (limb, &[a, b]) in HUMAN_POSE_LIMBS.iter().enumerate() {
            paint_limb(&mut paf, limb, shifted[a], shifted[b], 1.5);
        }
    }
    (cmap, paf)
}

fn human_parser(config: ParseConfig) -> PoseParser {
    PoseParser::new(Topology::human_pose(), config).unwrap()
}

/// Deterministic pseudo-random values in [0, 1).
fn noise(len: usize, mut seed: u64) -> Vec<f32> {
    (0..len)
        .map(|_| {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            #[allow(clippy::cast_precision_loss)]
            let v = (seed >> 40) as f32 / (1u64 << 24) as f32;
            v
        })
        .collect()
}

#[test]
fn test_empty_input_yields_nothing() {
    let parser = human_parser(ParseConfig::default());
    let cmap = Array3::<f32>::zeros((18, 24, 24));
    let paf = Array3::<f32>::zeros((42, 24, 24));

    let result = parser
        .parse(cmap.view(), paf.view(), Scale::uniform(4.0).unwrap())
        .unwrap();
    assert!(result.is_empty());
    assert!(result.peaks.iter().all(Vec::is_empty));
    assert_eq!(result.stats.committed_connections, 0);
}

#[test]
fn test_single_limb() {
    let topology = Topology::new(&["shoulder", "elbow"], &[("shoulder", "elbow")]).unwrap();
    let config = ParseConfig::default();
    let link_threshold = config.link_threshold;
    let parser = PoseParser::new(topology, config).unwrap();

    let mut cmap = Array3::<f32>::zeros((2, 20, 20));
    add_blob(&mut cmap, 0, (4.0, 5.0), 0.9);
    add_blob(&mut cmap, 1, (14.0, 12.0), 0.7);
    let mut paf = Array3::<f32>::zeros((2, 20, 20));
    paint_limb(&mut paf, 0, (4.0, 5.0), (14.0, 12.0), 1.5);

    let result = parser
        .parse(cmap.view(), paf.view(), Scale::uniform(8.0).unwrap())
        .unwrap();

    assert_eq!(result.len(), 1);
    let skeleton = &result.skeletons[0];
    assert_eq!(skeleton.num_parts(), 2);
    assert!((skeleton.confidence - 0.8).abs() < 1e-5);

    let shoulder = skeleton.keypoint(0).unwrap();
    assert!((shoulder.x - 36.0).abs() < 1e-3);
    assert!((shoulder.y - 44.0).abs() < 1e-3);
    let elbow = skeleton.keypoint(1).unwrap();
    assert!((elbow.x - 116.0).abs() < 1e-3);
    assert!((elbow.y - 100.0).abs() < 1e-3);

    assert_eq!(result.connections[0].len(), 1);
    assert!(result.connections[0][0].score > link_threshold);
}

#[test]
fn test_two_people_are_separated() {
    let parser = human_parser(ParseConfig::default());
    let (cmap, paf) = two_people();

    let result = parser
        .parse(cmap.view(), paf.view(), Scale::uniform(4.0).unwrap())
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.stats.dropped_conflicts, 0);
    for skeleton in &result.skeletons {
        assert_eq!(skeleton.num_parts(), 18);
    }

    // Left person is more confident and comes first
    let neck = result.skeletons[0].keypoint(17).unwrap();
    assert!((neck.x - 42.0).abs() < 1e-3);
    assert!((neck.y - 34.0).abs() < 1e-3);
    let neck = result.skeletons[1].keypoint(17).unwrap();
    assert!((neck.x - 162.0).abs() < 1e-3);

    // Every part of a skeleton comes from the same person
    for skeleton in &result.skeletons {
        let xs: Vec<f32> = skeleton.keypoints.iter().flatten().map(|k| k.x).collect();
        let max = xs.iter().copied().fold(f32::MIN, f32::max);
        let min = xs.iter().copied().fold(f32::MAX, f32::min);
        let spread = max - min;
        assert!(spread < 60.0);
    }
}

#[test]
fn test_assignment_exclusivity() {
    let parser = human_parser(ParseConfig::default().with_cmap_threshold(0.05));
    let (mut cmap, paf) = two_people();
    // Extra stray detections that can only attach ambiguously
    add_blob(&mut cmap, 17, (25.0, 8.0), 0.5);
    add_blob(&mut cmap, 0, (25.0, 4.0), 0.4);

    let result = parser
        .parse(cmap.view(), paf.view(), Scale::uniform(4.0).unwrap())
        .unwrap();

    let mut seen = HashSet::new();
    for skeleton in &result.skeletons {
        for (part, id) in skeleton.parts.iter().enumerate() {
            if let Some(id) = id {
                assert_eq!(id.part, part);
                assert!(seen.insert(*id), "peak {id:?} assigned twice");
            }
        }
    }
}

#[test]
fn test_deterministic_output() {
    let (cmap, paf) = two_people();
    let scale = Scale::uniform(4.0).unwrap();

    let parallel = human_parser(ParseConfig::default());
    let sequential = human_parser(ParseConfig::default().with_parallel(false));

    let first = parallel.parse(cmap.view(), paf.view(), scale).unwrap();
    let second = parallel.parse(cmap.view(), paf.view(), scale).unwrap();
    let third = sequential.parse(cmap.view(), paf.view(), scale).unwrap();

    let encode = |r: &pafpose::ParseResult| serde_json::to_string(&r.skeletons).unwrap();
    assert_eq!(encode(&first), encode(&second));
    assert_eq!(encode(&first), encode(&third));
    assert_eq!(first.connections, third.connections);
}

#[test]
fn test_peak_count_monotonic_in_threshold() {
    let topology = Topology::new(&["a", "b", "c"], &[("a", "b"), ("b", "c")]).unwrap();
    let values = noise(3 * 32 * 32, 7);
    let cmap = Array3::from_shape_vec((3, 32, 32), values).unwrap();
    let paf = Array3::<f32>::zeros((4, 32, 32));
    let scale = Scale::uniform(1.0).unwrap();

    let mut previous: Option<Vec<usize>> = None;
    for step in 0..10 {
        #[allow(clippy::cast_precision_loss)]
        let threshold = step as f32 * 0.1;
        let config = ParseConfig::default()
            .with_cmap_threshold(threshold)
            .with_max_peaks_per_part(10_000);
        let parser = PoseParser::new(topology.clone(), config).unwrap();
        let counts = parser
            .parse(cmap.view(), paf.view(), scale)
            .unwrap()
            .stats
            .peak_counts;

        if let Some(prev) = &previous {
            for (now, before) in counts.iter().zip(prev) {
                assert!(now <= before, "threshold {threshold}: {counts:?} > {prev:?}");
            }
        }
        previous = Some(counts);
    }
}

#[test]
fn test_conflicting_connection_is_dropped() {
    // Cycle a -> b -> c -> a; the closing limb prefers a second `a` peak
    let topology = Topology::new(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]).unwrap();
    let parser = PoseParser::new(topology, ParseConfig::default()).unwrap();

    let a0 = (4.0, 4.0);
    let b0 = (14.0, 4.0);
    let c0 = (14.0, 14.0);
    let a1 = (24.0, 14.0);

    let mut cmap = Array3::<f32>::zeros((3, 20, 30));
    cmap[[0, 4, 4]] = 0.9;
    cmap[[0, 14, 24]] = 0.8;
    cmap[[1, 4, 14]] = 0.9;
    cmap[[2, 14, 14]] = 0.9;

    let mut paf = Array3::<f32>::zeros((6, 20, 30));
    paint_limb(&mut paf, 0, a0, b0, 1.0);
    paint_limb(&mut paf, 1, b0, c0, 1.0);
    paint_limb(&mut paf, 2, c0, a1, 1.0);

    let scale = Scale::uniform(1.0).unwrap();
    let result = parser.parse(cmap.view(), paf.view(), scale).unwrap();

    assert_eq!(result.stats.committed_connections, 3);
    assert_eq!(result.stats.dropped_conflicts, 1);
    assert_eq!(result.len(), 2);

    let body = &result.skeletons[0];
    assert_eq!(body.num_parts(), 3);
    let a = body.keypoint(0).unwrap();
    assert!((a.x - 4.5).abs() < 1e-5 && (a.y - 4.5).abs() < 1e-5);

    let stray = &result.skeletons[1];
    assert_eq!(stray.num_parts(), 1);
    let a = stray.keypoint(0).unwrap();
    assert!((a.x - 24.5).abs() < 1e-5);

    // Same outcome on every run
    let again = parser.parse(cmap.view(), paf.view(), scale).unwrap();
    assert_eq!(again.skeletons, result.skeletons);
}

#[test]
fn test_scale_invariance() {
    let parser = human_parser(ParseConfig::default());
    let (cmap, paf) = two_people();

    let base = parser
        .parse(cmap.view(), paf.view(), Scale::uniform(4.0).unwrap())
        .unwrap();
    let scaled = parser
        .parse(cmap.view(), paf.view(), Scale::uniform(12.0).unwrap())
        .unwrap();

    assert_eq!(base.len(), scaled.len());
    for (a, b) in base.skeletons.iter().zip(&scaled.skeletons) {
        assert_eq!(a.parts, b.parts);
        for (ka, kb) in a.keypoints.iter().zip(&b.keypoints) {
            match (ka, kb) {
                (Some(ka), Some(kb)) => {
                    assert!((kb.x - 3.0 * ka.x).abs() < 1e-3);
                    assert!((kb.y - 3.0 * ka.y).abs() < 1e-3);
                }
                (None, None) => {}
                _ => panic!("assignment changed with scale"),
            }
        }
    }
}

#[test]
fn test_min_assigned_parts_filters_fragments() {
    let (mut cmap, paf) = two_people();
    add_blob(&mut cmap, 0, (25.0, 30.0), 0.6);

    let loose = human_parser(ParseConfig::default())
        .parse(cmap.view(), paf.view(), Scale::uniform(1.0).unwrap())
        .unwrap();
    assert_eq!(loose.len(), 3);

    let strict = human_parser(ParseConfig::default().with_min_assigned_parts(5))
        .parse(cmap.view(), paf.view(), Scale::uniform(1.0).unwrap())
        .unwrap();
    assert_eq!(strict.len(), 2);
}

#[test]
fn test_shape_mismatch_errors() {
    let parser = human_parser(ParseConfig::default());
    let scale = Scale::uniform(1.0).unwrap();

    let cmap = Array3::<f32>::zeros((17, 10, 10));
    let paf = Array3::<f32>::zeros((42, 10, 10));
    let err = parser.parse(cmap.view(), paf.view(), scale).unwrap_err();
    assert!(matches!(err, PoseError::ShapeMismatch(_)));

    let cmap = Array3::<f32>::zeros((18, 10, 10));
    let paf = Array3::<f32>::zeros((42, 10, 12));
    assert!(matches!(
        parser.parse(cmap.view(), paf.view(), scale),
        Err(PoseError::ShapeMismatch(_))
    ));
}

#[test]
fn test_batch_matches_single_images() {
    let parser = human_parser(ParseConfig::default());
    let (cmap, paf) = two_people();
    let scale = Scale::uniform(4.0).unwrap();

    let mut batch_cmap = Array4::<f32>::zeros((2, 18, 36, 64));
    let mut batch_paf = Array4::<f32>::zeros((2, 42, 36, 64));
    batch_cmap.slice_mut(s![1, .., .., ..]).assign(&cmap);
    batch_paf.slice_mut(s![1, .., .., ..]).assign(&paf);

    let results = parser
        .parse_batch(batch_cmap.view(), batch_paf.view(), scale)
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_empty());

    let single = parser.parse(cmap.view(), paf.view(), scale).unwrap();
    assert_eq!(results[1].skeletons, single.skeletons);
    assert_eq!(results[1].keypoints_array(), single.keypoints_array());
}

#[test]
fn test_config_errors_at_construction() {
    let topology = Topology::human_pose();
    for config in [
        ParseConfig::default().with_cmap_threshold(-0.5),
        ParseConfig::default().with_line_integral_samples(0),
        ParseConfig::default().with_window_radius(0),
    ] {
        assert!(matches!(
            PoseParser::new(topology.clone(), config),
            Err(PoseError::ConfigError(_))
        ));
    }
}

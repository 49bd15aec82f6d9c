//! End-to-end engine scenarios over synthetic atom clouds

use atomshift_core::{AtomPoint, ClusteringParams, HierarchyController, PointSet};
use rand::prelude::*;
use rand_distr::Normal;
use std::path::PathBuf;

fn params() -> ClusteringParams {
    ClusteringParams {
        input_file: PathBuf::from("dump.atoms"),
        output_dir: PathBuf::from("out"),
        min_atoms: 10,
        max_iterations: 5,
        n_clusters_per_level: None,
        silhouette_threshold: 0.5,
        davies_bouldin_threshold: 1.0,
        dispersion_threshold: None,
        quantile: 0.3,
        limpiar_intermedios: true,
        max_runtime_secs: None,
    }
}

/// Gaussian blob of `n` atoms around `center`
fn blob(rng: &mut StdRng, center: [f64; 3], std_dev: f64, n: usize, first_id: i64) -> Vec<AtomPoint> {
    let normal = Normal::new(0.0, std_dev).unwrap();
    (0..n)
        .map(|i| AtomPoint {
            id: first_id + i as i64,
            species: 1,
            coords: (0..3).map(|d| center[d] + rng.sample(normal)).collect(),
        })
        .collect()
}

fn two_blob_set() -> PointSet {
    let mut rng = StdRng::seed_from_u64(42);
    let mut atoms = blob(&mut rng, [0.0, 0.0, 0.0], 1.0, 50, 1);
    atoms.extend(blob(&mut rng, [60.0, 0.0, 0.0], 1.0, 80, 51));
    PointSet::from_points(atoms).unwrap()
}

#[test]
fn two_separated_blobs_yield_two_quality_clusters() {
    let points = two_blob_set();
    let controller = HierarchyController::new(params()).unwrap();
    let result = controller.run(&points).unwrap();

    assert_eq!(result.clusters_finales.len(), 2);
    assert_eq!(result.total_atoms(), 130);
    for f in &result.clusters_finales {
        assert_eq!(f.record.reason, "quality thresholds met");
    }

    let mut atoms: Vec<u64> = result
        .clusters_finales
        .iter()
        .map(|f| f.record.atoms)
        .collect();
    atoms.sort_unstable();
    assert_eq!(atoms, vec![50, 80]);
}

#[test]
fn undersized_input_accepts_the_root() {
    let mut rng = StdRng::seed_from_u64(7);
    let atoms = blob(&mut rng, [0.0, 0.0, 0.0], 1.0, 5, 1);
    let points = PointSet::from_points(atoms).unwrap();

    let controller = HierarchyController::new(params()).unwrap();
    let result = controller.run(&points).unwrap();

    assert_eq!(result.clusters_finales.len(), 1);
    assert_eq!(result.total_atoms(), 5);
    let record = &result.clusters_finales[0].record;
    assert_eq!(record.level, 0);
    assert_eq!(record.reason, "minimum atom count reached");
}

#[test]
fn diffuse_blob_with_tight_budget_accepts_at_deepest_level() {
    let mut rng = StdRng::seed_from_u64(99);
    let atoms = blob(&mut rng, [0.0, 0.0, 0.0], 5.0, 100, 1);
    let points = PointSet::from_points(atoms).unwrap();

    let mut p = params();
    p.max_iterations = 2;
    p.silhouette_threshold = 0.99;
    p.davies_bouldin_threshold = 1e-3;
    p.quantile = 0.8;
    let controller = HierarchyController::new(p).unwrap();
    let result = controller.run(&points).unwrap();

    assert_eq!(result.clusters_finales.len(), 1);
    let record = &result.clusters_finales[0].record;
    assert!(
        record.reason == "maximum iterations reached"
            || record.reason == "no further separation found",
        "unexpected reason: {}",
        record.reason
    );
    assert!(record.level <= 1);
    assert_eq!(result.total_atoms(), 100);
}

#[test]
fn atom_counts_are_conserved_and_sized() {
    let points = two_blob_set();
    let controller = HierarchyController::new(params()).unwrap();
    let result = controller.run(&points).unwrap();

    // Conservation: accepted clusters cover every atom exactly once
    let mut covered: Vec<usize> = result
        .clusters_finales
        .iter()
        .flat_map(|f| result.tree.node(f.node).indices.clone())
        .collect();
    covered.sort_unstable();
    assert_eq!(covered, (0..points.len()).collect::<Vec<_>>());
    assert_eq!(result.total_atoms() as usize, points.len());

    // Minimum-size invariant: only the root may dip below min_atoms
    for f in &result.clusters_finales {
        assert!(f.record.atoms >= 10 || f.record.level == 0);
    }
}

#[test]
fn depth_bound_holds_under_unreachable_thresholds() {
    let points = two_blob_set();
    let mut p = params();
    p.min_atoms = 2;
    p.max_iterations = 3;
    p.silhouette_threshold = 0.999;
    p.davies_bouldin_threshold = 1e-9;
    let controller = HierarchyController::new(p).unwrap();
    let result = controller.run(&points).unwrap();

    for f in &result.clusters_finales {
        assert!(f.record.level <= 2, "level {} exceeds bound", f.record.level);
    }
    assert_eq!(result.total_atoms(), 130);
}

#[test]
fn repeated_invocations_are_deterministic() {
    let points = two_blob_set();
    let controller = HierarchyController::new(params()).unwrap();

    let a = controller.run(&points).unwrap();
    let b = controller.run(&points).unwrap();

    let summary = |r: &atomshift_core::ClusteringResult| {
        r.clusters_finales
            .iter()
            .map(|f| {
                (
                    f.record.name.clone(),
                    f.record.atoms,
                    f.record.level,
                    f.record.reason.clone(),
                )
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&a), summary(&b));
}

#[test]
fn generous_wall_clock_budget_leaves_the_run_untouched() {
    let points = two_blob_set();
    let mut p = params();
    p.max_runtime_secs = Some(3600);
    let controller = HierarchyController::new(p).unwrap();
    let result = controller.run(&points).unwrap();
    assert_eq!(result.total_atoms(), 130);
}

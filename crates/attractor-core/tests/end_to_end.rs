// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — End-to-End Tests
// ─────────────────────────────────────────────────────────────────────

use attractor_core::{
    AttractorSearch, RayonPool, RenderPipeline, RenderSettings, Sequential, TrajectoryCompute,
};
use attractor_dynamics::ncoeffs;
use attractor_types::{AttractorError, RenderMode, Trajectory};

fn render_settings(shard_count: usize, mode: RenderMode) -> RenderSettings {
    RenderSettings {
        width: 600,
        height: 400,
        shard_count,
        mode,
        ..RenderSettings::default()
    }
}

#[test]
fn test_discover_compute_render_d2_seed1() {
    let search = AttractorSearch::new(2, 2000).unwrap();
    let found = search.discover(Some(1)).unwrap();
    assert_eq!(found.seed, 1);
    assert_eq!(found.coefficients.len(), ncoeffs(2));

    let pool = RayonPool::new(4).unwrap();
    let trajectory = TrajectoryCompute::new(&pool)
        .with_seed(found.seed)
        .compute(&found.coefficients, 1_000_000, 2)
        .unwrap();
    assert_eq!(trajectory.len(), 1_000_000);
    assert!(trajectory.last().unwrap().iter().all(|v| v.is_finite()));

    let image = RenderPipeline::new(render_settings(4, RenderMode::Auto), &pool)
        .unwrap()
        .render(&trajectory)
        .unwrap();
    assert_eq!(image.shape(), (400, 600, 3));
    assert!(image.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    assert_eq!(image.to_rgb8().len(), 400 * 600 * 3);
}

#[test]
fn test_discover_is_deterministic_across_dimensions() {
    for d in 2..=4 {
        let search = AttractorSearch::new(d, 2000).unwrap();
        let a = search.discover(Some(17)).unwrap();
        let b = search.discover(Some(17)).unwrap();
        assert_eq!(a.coefficients, b.coefficients, "d={d}");
        assert_eq!(a.coefficients.len(), ncoeffs(d));
    }
}

#[test]
fn test_one_vs_six_shards_render_equal() {
    let found = AttractorSearch::new(2, 2000).unwrap().discover(Some(1)).unwrap();
    let trajectory = TrajectoryCompute::new(&Sequential)
        .with_seed(5)
        .compute(&found.coefficients, 200_000, 2)
        .unwrap();

    let pool = RayonPool::new(6).unwrap();
    let one = RenderPipeline::new(render_settings(1, RenderMode::OnePass), &pool)
        .unwrap()
        .render(&trajectory)
        .unwrap();
    let six = RenderPipeline::new(render_settings(6, RenderMode::Sharded), &pool)
        .unwrap()
        .render(&trajectory)
        .unwrap();
    assert!(one.max_abs_diff(&six).unwrap() < 1e-6);
}

#[test]
fn test_sharded_compute_keeps_length() {
    let found = AttractorSearch::new(2, 2000).unwrap().discover(Some(1)).unwrap();
    let pool = RayonPool::new(6).unwrap();
    let trajectory = TrajectoryCompute::new(&pool)
        .with_seed(9)
        .with_shard_count(6)
        .compute(&found.coefficients, 120_000, 2)
        .unwrap();
    assert_eq!(trajectory.len(), 120_000);
    assert_eq!(trajectory.width(), 3);
    assert!(trajectory.terminal_is_finite());
}

#[test]
fn test_persisted_trajectory_renders_identically() {
    let found = AttractorSearch::new(2, 2000).unwrap().discover(Some(1)).unwrap();
    let trajectory = TrajectoryCompute::new(&Sequential)
        .with_seed(3)
        .compute(&found.coefficients, 50_000, 2)
        .unwrap();

    let mut buf = Vec::new();
    trajectory.write_to(&mut buf).unwrap();
    let restored = Trajectory::read_from(buf.as_slice()).unwrap();
    assert_eq!(restored, trajectory);

    let pipeline =
        RenderPipeline::new(render_settings(1, RenderMode::OnePass), &Sequential).unwrap();
    assert_eq!(
        pipeline.render(&trajectory).unwrap(),
        pipeline.render(&restored).unwrap()
    );
}

#[test]
fn test_constant_trajectory_cannot_render() {
    let mut trajectory = Trajectory::with_capacity(2, 20_000);
    for _ in 0..20_000 {
        trajectory.push(&[0.5, 0.5, 0.5]);
    }
    let result = RenderPipeline::new(render_settings(1, RenderMode::Auto), &Sequential)
        .unwrap()
        .render(&trajectory);
    assert!(matches!(result, Err(AttractorError::DegenerateBounds { .. })));
}

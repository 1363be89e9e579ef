// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Trajectory Computation
// ─────────────────────────────────────────────────────────────────────
//! Full-length iteration with a cheap pre-flight check.
//!
//! 1. Run `render_iterations · check_ratio` steps and inspect the final
//!    state; bail out with `DivergedOrCollapsed` before the expensive run.
//! 2. Run the full length, either once or split across shards. Shards
//!    are independent trajectories of the same map, each from its own
//!    freshly sampled initial state, joined in submission order.

use std::time::Instant;

use attractor_dynamics::{run, run_final, PolynomialMap};
use attractor_types::{AttractorConfig, AttractorError, AttractorResult, Trajectory};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::parallel::ParallelMap;
use crate::search::sample_initial_state;

/// Split `total` rows across `shards` as evenly as possible.
///
/// The first `total % shards` shards get one extra row.
pub fn shard_lengths(total: usize, shards: usize) -> Vec<usize> {
    let shards = shards.max(1);
    let base = total / shards;
    let extra = total % shards;
    (0..shards).map(|i| base + usize::from(i < extra)).collect()
}

pub struct TrajectoryCompute<'a, P: ParallelMap> {
    pool: &'a P,
    check_ratio: f64,
    shard_count: usize,
    seed: Option<u64>,
}

impl<'a, P: ParallelMap> TrajectoryCompute<'a, P> {
    pub fn new(pool: &'a P) -> Self {
        Self {
            pool,
            check_ratio: 0.01,
            shard_count: 1,
            seed: None,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    pub fn from_config(pool: &'a P, config: &AttractorConfig) -> Self {
        Self::new(pool)
            .with_check_ratio(config.check_ratio)
            .with_shard_count(config.shard_count)
    }

    pub fn with_check_ratio(mut self, check_ratio: f64) -> Self {
        self.check_ratio = check_ratio;
        self
    }

    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Seed the generator that draws initial states.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn compute(
        &self,
        coefficients: &[f64],
        render_iterations: usize,
        dimension: usize,
    ) -> AttractorResult<Trajectory> {
        if render_iterations == 0 {
            return Err(AttractorError::Validation(
                "render_iterations must be > 0".to_string(),
            ));
        }
        if !(self.check_ratio > 0.0 && self.check_ratio <= 1.0) {
            return Err(AttractorError::Validation(format!(
                "check_ratio must be in (0, 1], got {}",
                self.check_ratio
            )));
        }
        let mut map = PolynomialMap::new(dimension, coefficients.to_vec())?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Pre-flight check
        let check_steps = ((render_iterations as f64 * self.check_ratio) as usize).max(1);
        let x0 = sample_initial_state(&mut rng, dimension);
        let probe = run_final(&mut map, check_steps, &x0)?;
        if probe.iter().any(|v| !v.is_finite()) {
            log::error!("Pre-flight check diverged after {check_steps} steps");
            return Err(AttractorError::DivergedOrCollapsed(format!(
                "pre-flight check diverged after {check_steps} steps"
            )));
        }

        let shards = self.shard_count.clamp(1, render_iterations);
        let start = Instant::now();
        let trajectory = if shards == 1 {
            let x0 = sample_initial_state(&mut rng, dimension);
            let trajectory = run(&mut map, render_iterations, &x0)?;
            if !trajectory.terminal_is_finite() {
                return Err(AttractorError::DivergedOrCollapsed(
                    "full trajectory diverged".to_string(),
                ));
            }
            trajectory
        } else {
            let jobs: Vec<(u64, usize)> = shard_lengths(render_iterations, shards)
                .into_iter()
                .map(|len| (rng.gen::<u64>(), len))
                .collect();
            let parts = self.pool.map(jobs, |index, (shard_seed, len)| {
                let mut shard_rng = StdRng::seed_from_u64(shard_seed);
                let x0 = sample_initial_state(&mut shard_rng, dimension);
                let mut shard_map = PolynomialMap::new(dimension, coefficients.to_vec())?;
                let part = run(&mut shard_map, len, &x0)?;
                if !part.terminal_is_finite() {
                    return Err(AttractorError::DivergedOrCollapsed(format!(
                        "shard {index} diverged"
                    )));
                }
                Ok(part)
            })?;
            Trajectory::concat(parts)?
        };

        let secs = start.elapsed().as_secs_f64();
        log::info!(
            "Iteration: {} steps in {:.2}s ({:.2} M it/s, {} shard(s))",
            render_iterations,
            secs,
            render_iterations as f64 / secs.max(1e-9) / 1e6,
            shards
        );
        Ok(trajectory)
    }
}

#[cfg(test)]
mod tests {
    use attractor_dynamics::ncoeffs;

    use super::*;
    use crate::parallel::{RayonPool, Sequential};

    /// Hénon map in the bias-extended layout.
    fn henon() -> Vec<f64> {
        let mut c = vec![0.0; ncoeffs(2)];
        c[0] = 1.0; // x': constant
        c[3] = -1.4; // x': x²
        c[2] = 1.0; // x': y
        c[10 + 1] = 0.3; // y': x
        c
    }

    #[test]
    fn test_shard_lengths() {
        assert_eq!(shard_lengths(12, 6), vec![2; 6]);
        assert_eq!(shard_lengths(10, 4), vec![3, 3, 2, 2]);
        assert_eq!(shard_lengths(10, 4).iter().sum::<usize>(), 10);
        assert_eq!(shard_lengths(5, 0), vec![5]);
    }

    #[test]
    fn test_default_is_single_shard() {
        let pool = RayonPool::new(3).unwrap();
        assert_eq!(TrajectoryCompute::new(&pool).shard_count(), 1);
        let cfg = AttractorConfig::default();
        assert_eq!(
            TrajectoryCompute::from_config(&pool, &cfg).shard_count(),
            cfg.shard_count
        );
    }

    #[test]
    fn test_single_shard_length() {
        let out = TrajectoryCompute::new(&Sequential)
            .with_seed(1)
            .compute(&henon(), 10_000, 2)
            .unwrap();
        assert_eq!(out.len(), 10_000);
        assert!(out.terminal_is_finite());
    }

    #[test]
    fn test_sharded_length_matches() {
        let pool = RayonPool::new(6).unwrap();
        let one = TrajectoryCompute::new(&pool)
            .with_seed(2)
            .with_shard_count(1)
            .compute(&henon(), 60_000, 2)
            .unwrap();
        let six = TrajectoryCompute::new(&pool)
            .with_seed(2)
            .with_shard_count(6)
            .compute(&henon(), 60_000, 2)
            .unwrap();
        assert_eq!(one.len(), 60_000);
        assert_eq!(six.len(), 60_000);
        assert!(six.terminal_is_finite());
    }

    #[test]
    fn test_uneven_shards_keep_total() {
        let out = TrajectoryCompute::new(&Sequential)
            .with_seed(3)
            .with_shard_count(7)
            .compute(&henon(), 10_001, 2)
            .unwrap();
        assert_eq!(out.len(), 10_001);
    }

    #[test]
    fn test_seeded_compute_is_reproducible() {
        let pool = RayonPool::new(3).unwrap();
        let run = || {
            TrajectoryCompute::new(&pool)
                .with_seed(11)
                .with_shard_count(3)
                .compute(&henon(), 3_000, 2)
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_divergent_map_fails_preflight() {
        let mut c = vec![0.0; ncoeffs(2)];
        c[0] = 2.0; // x' = 2 + 2x³ escapes immediately
        c[6] = 2.0;
        c[10 + 1] = 1.0;
        let result = TrajectoryCompute::new(&Sequential)
            .with_seed(1)
            .compute(&c, 100_000, 2);
        assert!(matches!(result, Err(AttractorError::DivergedOrCollapsed(_))));
    }

    #[test]
    fn test_bad_inputs() {
        let compute = TrajectoryCompute::new(&Sequential);
        assert!(compute.compute(&henon(), 0, 2).is_err());
        assert!(compute.compute(&henon()[..17], 100, 2).is_err());
        assert!(compute
            .with_check_ratio(0.0)
            .compute(&henon(), 100, 2)
            .is_err());
    }
}

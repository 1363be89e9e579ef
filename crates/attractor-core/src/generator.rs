// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — End-to-End Generator
// ─────────────────────────────────────────────────────────────────────
//! search → compute → render behind one call.
//!
//! The seed that drove the search also seeds the initial states of the
//! full trajectory, so `(dimension, seed)` reproduces the whole image.

use std::time::Instant;

use attractor_types::{
    AttractorConfig, AttractorError, AttractorResult, Raster, Trajectory, MAX_DIMENSION,
    MIN_DIMENSION,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::compute::TrajectoryCompute;
use crate::parallel::{ParallelMap, RayonPool};
use crate::render::{RenderPipeline, RenderSettings};
use crate::search::{AttractorSearch, Discovery, SEED_RANGE};

/// One finished attractor.
#[derive(Debug, Clone)]
pub struct GeneratedAttractor {
    pub discovery: Discovery,
    pub image: Raster,
    pub elapsed_ms: u64,
}

impl GeneratedAttractor {
    pub fn dimension(&self) -> usize {
        self.discovery.dimension
    }

    pub fn seed(&self) -> u64 {
        self.discovery.seed
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.discovery.coefficients
    }
}

pub struct AttractorGenerator<P: ParallelMap = RayonPool> {
    config: AttractorConfig,
    pool: P,
}

impl AttractorGenerator<RayonPool> {
    /// Generator backed by a rayon pool of `config.shard_count` threads.
    pub fn new(config: AttractorConfig) -> AttractorResult<Self> {
        config.validate()?;
        let pool = RayonPool::new(config.shard_count)?;
        Ok(Self { config, pool })
    }
}

impl<P: ParallelMap> AttractorGenerator<P> {
    pub fn with_pool(config: AttractorConfig, pool: P) -> AttractorResult<Self> {
        config.validate()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &AttractorConfig {
        &self.config
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn search(&self, dimension: usize, seed: Option<u64>) -> AttractorResult<Discovery> {
        AttractorSearch::from_config(&self.config, dimension)?.discover(seed)
    }

    pub fn compute(&self, discovery: &Discovery) -> AttractorResult<Trajectory> {
        TrajectoryCompute::from_config(&self.pool, &self.config)
            .with_seed(discovery.seed)
            .compute(
                &discovery.coefficients,
                self.config.render_iterations,
                discovery.dimension,
            )
    }

    pub fn render(&self, trajectory: &Trajectory) -> AttractorResult<Raster> {
        RenderPipeline::new(RenderSettings::from_config(&self.config), &self.pool)?
            .render(trajectory)
    }

    /// Full pipeline. A missing dimension is drawn from 2..=7, from the
    /// seed when one is given.
    pub fn generate(
        &self,
        dimension: Option<usize>,
        seed: Option<u64>,
    ) -> AttractorResult<GeneratedAttractor> {
        let start = Instant::now();
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen_range(SEED_RANGE));
        let dimension = match dimension {
            Some(d) => d,
            None => StdRng::seed_from_u64(seed).gen_range(MIN_DIMENSION..=MAX_DIMENSION),
        };

        let discovery = self.search(dimension, Some(seed))?;
        let trajectory = self.compute(&discovery)?;
        let image = self.render(&trajectory)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "Generated d={dimension} seed={seed} in {:.1}s",
            elapsed_ms as f64 / 1000.0
        );
        Ok(GeneratedAttractor {
            discovery,
            image,
            elapsed_ms,
        })
    }

    /// `count` generations with fresh seeds. Diverged or degenerate
    /// results are skipped, so fewer than `count` may come back.
    pub fn generate_many(
        &self,
        count: usize,
        dimension: Option<usize>,
    ) -> AttractorResult<Vec<GeneratedAttractor>> {
        let mut seeds = rand::thread_rng();
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let seed = seeds.gen_range(SEED_RANGE);
            match self.generate(dimension, Some(seed)) {
                Ok(generated) => out.push(generated),
                Err(
                    e @ (AttractorError::DivergedOrCollapsed(_)
                    | AttractorError::DegenerateBounds { .. }),
                ) => {
                    log::warn!("Skipping attractor {i} (seed={seed}): {e}");
                }
                Err(e) => return Err(e),
            }
        }
        log::info!("Batch: {}/{count} attractors generated", out.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::Sequential;

    fn small_config() -> AttractorConfig {
        AttractorConfig {
            render_iterations: 50_000,
            shard_count: 2,
            width: 90,
            height: 60,
            transient_skip: 1_000,
            ..AttractorConfig::default()
        }
    }

    #[test]
    fn test_generate_fixed_dimension() {
        let generator = AttractorGenerator::with_pool(small_config(), Sequential).unwrap();
        let out = generator.generate(Some(2), Some(1)).unwrap();
        assert_eq!(out.dimension(), 2);
        assert_eq!(out.seed(), 1);
        assert_eq!(out.coefficients().len(), 20);
        assert_eq!(out.image.shape(), (60, 90, 3));
        assert!(out.image.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_generate_is_reproducible() {
        let generator = AttractorGenerator::new(small_config()).unwrap();
        let a = generator.generate(Some(2), Some(7)).unwrap();
        let b = generator.generate(Some(2), Some(7)).unwrap();
        assert_eq!(a.discovery.coefficients, b.discovery.coefficients);
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn test_seeded_dimension_in_range() {
        let d = StdRng::seed_from_u64(3).gen_range(MIN_DIMENSION..=MAX_DIMENSION);
        assert!((MIN_DIMENSION..=MAX_DIMENSION).contains(&d));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AttractorConfig {
            shard_count: 0,
            ..AttractorConfig::default()
        };
        assert!(AttractorGenerator::with_pool(config, Sequential).is_err());
    }

    #[test]
    fn test_invalid_dimension_rejected() {
        let generator = AttractorGenerator::with_pool(small_config(), Sequential).unwrap();
        assert!(matches!(
            generator.generate(Some(9), Some(1)),
            Err(AttractorError::Validation(_))
        ));
    }

    #[test]
    fn test_generate_many_returns_at_most_count() {
        let generator = AttractorGenerator::with_pool(small_config(), Sequential).unwrap();
        let batch = generator.generate_many(2, Some(2)).unwrap();
        assert!(batch.len() <= 2);
        for g in &batch {
            assert_eq!(g.dimension(), 2);
        }
    }
}

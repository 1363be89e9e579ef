// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Attractor Search
// ─────────────────────────────────────────────────────────────────────
//! Rejection sampling over random coefficient tables:
//!
//!   SAMPLE → TRIAL_RUN → VALIDITY_CHECK → DENSITY_CHECK → ACCEPT | SAMPLE
//!
//! The generator is owned by each `discover` call and seeded from a
//! single integer, so a seed fully determines the candidates drawn.
//! `SearchLimits` caps the loop by attempts and wall-clock time.

use std::time::{Duration, Instant};

use attractor_dynamics::{ncoeffs, run, PolynomialMap};
use attractor_types::{AttractorConfig, AttractorError, AttractorResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::density::DensityClassifier;

/// Coefficients are drawn from the integers in [-STEPS, STEPS] ...
pub const COEFFICIENT_STEPS: i32 = 10;
/// ... and initial components uniformly from [-SPREAD, SPREAD).
pub const INITIAL_SPREAD: f64 = 0.1;
/// Range for seeds drawn when the caller supplies none.
pub const SEED_RANGE: std::ops::Range<u64> = 1..2_000_000_000;

/// Divisor applied to integer coefficient draws.
///
/// Grows with dimension so higher-dimensional maps diverge less often.
pub fn coefficient_scale(dimension: usize) -> f64 {
    10.0 + 2.0 * dimension as f64
}

/// Draw a coefficient table of length `ncoeffs(dimension)`.
pub fn sample_coefficients<R: Rng + ?Sized>(rng: &mut R, dimension: usize) -> Vec<f64> {
    let scale = coefficient_scale(dimension);
    (0..ncoeffs(dimension))
        .map(|_| rng.gen_range(-COEFFICIENT_STEPS..=COEFFICIENT_STEPS) as f64 / scale)
        .collect()
}

/// Draw a `dimension + 1` initial state near the origin.
pub fn sample_initial_state<R: Rng + ?Sized>(rng: &mut R, dimension: usize) -> Vec<f64> {
    (0..=dimension)
        .map(|_| rng.gen_range(-INITIAL_SPREAD..INITIAL_SPREAD))
        .collect()
}

/// Caps on one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchLimits {
    pub max_attempts: Option<u64>,
    pub timeout: Option<Duration>,
}

impl SearchLimits {
    /// No cap at all: the search runs until it finds an attractor.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AttractorConfig) -> Self {
        Self {
            max_attempts: config.search_max_attempts,
            timeout: config.search_timeout_ms.map(Duration::from_millis),
        }
    }

    fn exhausted(&self, attempts: u64, elapsed: Duration) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
            || self.timeout.is_some_and(|limit| elapsed >= limit)
    }
}

/// An accepted coefficient table and how it was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    pub dimension: usize,
    pub seed: u64,
    pub coefficients: Vec<f64>,
    pub initial_state: Vec<f64>,
    /// Candidates drawn, the accepted one included.
    pub attempts: u64,
    pub rejected_diverged: u64,
    pub rejected_sparse: u64,
    pub elapsed_ms: u64,
}

/// Rejection-sampling search for one dimension.
#[derive(Debug, Clone)]
pub struct AttractorSearch {
    dimension: usize,
    search_iterations: usize,
    classifier: DensityClassifier,
    limits: SearchLimits,
}

impl AttractorSearch {
    pub fn new(dimension: usize, search_iterations: usize) -> AttractorResult<Self> {
        AttractorConfig::validate_dimension(dimension)?;
        if search_iterations < 2 {
            return Err(AttractorError::Validation(format!(
                "search_iterations must be >= 2, got {search_iterations}"
            )));
        }
        Ok(Self {
            dimension,
            search_iterations,
            classifier: DensityClassifier::default(),
            limits: SearchLimits::default(),
        })
    }

    pub fn from_config(config: &AttractorConfig, dimension: usize) -> AttractorResult<Self> {
        Ok(Self::new(dimension, config.search_iterations)?
            .with_classifier(DensityClassifier::from_config(config))
            .with_limits(SearchLimits::from_config(config)))
    }

    pub fn with_classifier(mut self, classifier: DensityClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Search until a candidate passes both checks or the limits run out.
    ///
    /// Without a seed one is drawn from `SEED_RANGE` and reported back.
    pub fn discover(&self, seed: Option<u64>) -> AttractorResult<Discovery> {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen_range(SEED_RANGE));
        let mut rng = StdRng::seed_from_u64(seed);
        let start = Instant::now();

        let mut attempts = 0u64;
        let mut rejected_diverged = 0u64;
        let mut rejected_sparse = 0u64;

        loop {
            if self.limits.exhausted(attempts, start.elapsed()) {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                log::warn!(
                    "Search exhausted: d={} seed={seed} attempts={attempts} \
                     (diverged={rejected_diverged}, sparse={rejected_sparse})",
                    self.dimension
                );
                return Err(AttractorError::SearchExhausted {
                    attempts,
                    elapsed_ms,
                });
            }
            attempts += 1;

            // SAMPLE
            let coefficients = sample_coefficients(&mut rng, self.dimension);
            let initial_state = sample_initial_state(&mut rng, self.dimension);

            match self.evaluate(&coefficients, &initial_state) {
                Ok(()) => {
                    let elapsed = start.elapsed();
                    log::info!(
                        "Attractor found: d={} seed={seed} attempts={attempts} in {:.1}s",
                        self.dimension,
                        elapsed.as_secs_f64()
                    );
                    return Ok(Discovery {
                        dimension: self.dimension,
                        seed,
                        coefficients,
                        initial_state,
                        attempts,
                        rejected_diverged,
                        rejected_sparse,
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
                Err(AttractorError::DivergedOrCollapsed(reason)) => {
                    rejected_diverged += 1;
                    log::trace!("candidate {attempts} diverged: {reason}");
                }
                Err(e @ (AttractorError::SparseDensity { .. }
                | AttractorError::DegenerateBounds { .. })) => {
                    rejected_sparse += 1;
                    log::trace!("candidate {attempts} rejected: {e}");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// TRIAL_RUN, VALIDITY_CHECK and DENSITY_CHECK for one candidate.
    pub fn evaluate(&self, coefficients: &[f64], initial_state: &[f64]) -> AttractorResult<()> {
        let mut map = PolynomialMap::new(self.dimension, coefficients.to_vec())?;
        let trial = run(&mut map, self.search_iterations, initial_state)?;

        let last = trial.last().unwrap_or(initial_state);
        let tail = &last[last.len() - 2..];
        if tail.iter().any(|v| !v.is_finite()) {
            return Err(AttractorError::DivergedOrCollapsed(format!(
                "terminal state {tail:?}"
            )));
        }

        let xs = trial.column(0, 0);
        let ys = trial.column(1, 0);
        self.classifier.check(&xs, &ys)
    }
}

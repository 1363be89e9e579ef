// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{AttractorError, AttractorResult};

/// Smallest supported map dimension (the renderer projects three axes).
pub const MIN_DIMENSION: usize = 2;
/// Largest supported map dimension.
pub const MAX_DIMENSION: usize = 7;

/// How the render pipeline schedules the burn and composite phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// One pass below `one_pass_threshold` points, sharded above it.
    #[default]
    Auto,
    /// Always a single unsharded pass.
    OnePass,
    /// Always the two-phase sharded burn/composite.
    Sharded,
}

/// Runtime configuration for search, trajectory computation and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractorConfig {
    /// Iterations in each trial run during search.
    /// Default: 2000.
    pub search_iterations: usize,

    /// Candidate cap for one search. `None` searches forever.
    /// Default: 1,000,000.
    pub search_max_attempts: Option<u64>,

    /// Wall-clock cap for one search in milliseconds.
    /// Default: none.
    pub search_timeout_ms: Option<u64>,

    /// Side length of the square density-check raster.
    /// Default: 320.
    pub density_resolution: usize,

    /// Percentage of filled pixels a trial must exceed.
    /// Default: 1.5.
    pub min_fill_percent: f64,

    /// Trajectory length for the full computation.
    /// Default: 10,000,000.
    pub render_iterations: usize,

    /// Fraction of `render_iterations` run as the pre-flight check.
    /// Default: 0.01.
    pub check_ratio: f64,

    /// Parallel fan-out for computation and rendering.
    /// Default: 6.
    pub shard_count: usize,

    /// Output raster width in pixels.
    /// Default: 3508 (A4 landscape, 300 dpi).
    pub width: usize,

    /// Output raster height in pixels.
    /// Default: 2480.
    pub height: usize,

    /// Burn strength per trajectory point.
    /// Default: 0.025.
    pub alpha: f64,

    /// Uniform margin multiplier applied after aspect fitting.
    /// Default: 1.1.
    pub margin: f64,

    /// Leading rows dropped before rendering.
    /// Default: 10,000.
    pub transient_skip: usize,

    /// Point count above which `RenderMode::Auto` shards.
    /// Default: 10,000,000.
    pub one_pass_threshold: usize,

    /// Paper colour, RGB in [0, 1].
    /// Default: [0.9, 0.9, 0.85].
    pub background: [f64; 3],

    /// Per-channel burn multipliers.
    /// Default: [0.75, 1.0, 1.25].
    pub burn_factors: [f64; 3],

    /// Render scheduling.
    /// Default: Auto.
    pub render_mode: RenderMode,
}

impl Default for AttractorConfig {
    fn default() -> Self {
        Self {
            search_iterations: 2000,
            search_max_attempts: Some(1_000_000),
            search_timeout_ms: None,
            density_resolution: 320,
            min_fill_percent: 1.5,
            render_iterations: 10_000_000,
            check_ratio: 0.01,
            shard_count: 6,
            width: 3508,
            height: 2480,
            alpha: 0.025,
            margin: 1.1,
            transient_skip: 10_000,
            one_pass_threshold: 10_000_000,
            background: [0.9, 0.9, 0.85],
            burn_factors: [0.75, 1.0, 1.25],
            render_mode: RenderMode::Auto,
        }
    }
}

impl AttractorConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> AttractorResult<()> {
        if self.search_iterations < 2 {
            return Err(AttractorError::Config(format!(
                "search_iterations must be >= 2, got {}",
                self.search_iterations
            )));
        }
        if self.search_max_attempts == Some(0) {
            return Err(AttractorError::Config(
                "search_max_attempts must be > 0 when set".to_string(),
            ));
        }
        if self.density_resolution < 2 {
            return Err(AttractorError::Config(format!(
                "density_resolution must be >= 2, got {}",
                self.density_resolution
            )));
        }
        if !(self.min_fill_percent > 0.0 && self.min_fill_percent < 100.0) {
            return Err(AttractorError::Config(format!(
                "min_fill_percent must be in (0, 100), got {}",
                self.min_fill_percent
            )));
        }
        if self.render_iterations < 2 {
            return Err(AttractorError::Config(format!(
                "render_iterations must be >= 2, got {}",
                self.render_iterations
            )));
        }
        if !(self.check_ratio > 0.0 && self.check_ratio <= 1.0) {
            return Err(AttractorError::Config(format!(
                "check_ratio must be in (0, 1], got {}",
                self.check_ratio
            )));
        }
        if self.shard_count == 0 {
            return Err(AttractorError::Config(
                "shard_count must be > 0".to_string(),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(AttractorError::Config(format!(
                "raster must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(AttractorError::Config(format!(
                "alpha must be positive and finite, got {}",
                self.alpha
            )));
        }
        if !(self.margin.is_finite() && self.margin >= 1.0) {
            return Err(AttractorError::Config(format!(
                "margin must be >= 1, got {}",
                self.margin
            )));
        }
        if self
            .burn_factors
            .iter()
            .any(|f| !(f.is_finite() && *f > 0.0))
        {
            return Err(AttractorError::Config(format!(
                "burn_factors must be positive, got {:?}",
                self.burn_factors
            )));
        }
        if self.background.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(AttractorError::Config(format!(
                "background must be in [0, 1], got {:?}",
                self.background
            )));
        }
        Ok(())
    }

    /// Check that `dimension` is within the supported range.
    pub fn validate_dimension(dimension: usize) -> AttractorResult<()> {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&dimension) {
            return Err(AttractorError::Validation(format!(
                "dimension must be in [{MIN_DIMENSION}, {MAX_DIMENSION}], got {dimension}"
            )));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> AttractorResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AttractorError::Config(format!("JSON parse error: {e}")))
    }
}

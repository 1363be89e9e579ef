// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Render Pipeline
// ─────────────────────────────────────────────────────────────────────
//! Trajectory → shaded raster in four phases:
//!
//!   1. Bounds     x/y fitted to the raster aspect, z min/range for depth
//!   2. Deltas     |p[i+1] − p[i]| per axis and their maxima
//!   3. Burn       points darken a small pixel neighbourhood; shard
//!                 buffers start at one and are reduced by multiplication
//!   4. Composite  background × burn over row bands, summed, clipped
//!
//! Below `one_pass_threshold` points, phases 3–4 run as a single pass.
//! Both paths agree up to floating-point reduction order, because the
//! burn reduction is a product of per-point factors.
//!
//! Burn strength for point i (i ≥ 1):
//!
//!   depth  = a_min + (1 − a_min)·(z − zmin)/zrng
//!   speed  = mean(dx/max_dx, dy/max_dy, dz/max_dz)
//!   weight = alpha · depth / (1 + SPEED_GAIN · speed)
//!   s_c    = min(weight · burn_factor[c], 1)
//!
//! The hit pixel is scaled by (1 − s_c), its four neighbours by
//! (1 − s_c · NEIGHBOUR_WEIGHT).

use std::time::Instant;

use attractor_types::{
    AttractorConfig, AttractorError, AttractorResult, Raster, RenderMode, Trajectory, CHANNELS,
};
use serde::{Deserialize, Serialize};

use crate::bounds::{fit_aspect, AxisBounds, PlaneBounds};
use crate::parallel::ParallelMap;

/// Depth alpha at the far end of the z range.
pub const DEPTH_ALPHA_MIN: f64 = 0.25;
/// How strongly point speed suppresses burn.
pub const SPEED_GAIN: f64 = 4.0;
/// Burn share of the four orthogonal neighbours.
pub const NEIGHBOUR_WEIGHT: f64 = 0.25;

/// Everything the pipeline needs besides the trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub width: usize,
    pub height: usize,
    pub alpha: f64,
    pub shard_count: usize,
    pub margin: f64,
    pub transient_skip: usize,
    pub one_pass_threshold: usize,
    pub background: [f64; 3],
    pub burn_factors: [f64; 3],
    pub mode: RenderMode,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from_config(&AttractorConfig::default())
    }
}

impl RenderSettings {
    pub fn from_config(config: &AttractorConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            alpha: config.alpha,
            shard_count: config.shard_count,
            margin: config.margin,
            transient_skip: config.transient_skip,
            one_pass_threshold: config.one_pass_threshold,
            background: config.background,
            burn_factors: config.burn_factors,
            mode: config.render_mode,
        }
    }

    pub fn validate(&self) -> AttractorResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AttractorError::Config(format!(
                "raster must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.shard_count == 0 {
            return Err(AttractorError::Config(
                "shard_count must be > 0".to_string(),
            ));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(AttractorError::Config(format!(
                "alpha must be positive and finite, got {}",
                self.alpha
            )));
        }
        Ok(())
    }

    fn sharded(&self, points: usize) -> bool {
        match self.mode {
            RenderMode::OnePass => false,
            RenderMode::Sharded => true,
            RenderMode::Auto => points > self.one_pass_threshold,
        }
    }
}

/// `|data[i+1] − data[i]|`, one shorter than `data`.
pub fn deltas(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
}

/// Largest value, or 0 for an empty slice.
pub fn max_of(data: &[f64]) -> f64 {
    data.iter().copied().fold(0.0, f64::max)
}

/// Contiguous `[start, end)` ranges splitting `lo..hi` into `parts`.
pub fn partition(lo: usize, hi: usize, parts: usize) -> Vec<(usize, usize)> {
    let parts = parts.max(1);
    let span = hi.saturating_sub(lo);
    (0..parts)
        .map(|i| (lo + span * i / parts, lo + span * (i + 1) / parts))
        .collect()
}

/// Row bands for the composite phase: at most one per row.
pub fn composite_bands(height: usize, workers: usize) -> Vec<(usize, usize)> {
    partition(0, height, workers.clamp(1, height.max(1)))
}

/// Global scalars shared read-only by every burn worker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurnParams {
    pub width: usize,
    pub height: usize,
    pub bounds: PlaneBounds,
    pub z: AxisBounds,
    pub max_deltas: [f64; 3],
    pub alpha: f64,
    pub burn_factors: [f64; 3],
}

impl BurnParams {
    #[inline]
    fn depth(&self, z: f64) -> f64 {
        if self.z.range > 0.0 {
            DEPTH_ALPHA_MIN + (1.0 - DEPTH_ALPHA_MIN) * self.z.normalise(z)
        } else {
            1.0
        }
    }

    #[inline]
    fn speed(&self, d: [f64; 3]) -> f64 {
        let mut sum = 0.0;
        for (delta, max) in d.iter().zip(&self.max_deltas) {
            if *max > 0.0 {
                sum += delta / max;
            }
        }
        sum / 3.0
    }

    /// Per-channel burn strength for one point.
    #[inline]
    pub fn strength(&self, z: f64, d: [f64; 3]) -> [f64; 3] {
        let weight = self.alpha * self.depth(z) / (1.0 + SPEED_GAIN * self.speed(d));
        let mut s = [0.0; 3];
        for (out, factor) in s.iter_mut().zip(&self.burn_factors) {
            *out = (weight * factor).clamp(0.0, 1.0);
        }
        s
    }
}

/// Coordinates and aligned deltas for one contiguous run of points.
///
/// `dx[k]` is the step that arrived at point `xs[k]`.
#[derive(Debug, Clone, Copy)]
pub struct PointShard<'a> {
    pub xs: &'a [f64],
    pub ys: &'a [f64],
    pub zs: &'a [f64],
    pub dx: &'a [f64],
    pub dy: &'a [f64],
    pub dz: &'a [f64],
}

impl PointShard<'_> {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

/// Burn phase for one shard: a `height × width × 3` buffer seeded at one.
pub fn burn_points(shard: &PointShard<'_>, params: &BurnParams) -> Raster {
    let (w, h) = (params.width, params.height);
    let mut burn = Raster::ones(w, h);
    for k in 0..shard.len() {
        let (Some(col), Some(row)) = (
            params.bounds.x.index(shard.xs[k], w),
            params.bounds.y.index(shard.ys[k], h),
        ) else {
            continue;
        };
        let s = params.strength(shard.zs[k], [shard.dx[k], shard.dy[k], shard.dz[k]]);

        let centre = burn.pixel_mut(row, col);
        for c in 0..CHANNELS {
            centre[c] *= 1.0 - s[c];
        }
        let neighbours = [
            (row.wrapping_sub(1), col),
            (row + 1, col),
            (row, col.wrapping_sub(1)),
            (row, col + 1),
        ];
        for (r, cl) in neighbours {
            if r < h && cl < w {
                let px = burn.pixel_mut(r, cl);
                for c in 0..CHANNELS {
                    px[c] *= 1.0 - s[c] * NEIGHBOUR_WEIGHT;
                }
            }
        }
    }
    burn
}

/// Composite phase for rows `[row_start, row_end)`: background × burn.
pub fn composite_rows(
    burn: &Raster,
    row_start: usize,
    row_end: usize,
    background: [f64; 3],
) -> Vec<f64> {
    burn.rows(row_start, row_end)
        .chunks_exact(CHANNELS)
        .flat_map(|px| (0..CHANNELS).map(move |c| background[c] * px[c]))
        .collect()
}

/// Projected axes, bounds and deltas for one trajectory.
#[derive(Debug, Clone)]
pub struct PreparedRender {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub zs: Vec<f64>,
    pub dx: Vec<f64>,
    pub dy: Vec<f64>,
    pub dz: Vec<f64>,
    pub params: BurnParams,
}

impl PreparedRender {
    /// Number of burned points (every projected point except the first).
    pub fn points(&self) -> usize {
        self.dx.len()
    }

    /// Points `[start, end)` of the burn range, `1 <= start <= end <= len`.
    pub fn shard(&self, start: usize, end: usize) -> PointShard<'_> {
        PointShard {
            xs: &self.xs[start..end],
            ys: &self.ys[start..end],
            zs: &self.zs[start..end],
            dx: &self.dx[start - 1..end - 1],
            dy: &self.dy[start - 1..end - 1],
            dz: &self.dz[start - 1..end - 1],
        }
    }
}

pub struct RenderPipeline<'a, P: ParallelMap> {
    settings: RenderSettings,
    pool: &'a P,
}

impl<'a, P: ParallelMap> RenderPipeline<'a, P> {
    pub fn new(settings: RenderSettings, pool: &'a P) -> AttractorResult<Self> {
        settings.validate()?;
        Ok(Self { settings, pool })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Phases 1–2: project, fit bounds, compute deltas.
    ///
    /// Fails with `DegenerateBounds` if any fitted range is unusable.
    pub fn prepare(&self, trajectory: &Trajectory) -> AttractorResult<PreparedRender> {
        let s = &self.settings;
        let width = trajectory.width();
        if width < 3 {
            return Err(AttractorError::Validation(format!(
                "rendering needs at least 3 components per state, got {width}"
            )));
        }
        let len = trajectory.len();
        if len < 2 {
            return Err(AttractorError::Validation(format!(
                "rendering needs at least 2 states, got {len}"
            )));
        }
        let skip = s.transient_skip.min(len - 2);
        if skip < s.transient_skip {
            log::warn!(
                "transient_skip {} clamped to {skip} for a {len}-state trajectory",
                s.transient_skip
            );
        }

        let start = Instant::now();
        let xs = trajectory.column(width - 3, skip);
        let ys = trajectory.column(width - 2, skip);
        let zs = trajectory.column(width - 1, skip);

        let bounds = fit_aspect(&xs, &ys, s.width, s.height, s.margin)?;
        bounds.validate()?;
        let z = AxisBounds::of(&zs)?;
        if !(z.min.is_finite() && z.range.is_finite()) {
            return Err(AttractorError::DegenerateBounds {
                axis: "z",
                range: z.range,
            });
        }
        log::debug!(
            "bounds: x=[{:.4}, +{:.4}] y=[{:.4}, +{:.4}] z=[{:.4}, +{:.4}] ({:.2}s)",
            bounds.x.min,
            bounds.x.range,
            bounds.y.min,
            bounds.y.range,
            z.min,
            z.range,
            start.elapsed().as_secs_f64()
        );

        let start = Instant::now();
        let dx = deltas(&xs);
        let dy = deltas(&ys);
        let dz = deltas(&zs);
        let max_deltas = [max_of(&dx), max_of(&dy), max_of(&dz)];
        log::debug!(
            "deltas: max={max_deltas:?} ({:.2}s)",
            start.elapsed().as_secs_f64()
        );

        Ok(PreparedRender {
            params: BurnParams {
                width: s.width,
                height: s.height,
                bounds,
                z,
                max_deltas,
                alpha: s.alpha,
                burn_factors: s.burn_factors,
            },
            xs,
            ys,
            zs,
            dx,
            dy,
            dz,
        })
    }

    pub fn render(&self, trajectory: &Trajectory) -> AttractorResult<Raster> {
        let start = Instant::now();
        let prepared = self.prepare(trajectory)?;
        let image = if self.settings.sharded(prepared.points()) {
            self.render_sharded(&prepared)?
        } else {
            self.render_one_pass(&prepared)?
        };
        log::info!(
            "Render: {} points -> {}x{} in {:.2}s",
            prepared.points(),
            self.settings.width,
            self.settings.height,
            start.elapsed().as_secs_f64()
        );
        Ok(image)
    }

    /// Phases 3–4 over every point and every row at once.
    pub fn render_one_pass(&self, prepared: &PreparedRender) -> AttractorResult<Raster> {
        log::info!("One-pass render");
        let s = &self.settings;
        let burn = burn_points(&prepared.shard(1, prepared.xs.len()), &prepared.params);
        let mut image = Raster::zeros(s.width, s.height);
        image.add_rows(0, &composite_rows(&burn, 0, s.height, s.background))?;
        image.clip();
        Ok(image)
    }

    /// Phases 3–4 as two parallel map-reduce rounds.
    pub fn render_sharded(&self, prepared: &PreparedRender) -> AttractorResult<Raster> {
        let s = &self.settings;
        log::info!("Multi-pass render across {} shard(s)", s.shard_count);

        let start = Instant::now();
        let ranges = partition(1, prepared.xs.len(), s.shard_count);
        let params = prepared.params;
        let shards = self.pool.map(ranges, |_, (lo, hi)| {
            Ok(burn_points(&prepared.shard(lo, hi), &params))
        })?;
        let mut burn = Raster::ones(s.width, s.height);
        for shard in &shards {
            burn.multiply_assign(shard)?;
        }
        drop(shards);
        log::info!("Burn phase: {:.2}s", start.elapsed().as_secs_f64());

        let start = Instant::now();
        // One row band per pool worker.
        let bands = composite_bands(s.height, self.pool.fan_out());
        let background = s.background;
        let burn_ref = &burn;
        let pixels = self.pool.map(bands.clone(), |_, (r0, r1)| {
            Ok(composite_rows(burn_ref, r0, r1, background))
        })?;
        let mut image = Raster::zeros(s.width, s.height);
        for ((r0, _), band) in bands.iter().zip(&pixels) {
            image.add_rows(*r0, band)?;
        }
        image.clip();
        log::info!("Composite phase: {:.2}s", start.elapsed().as_secs_f64());
        Ok(image)
    }
}

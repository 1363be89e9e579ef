// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Density Classifier
// ─────────────────────────────────────────────────────────────────────
//! Low-resolution occupancy test. A candidate is attractor-like when
//! its x/y projection fills more than `min_fill_percent` of a square
//! raster; points, lines and thin curves fall below it.

use attractor_types::{AttractorConfig, AttractorError, AttractorResult};

use crate::bounds::{fit_aspect, DEFAULT_MARGIN};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityClassifier {
    pub resolution: usize,
    pub min_fill_percent: f64,
    pub margin: f64,
}

impl Default for DensityClassifier {
    fn default() -> Self {
        Self {
            resolution: 320,
            min_fill_percent: 1.5,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl DensityClassifier {
    pub fn new(resolution: usize, min_fill_percent: f64) -> Self {
        Self {
            resolution,
            min_fill_percent,
            ..Self::default()
        }
    }

    pub fn from_config(config: &AttractorConfig) -> Self {
        Self {
            resolution: config.density_resolution,
            min_fill_percent: config.min_fill_percent,
            margin: config.margin,
        }
    }

    /// Count distinct visited pixels.
    ///
    /// Fails with `DegenerateBounds` when the fitted window is unusable
    /// or any point maps off the raster.
    pub fn filled_pixels(&self, xs: &[f64], ys: &[f64]) -> AttractorResult<usize> {
        let res = self.resolution;
        let bounds = fit_aspect(xs, ys, res, res, self.margin)?;
        bounds.validate()?;

        let mut visits = vec![0u32; res * res];
        let mut filled = 0usize;
        for (&x, &y) in xs.iter().zip(ys) {
            let (Some(col), Some(row)) = (bounds.x.index(x, res), bounds.y.index(y, res)) else {
                return Err(AttractorError::DegenerateBounds {
                    axis: "xy",
                    range: f64::NAN,
                });
            };
            let cell = &mut visits[row * res + col];
            if *cell == 0 {
                filled += 1;
            }
            *cell = cell.saturating_add(1);
        }
        Ok(filled)
    }

    /// Percentage of the raster visited at least once.
    pub fn fill_percent(&self, xs: &[f64], ys: &[f64]) -> AttractorResult<f64> {
        let filled = self.filled_pixels(xs, ys)?;
        Ok(100.0 * filled as f64 / (self.resolution * self.resolution) as f64)
    }

    /// `Ok(())` when the projection is dense enough, `SparseDensity`
    /// when it is not, `DegenerateBounds` when it cannot be mapped.
    pub fn check(&self, xs: &[f64], ys: &[f64]) -> AttractorResult<()> {
        let filled = self.filled_pixels(xs, ys)?;
        let total = self.resolution * self.resolution;
        if 100.0 * filled as f64 / total as f64 > self.min_fill_percent {
            Ok(())
        } else {
            Err(AttractorError::SparseDensity { filled, total })
        }
    }

    pub fn accept(&self, xs: &[f64], ys: &[f64]) -> bool {
        self.check(xs, ys).is_ok()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Bounds Fitting
// ─────────────────────────────────────────────────────────────────────
//! Min/range per axis, and the aspect-fitted x/y window shared by the
//! density check and the renderer.
//!
//! Fitting widens whichever axis under-fills the target aspect ratio,
//! then applies a uniform margin around the original midpoint, so the
//! point cloud lands inside the raster undistorted with a border.

use attractor_types::{AttractorError, AttractorResult};
use serde::{Deserialize, Serialize};

/// Default margin multiplier.
pub const DEFAULT_MARGIN: f64 = 1.1;

/// Minimum and extent of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub min: f64,
    pub range: f64,
}

impl AxisBounds {
    /// Min and max − min of `data`. Any NaN poisons the result.
    pub fn of(data: &[f64]) -> AttractorResult<Self> {
        if data.is_empty() {
            return Err(AttractorError::Validation(
                "cannot take bounds of an empty axis".to_string(),
            ));
        }
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in data {
            if v.is_nan() {
                return Ok(Self {
                    min: f64::NAN,
                    range: f64::NAN,
                });
            }
            lo = lo.min(v);
            hi = hi.max(v);
        }
        Ok(Self {
            min: lo,
            range: hi - lo,
        })
    }

    /// Finite min and a strictly positive, finite range.
    pub fn is_usable(&self) -> bool {
        self.min.is_finite() && self.range.is_finite() && self.range > 0.0
    }

    pub fn validate(&self, axis: &'static str) -> AttractorResult<()> {
        if self.is_usable() {
            Ok(())
        } else {
            Err(AttractorError::DegenerateBounds {
                axis,
                range: self.range,
            })
        }
    }

    /// Position of `value` in [0, 1] across the axis.
    #[inline]
    pub fn normalise(&self, value: f64) -> f64 {
        (value - self.min) / self.range
    }

    /// Pixel index `trunc((value − min) / range · (resolution − 1))`.
    ///
    /// Truncation sends `pos` in (−1, 0) to pixel 0, so an edge point
    /// that rounding leaves an ulp below `min` still lands on the raster.
    /// `None` when the result is non-finite or off the raster.
    #[inline]
    pub fn index(&self, value: f64, resolution: usize) -> Option<usize> {
        if resolution == 0 {
            return None;
        }
        let pos = self.normalise(value) * (resolution - 1) as f64;
        if pos.is_finite() && pos > -1.0 && pos < resolution as f64 {
            Some(pos.max(0.0) as usize)
        } else {
            None
        }
    }
}

/// Aspect-fitted x/y window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneBounds {
    pub x: AxisBounds,
    pub y: AxisBounds,
}

impl PlaneBounds {
    pub fn validate(&self) -> AttractorResult<()> {
        self.x.validate("x")?;
        self.y.validate("y")
    }

    /// Aspect ratio of the fitted window (x range / y range).
    pub fn aspect(&self) -> f64 {
        self.x.range / self.y.range
    }
}

/// Fit x/y bounds to a `width × height` target with a uniform margin.
///
/// Returns the window even when degenerate; callers decide whether a
/// collapsed or non-finite range is fatal.
pub fn fit_aspect(
    xs: &[f64],
    ys: &[f64],
    width: usize,
    height: usize,
    margin: f64,
) -> AttractorResult<PlaneBounds> {
    if xs.len() != ys.len() {
        return Err(AttractorError::Validation(format!(
            "x/y length mismatch: {} vs {}",
            xs.len(),
            ys.len()
        )));
    }
    if width == 0 || height == 0 {
        return Err(AttractorError::Validation(format!(
            "target must be non-empty, got {width}x{height}"
        )));
    }
    let x = AxisBounds::of(xs)?;
    let y = AxisBounds::of(ys)?;

    let x_mid = x.min + x.range / 2.0;
    let y_mid = y.min + y.range / 2.0;

    let data_aspect = x.range / y.range;
    let target_aspect = width as f64 / height as f64;

    let (mut x_rng, mut y_rng) = (x.range, y.range);
    if data_aspect < target_aspect {
        x_rng = target_aspect * y_rng;
    } else {
        y_rng = x_rng / target_aspect;
    }
    x_rng *= margin;
    y_rng *= margin;

    log::debug!(
        "fit_aspect: data {:.3}x{:.3} (aspect {:.3}) -> window {:.3}x{:.3} (aspect {:.3})",
        x.range,
        y.range,
        data_aspect,
        x_rng,
        y_rng,
        x_rng / y_rng
    );

    Ok(PlaneBounds {
        x: AxisBounds {
            min: x_mid - x_rng / 2.0,
            range: x_rng,
        },
        y: AxisBounds {
            min: y_mid - y_rng / 2.0,
            range: y_rng,
        },
    })
}

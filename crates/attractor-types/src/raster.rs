// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Raster Buffers
// ─────────────────────────────────────────────────────────────────────
//! Dense `height × width × 3` accumulation buffers.
//!
//! Burn buffers start at one and are reduced by multiplication; render
//! buffers start at zero and are reduced by addition, then clipped.

use serde::{Deserialize, Serialize};

use crate::error::{AttractorError, AttractorResult};

pub const CHANNELS: usize = 3;

/// Clamp to [0, 1], mapping NaN to 0 and Inf to the nearest bound.
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Row-major RGB raster of `f64` channel values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Raster {
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height * CHANNELS],
        }
    }

    /// Multiplicative identity for burn reduction.
    pub fn ones(width: usize, height: usize) -> Self {
        Self::filled(width, height, 1.0)
    }

    /// Additive identity for composite reduction.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(height, width, channels)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, CHANNELS)
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        (row * self.width + col) * CHANNELS
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize, channel: usize) -> f64 {
        self.data[self.offset(row, col) + channel]
    }

    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> &[f64] {
        let o = self.offset(row, col);
        &self.data[o..o + CHANNELS]
    }

    #[inline]
    pub fn pixel_mut(&mut self, row: usize, col: usize) -> &mut [f64] {
        let o = self.offset(row, col);
        &mut self.data[o..o + CHANNELS]
    }

    /// Contiguous slice covering rows `[start, end)`.
    pub fn rows(&self, start: usize, end: usize) -> &[f64] {
        &self.data[self.offset(start, 0)..self.offset(end, 0)]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    fn check_shape(&self, other: &Raster) -> AttractorResult<()> {
        if self.shape() != other.shape() {
            return Err(AttractorError::Validation(format!(
                "raster shape mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            )));
        }
        Ok(())
    }

    /// Elementwise `self *= other`.
    pub fn multiply_assign(&mut self, other: &Raster) -> AttractorResult<()> {
        self.check_shape(other)?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a *= b;
        }
        Ok(())
    }

    /// Add a band of full rows starting at `row_start`.
    pub fn add_rows(&mut self, row_start: usize, band: &[f64]) -> AttractorResult<()> {
        let start = self.offset(row_start, 0);
        if band.len() % (self.width * CHANNELS) != 0 || start + band.len() > self.data.len() {
            return Err(AttractorError::Validation(format!(
                "band of {} values at row {row_start} does not fit a {}x{} raster",
                band.len(),
                self.width,
                self.height
            )));
        }
        for (a, b) in self.data[start..start + band.len()].iter_mut().zip(band) {
            *a += b;
        }
        Ok(())
    }

    /// Clip every channel to [0, 1]. Returns how many values were NaN.
    pub fn clip(&mut self) -> usize {
        let mut nan_count = 0;
        for v in self.data.iter_mut() {
            if v.is_nan() {
                nan_count += 1;
            }
            *v = clamp_unit(*v);
        }
        if nan_count > 0 {
            log::warn!("clip: {nan_count} NaN channel values mapped to 0");
        }
        nan_count
    }

    /// Largest absolute channel difference against another raster.
    pub fn max_abs_diff(&self, other: &Raster) -> AttractorResult<f64> {
        self.check_shape(other)?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }

    /// Quantise to interleaved 8-bit RGB for an image encoder.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (clamp_unit(v) * 255.0).round() as u8)
            .collect()
    }
}

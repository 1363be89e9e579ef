// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Attractor Kernel — strange-attractor discovery and rendering.

pub mod config;
pub mod error;
pub mod raster;
pub mod trajectory;

pub use config::{AttractorConfig, RenderMode, MAX_DIMENSION, MIN_DIMENSION};
pub use error::{AttractorError, AttractorResult};
pub use raster::{clamp_unit, Raster, CHANNELS};
pub use trajectory::Trajectory;

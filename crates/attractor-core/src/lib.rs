// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Attractor discovery, parallel trajectory computation, and the
//! burn/composite renderer.
//!
//! Data flow:
//!
//! ```text
//! AttractorSearch ──(coefficients, seed)──▶ TrajectoryCompute
//!        │                                        │
//!  DensityClassifier                         Trajectory
//!                                                 ▼
//!                                         RenderPipeline ──▶ Raster
//! ```
//!
//! # Invariants
//!
//! 1. **Seeds are the whole story**: `AttractorSearch::discover` owns its
//!    generator, built from one `u64`. Same dimension and seed, same
//!    coefficient table and initial state.
//!
//! 2. **Non-finite values are verdicts, not errors**: the map lets NaN and
//!    Inf propagate; search, compute and render each inspect them at
//!    their own boundary and reject.
//!
//! 3. **Workers share nothing mutable**: every parallel job reads shared
//!    slices and writes a private buffer. Burn buffers are reduced by
//!    multiplication, composite bands by addition, so shard count changes
//!    results only by floating-point reduction order.
//!
//! 4. **Search is bounded**: `SearchLimits` caps attempts and wall-clock
//!    time unless `SearchLimits::unbounded()` is chosen explicitly.

pub mod bounds;
pub mod compute;
pub mod density;
pub mod generator;
pub mod parallel;
pub mod render;
pub mod search;

pub use bounds::{fit_aspect, AxisBounds, PlaneBounds, DEFAULT_MARGIN};
pub use compute::{shard_lengths, TrajectoryCompute};
pub use density::DensityClassifier;
pub use generator::{AttractorGenerator, GeneratedAttractor};
pub use parallel::{ParallelMap, RayonPool, Sequential};
pub use render::{BurnParams, RenderPipeline, RenderSettings};
pub use search::{AttractorSearch, Discovery, SearchLimits};

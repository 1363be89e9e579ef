// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Map Dynamics
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Cubic polynomial maps in n dimensions and the iteration engine that
//! records their trajectories.

pub mod iterate;
pub mod polynomial;

pub use iterate::{iterate, run, run_final};
pub use polynomial::{monomial_count, monomial_table, ncoeffs, Monomial, PolynomialMap};

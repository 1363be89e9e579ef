// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Cubic Polynomial Map
// ─────────────────────────────────────────────────────────────────────
//! One step of the iterated map:
//!
//!   next[o] = Σ_t c[(o-1)·M + t] · v[i_t]·v[j_t]·v[k_t],   o = 1..=d
//!   next[0] = state[1]
//!
//! with v[0] = 1 (bias) and v[m] = state[m]. The monomial table lists
//! every multiset i ≤ j ≤ k over {0, ..., d} in lexicographic order,
//! so M = C(d+3, 3) and the table covers constant through cubic terms
//! of the d evolved variables. Component 0 is a one-step delay of
//! component 1.
//!
//! Monomial values are evaluated once per step into a scratch buffer
//! shared by every output row.

use attractor_types::{AttractorError, AttractorResult};
use serde::{Deserialize, Serialize};

/// Coefficient count for a map of the given dimension.
///
/// Equals `d + 11/6·d² + d³ + d⁴/6` exactly.
pub const fn ncoeffs(dimension: usize) -> usize {
    dimension * monomial_count(dimension)
}

/// Monomials of total degree ≤ 3 in `dimension` variables: C(d+3, 3).
pub const fn monomial_count(dimension: usize) -> usize {
    (dimension + 1) * (dimension + 2) * (dimension + 3) / 6
}

/// Indices into the bias-extended state for one monomial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monomial {
    pub i: u8,
    pub j: u8,
    pub k: u8,
}

impl Monomial {
    /// Total degree (number of non-bias factors).
    pub fn degree(&self) -> usize {
        [self.i, self.j, self.k].iter().filter(|&&f| f != 0).count()
    }
}

/// Enumerate the monomial table for `dimension`.
pub fn monomial_table(dimension: usize) -> Vec<Monomial> {
    let n = dimension as u8;
    let mut table = Vec::with_capacity(monomial_count(dimension));
    for i in 0..=n {
        for j in i..=n {
            for k in j..=n {
                table.push(Monomial { i, j, k });
            }
        }
    }
    table
}

/// Evaluator for one coefficient table.
///
/// Owns the coefficients and pre-allocated scratch so `step_into`
/// performs no allocation.
#[derive(Debug, Clone)]
pub struct PolynomialMap {
    dimension: usize,
    coefficients: Vec<f64>,
    table: Vec<Monomial>,
    // Scratch
    v: Vec<f64>,
    terms: Vec<f64>,
}

impl PolynomialMap {
    pub fn new(dimension: usize, coefficients: Vec<f64>) -> AttractorResult<Self> {
        if dimension == 0 || dimension > u8::MAX as usize - 1 {
            log::debug!("PolynomialMap rejected: dimension {dimension}");
            return Err(AttractorError::Validation(format!(
                "unsupported dimension {dimension}"
            )));
        }
        let expected = ncoeffs(dimension);
        if coefficients.len() != expected {
            log::debug!(
                "PolynomialMap rejected: d={dimension} expects {expected} coefficients, got {}",
                coefficients.len()
            );
            return Err(AttractorError::Validation(format!(
                "dimension {dimension} needs {expected} coefficients, got {}",
                coefficients.len()
            )));
        }
        let table = monomial_table(dimension);
        Ok(Self {
            dimension,
            coefficients,
            v: vec![0.0; dimension + 1],
            terms: vec![0.0; table.len()],
            table,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Components per state (`dimension + 1`).
    pub fn state_width(&self) -> usize {
        self.dimension + 1
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Compute the next state into `next`.
    ///
    /// No finiteness checks: overflow propagates as NaN/Inf.
    #[inline]
    pub fn step_into(&mut self, state: &[f64], next: &mut [f64]) {
        let d = self.dimension;
        debug_assert_eq!(state.len(), d + 1);
        debug_assert_eq!(next.len(), d + 1);

        self.v[0] = 1.0;
        self.v[1..].copy_from_slice(&state[1..]);

        for (term, m) in self.terms.iter_mut().zip(&self.table) {
            *term = self.v[m.i as usize] * self.v[m.j as usize] * self.v[m.k as usize];
        }

        let m = self.terms.len();
        for o in 1..=d {
            let row = &self.coefficients[(o - 1) * m..o * m];
            next[o] = row.iter().zip(&self.terms).map(|(c, t)| c * t).sum();
        }
        next[0] = state[1];
    }

    /// Allocating convenience wrapper around [`PolynomialMap::step_into`].
    pub fn step(&mut self, state: &[f64]) -> Vec<f64> {
        let mut next = vec![0.0; self.state_width()];
        self.step_into(state, &mut next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Coefficient index of monomial `(i, j, k)` for output `o`.
    fn index_of(dimension: usize, o: usize, mono: Monomial) -> usize {
        let table = monomial_table(dimension);
        let t = table.iter().position(|&m| m == mono).unwrap();
        (o - 1) * table.len() + t
    }

    #[test]
    fn test_ncoeffs_matches_closed_form() {
        for d in 2..=7usize {
            let df = d as f64;
            let closed = (df + 11.0 / 6.0 * df.powi(2) + df.powi(3) + df.powi(4) / 6.0).round();
            assert_eq!(ncoeffs(d), closed as usize, "d={d}");
        }
        assert_eq!(ncoeffs(2), 20);
        assert_eq!(ncoeffs(3), 60);
        assert_eq!(ncoeffs(7), 840);
    }

    #[test]
    fn test_table_layout() {
        let table = monomial_table(2);
        assert_eq!(table.len(), 10);
        assert_eq!(table[0], Monomial { i: 0, j: 0, k: 0 });
        assert_eq!(table[1], Monomial { i: 0, j: 0, k: 1 });
        assert_eq!(table[9], Monomial { i: 2, j: 2, k: 2 });
        let by_degree = |deg| table.iter().filter(|m| m.degree() == deg).count();
        assert_eq!(
            (by_degree(0), by_degree(1), by_degree(2), by_degree(3)),
            (1, 2, 3, 4)
        );
    }

    #[test]
    fn test_wrong_coefficient_count_rejected() {
        assert!(PolynomialMap::new(2, vec![0.0; 17]).is_err());
        assert!(PolynomialMap::new(0, Vec::new()).is_err());
        assert!(PolynomialMap::new(2, vec![0.0; 20]).is_ok());
    }

    #[test]
    fn test_henon_map() {
        // x' = 1 - 1.4 x² + y,  y' = 0.3 x
        let d = 2;
        let mut c = vec![0.0; ncoeffs(d)];
        c[index_of(d, 1, Monomial { i: 0, j: 0, k: 0 })] = 1.0;
        c[index_of(d, 1, Monomial { i: 0, j: 1, k: 1 })] = -1.4;
        c[index_of(d, 1, Monomial { i: 0, j: 0, k: 2 })] = 1.0;
        c[index_of(d, 2, Monomial { i: 0, j: 0, k: 1 })] = 0.3;
        let mut map = PolynomialMap::new(d, c).unwrap();

        let next = map.step(&[9.0, 0.5, 0.2]);
        assert!((next[1] - (1.0 - 1.4 * 0.25 + 0.2)).abs() < 1e-12);
        assert!((next[2] - 0.15).abs() < 1e-12);
        assert_eq!(next[0], 0.5, "component 0 delays component 1");
    }

    #[test]
    fn test_cubic_term() {
        let d = 3;
        let mut c = vec![0.0; ncoeffs(d)];
        c[index_of(d, 3, Monomial { i: 1, j: 2, k: 3 })] = 2.0;
        let mut map = PolynomialMap::new(d, c).unwrap();
        let next = map.step(&[0.0, 2.0, 3.0, 5.0]);
        assert_eq!(next, vec![2.0, 0.0, 0.0, 60.0]);
    }

    #[test]
    fn test_overflow_propagates() {
        let d = 2;
        let mut c = vec![0.0; ncoeffs(d)];
        c[index_of(d, 1, Monomial { i: 1, j: 1, k: 1 })] = 1.0;
        c[index_of(d, 2, Monomial { i: 0, j: 0, k: 2 })] = 1.0;
        let mut map = PolynomialMap::new(d, c).unwrap();
        let next = map.step(&[0.0, 1e200, 1.0]);
        assert!(!next[1].is_finite());
        let after = map.step(&next);
        assert!(after[1..].iter().all(|v| !v.is_finite()));
        let poisoned = map.step(&[0.0, 0.5, f64::NAN]);
        assert!(poisoned[1].is_nan() && poisoned[2].is_nan());
    }
}

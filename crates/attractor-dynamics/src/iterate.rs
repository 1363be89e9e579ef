// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Iteration Engine
// ─────────────────────────────────────────────────────────────────────
//! Drives a [`PolynomialMap`] for N steps and records every state,
//! the initial one included. NaN/Inf are never trapped here; callers
//! inspect the terminal state themselves.

use attractor_types::{AttractorError, AttractorResult, Trajectory};

use crate::polynomial::PolynomialMap;

/// Record a trajectory of `n_iterations` states starting at `initial`.
///
/// Row 0 is `initial`; row i is the map applied i times.
pub fn run(
    map: &mut PolynomialMap,
    n_iterations: usize,
    initial: &[f64],
) -> AttractorResult<Trajectory> {
    let width = map.state_width();
    if initial.len() != width {
        return Err(AttractorError::Validation(format!(
            "initial state has {} components, expected {width}",
            initial.len()
        )));
    }

    let mut trajectory = Trajectory::with_capacity(map.dimension(), n_iterations);
    if n_iterations == 0 {
        return Ok(trajectory);
    }

    let mut current = initial.to_vec();
    let mut next = vec![0.0; width];
    trajectory.push(&current);
    for _ in 1..n_iterations {
        map.step_into(&current, &mut next);
        trajectory.push(&next);
        std::mem::swap(&mut current, &mut next);
    }
    Ok(trajectory)
}

/// Advance `n_steps` without recording, returning only the final state.
pub fn run_final(
    map: &mut PolynomialMap,
    n_steps: usize,
    initial: &[f64],
) -> AttractorResult<Vec<f64>> {
    let width = map.state_width();
    if initial.len() != width {
        return Err(AttractorError::Validation(format!(
            "initial state has {} components, expected {width}",
            initial.len()
        )));
    }
    let mut current = initial.to_vec();
    let mut next = vec![0.0; width];
    for _ in 0..n_steps {
        map.step_into(&current, &mut next);
        std::mem::swap(&mut current, &mut next);
    }
    Ok(current)
}

/// Convenience: build the map and run it.
pub fn iterate(
    n_iterations: usize,
    coefficients: &[f64],
    initial: &[f64],
    dimension: usize,
) -> AttractorResult<Trajectory> {
    let mut map = PolynomialMap::new(dimension, coefficients.to_vec())?;
    run(&mut map, n_iterations, initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::ncoeffs;

    /// x' = 0.5 x,  y' = 0.5 y + 0.1
    fn contracting() -> PolynomialMap {
        let mut c = vec![0.0; ncoeffs(2)];
        c[1] = 0.5; // output 1, monomial (0,0,1)
        c[10] = 0.1; // output 2, constant
        c[10 + 2] = 0.5; // output 2, monomial (0,0,2)
        PolynomialMap::new(2, c).unwrap()
    }

    #[test]
    fn test_length_includes_initial() {
        let mut map = contracting();
        let traj = run(&mut map, 5, &[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(traj.len(), 5);
        assert_eq!(traj.row(0), &[0.0, 1.0, 0.0]);
        assert_eq!(traj.row(1), &[1.0, 0.5, 0.1]);
        assert!((traj.row(4)[1] - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn test_converges_to_fixed_point() {
        let mut map = contracting();
        let traj = run(&mut map, 200, &[0.0, 1.0, 0.0]).unwrap();
        let last = traj.last().unwrap();
        assert!(last[1].abs() < 1e-12);
        assert!((last[2] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_zero_iterations() {
        let mut map = contracting();
        assert!(run(&mut map, 0, &[0.0; 3]).unwrap().is_empty());
    }

    #[test]
    fn test_run_final_matches_recorded_tail() {
        let mut map = contracting();
        let traj = run(&mut map, 10, &[0.0, 1.0, -1.0]).unwrap();
        let last = run_final(&mut map, 9, &[0.0, 1.0, -1.0]).unwrap();
        assert_eq!(traj.last().unwrap(), last.as_slice());
    }

    #[test]
    fn test_bad_initial_width() {
        let mut map = contracting();
        assert!(run(&mut map, 3, &[0.0, 1.0]).is_err());
        assert!(run_final(&mut map, 3, &[0.0; 4]).is_err());
    }

    #[test]
    fn test_nan_contaminates_forward() {
        let c = vec![0.1; ncoeffs(2)];
        let traj = iterate(4, &c, &[0.0, f64::NAN, 0.0], 2).unwrap();
        assert!(traj.rows().skip(1).all(|r| r[1].is_nan() && r[2].is_nan()));
        assert!(!traj.terminal_is_finite());
    }
}

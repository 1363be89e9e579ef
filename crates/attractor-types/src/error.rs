// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all Attractor Kernel failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttractorError {
    /// Terminal state of a trial or full trajectory is NaN/Inf.
    #[error("trajectory diverged or collapsed: {0}")]
    DivergedOrCollapsed(String),

    /// Trial trajectory is finite but fills too few pixels.
    #[error("sparse density: {filled} of {total} pixels filled")]
    SparseDensity { filled: usize, total: usize },

    /// A fitted axis range is non-finite or zero.
    #[error("degenerate bounds on {axis} axis: range = {range}")]
    DegenerateBounds { axis: &'static str, range: f64 },

    /// A parallel job failed; the whole call is abandoned.
    #[error("worker failure: {0}")]
    WorkerFailure(String),

    /// Search hit its attempt cap or wall-clock limit.
    #[error("search exhausted after {attempts} attempts ({elapsed_ms}ms)")]
    SearchExhausted { attempts: u64, elapsed_ms: u64 },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Invalid input (dimension, coefficient table, shapes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Reading or writing a persisted array failed.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AttractorError {
    fn from(e: std::io::Error) -> Self {
        AttractorError::Io(e.to_string())
    }
}

pub type AttractorResult<T> = Result<T, AttractorError>;

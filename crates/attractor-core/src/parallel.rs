// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Parallel Map Primitive
// ─────────────────────────────────────────────────────────────────────
//! Fork/join over independent jobs: submit N jobs, collect N results in
//! submission order, propagate the first failure.
//!
//! Workers share nothing mutable. A job that panics is caught and
//! reported as `WorkerFailure` so one bad shard cannot take down the
//! caller.

use std::panic::{catch_unwind, AssertUnwindSafe};

use attractor_types::{AttractorError, AttractorResult};
use rayon::prelude::*;

/// Execution facility injected into trajectory computation and rendering.
pub trait ParallelMap: Send + Sync {
    /// Number of workers jobs are spread across.
    fn fan_out(&self) -> usize;

    /// Run `f(index, job)` for every job. Results come back in job order.
    fn map<T, R, F>(&self, jobs: Vec<T>, f: F) -> AttractorResult<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(usize, T) -> AttractorResult<R> + Send + Sync;
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn guarded<T, R, F>(f: &F, index: usize, job: T) -> AttractorResult<R>
where
    F: Fn(usize, T) -> AttractorResult<R>,
{
    match catch_unwind(AssertUnwindSafe(|| f(index, job))) {
        Ok(result) => result,
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            log::error!("Worker {index} panicked: {msg}");
            Err(AttractorError::WorkerFailure(format!("job {index} panicked: {msg}")))
        }
    }
}

/// Runs every job on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl ParallelMap for Sequential {
    fn fan_out(&self) -> usize {
        1
    }

    fn map<T, R, F>(&self, jobs: Vec<T>, f: F) -> AttractorResult<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(usize, T) -> AttractorResult<R> + Send + Sync,
    {
        jobs.into_iter()
            .enumerate()
            .map(|(i, job)| guarded(&f, i, job))
            .collect()
    }
}

/// Dedicated rayon thread pool sized to the configured fan-out.
pub struct RayonPool {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl RayonPool {
    pub fn new(threads: usize) -> AttractorResult<Self> {
        if threads == 0 {
            return Err(AttractorError::Config(
                "thread pool needs at least one thread".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("attractor-worker-{i}"))
            .build()
            .map_err(|e| AttractorError::WorkerFailure(format!("thread pool: {e}")))?;
        Ok(Self { pool, threads })
    }
}

impl std::fmt::Debug for RayonPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayonPool")
            .field("threads", &self.threads)
            .finish()
    }
}

impl ParallelMap for RayonPool {
    fn fan_out(&self) -> usize {
        self.threads
    }

    fn map<T, R, F>(&self, jobs: Vec<T>, f: F) -> AttractorResult<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(usize, T) -> AttractorResult<R> + Send + Sync,
    {
        let results: Vec<AttractorResult<R>> = self.pool.install(|| {
            jobs.into_par_iter()
                .enumerate()
                .map(|(i, job)| guarded(&f, i, job))
                .collect()
        });
        // Lowest-index failure wins, as in `Sequential`.
        results.into_iter().collect()
    }
}

//! Thread pool for batch tracing.
//! Each input file is an independent run with its own state, so runs fan
//! out over a local rayon pool.

use anyhow::Result;

/// Build a rayon pool with at most `max_workers` threads. Without a limit,
/// half the cores are used (minimum 1).
pub fn build_pool(max_workers: Option<usize>) -> Result<rayon::ThreadPool> {
    let cores = num_cpus::get();
    let workers = max_workers
        .unwrap_or(cores / 2)
        .max(1);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;

    tracing::debug!(workers, cores, "initialized trace thread pool");

    Ok(pool)
}

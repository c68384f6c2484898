//! Bounded worker pools.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// A fixed-size rayon pool, or the calling thread when none could be built.
pub struct WorkerPool {
    pool: Option<ThreadPool>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let pool = match ThreadPoolBuilder::new().num_threads(workers.max(1)).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::debug!("worker pool unavailable, running sequentially: {e}");
                None
            }
        };
        Self { pool }
    }

    /// Apply `f` to every item. Results come back in input order regardless
    /// of completion order.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.par_iter().map(&f).collect()),
            None => items.iter().map(&f).collect(),
        }
    }
}

/// One-shot [`WorkerPool::map`].
pub fn map_bounded<T, R, F>(workers: usize, items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    WorkerPool::new(workers).map(items, f)
}

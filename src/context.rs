//! Explicit run context
//!
//! One `RunContext` is created per pipeline run and handed to every
//! component. It owns the worker pool used for table builds and the run id
//! used to name staging locations.

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use chrono::Utc;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::Arc;

/// Shared state for one pipeline run
#[derive(Clone)]
pub struct RunContext {
    pool: Arc<ThreadPool>,
    shard_size: usize,
    run_id: String,
}

impl RunContext {
    /// Create a context with `workers` threads (0 = one per core)
    pub fn new(workers: usize, shard_size: usize) -> Result<Self> {
        if shard_size == 0 {
            return Err(Error::invalid_value("shard_size", "must be at least 1"));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sparkify-worker-{i}"))
            .build()
            .map_err(|e| Error::config(format!("Failed to build worker pool: {e}")))?;

        let run_id = format!(
            "{}-{}",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            std::process::id()
        );

        Ok(Self {
            pool: Arc::new(pool),
            shard_size,
            run_id,
        })
    }

    /// Create a context from pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.workers, config.shard_size)
    }

    /// Replace the generated run id
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Identifier of this run
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Records per shard
    pub fn shard_size(&self) -> usize {
        self.shard_size
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` on every shard of `items` in parallel
    ///
    /// Each worker sees only its own shard. Results come back in shard order,
    /// so the merged output does not depend on scheduling.
    pub fn map_shards<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(usize, &[T]) -> U + Sync + Send,
    {
        let shard_size = self.shard_size;
        self.pool.install(|| {
            items
                .par_chunks(shard_size)
                .enumerate()
                .map(|(shard, chunk)| f(shard, chunk))
                .collect()
        })
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("workers", &self.workers())
            .field("shard_size", &self.shard_size)
            .finish()
    }
}

//! Rayon thread pool configuration
//!
//! Statistics run on the global rayon pool. The pool size only affects speed:
//! accumulation order is fixed by [`crate::statistics::CHUNK_LEN`].

use crate::errors::{NcReaderError, Result};
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    /// `None` keeps rayon's default of one thread per core
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Sets up the global rayon pool. Can succeed at most once per process.
    pub fn setup_global_pool(&self) -> Result<()> {
        match self.num_threads {
            Some(0) => Err(NcReaderError::ThreadPool(
                "thread count must be at least 1".to_string(),
            )),
            Some(num_threads) => {
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()
                    .map_err(|e| {
                        NcReaderError::ThreadPool(format!(
                            "Failed to initialize thread pool with {num_threads} threads: {e}"
                        ))
                    })?;
                info!(threads = num_threads, "configured thread pool");
                Ok(())
            }
            None => {
                debug!("using default thread pool configuration");
                Ok(())
            }
        }
    }

    pub fn current_threads(&self) -> usize {
        rayon::current_num_threads()
    }
}

/// The parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
}

pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
    }
}

impl ParallelInfo {
    pub fn log(&self) {
        debug!(
            current_threads = self.current_threads,
            available_cores = self.available_cores,
            "parallel environment"
        );
    }
}

//! The adaptive timing loop.
//!
//! A [`Clock`] repeatedly asks a factory for a fresh task, replicates it into
//! a batch of `iterations_per_cycle` copies, times the batch on the cycle
//! runner and records the duration. It stops once the stability judge
//! accepts the trailing window, or after `max_cycles` cycles.
//!
//! # Example
//! ```no_run
//! use std::convert::Infallible;
//! use cycle_clock::ClockBuilder;
//!
//! let clock = ClockBuilder::new()
//!     .thread_pool_size(4)
//!     .iterations_per_cycle(1_000)
//!     .build()?;
//!
//! let results = clock.time_named(
//!     || {
//!         let input: Vec<u64> = (0..256).collect();
//!         Ok::<_, Infallible>(move || input.iter().sum::<u64>())
//!     },
//!     "sum",
//! )?;
//! assert!(!results.is_empty());
//! # Ok::<(), cycle_clock::ClockError>(())
//! ```

use std::time::Duration;

use crate::config::{ClockBuilder, ClockConfig};
use crate::error::{ClockError, Result};
use crate::judge::{StabilityJudge, Verdict};
use crate::report::{log_duration, log_durations, metadata_line};
use crate::runner::{CycleRunner, CycleStats};
use crate::task::{generate_tasks, Batch, Task};

/// Adaptive micro-benchmark clock. Build one with [`ClockBuilder`].
#[derive(Clone, Debug)]
pub struct Clock {
    config: ClockConfig,
    runner: CycleRunner,
    judge: StabilityJudge,
}

impl Clock {
    pub(crate) fn new(config: ClockConfig) -> Self {
        Self {
            runner: CycleRunner::new(&config),
            judge: StabilityJudge::new(&config),
            config,
        }
    }

    pub fn builder() -> ClockBuilder {
        ClockBuilder::new()
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Time `factory` under `test_name`, logging the run metadata and the
    /// cycle durations.
    ///
    /// With `print_intermediate` each duration is logged as its cycle
    /// completes; otherwise the metadata and the whole list are logged once
    /// the run ends.
    pub fn time_named<F, T, E>(&self, factory: F, test_name: &str) -> Result<Vec<Duration>>
    where
        F: FnMut() -> std::result::Result<T, E>,
        T: Task + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let verbose = self.config.print_intermediate();
        if verbose {
            tracing::info!("{}", metadata_line(&self.config, test_name));
        }

        let results = self.run_loop(factory, verbose)?;

        if !verbose {
            tracing::info!("{}", metadata_line(&self.config, test_name));
            log_durations(&results);
        }
        Ok(results)
    }

    /// Time `factory` without logging anything; returns the cycle durations.
    pub fn time<F, T, E>(&self, factory: F) -> Result<Vec<Duration>>
    where
        F: FnMut() -> std::result::Result<T, E>,
        T: Task + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.run_loop(factory, false)
    }

    fn run_loop<F, T, E>(&self, mut factory: F, log_cycles: bool) -> Result<Vec<Duration>>
    where
        F: FnMut() -> std::result::Result<T, E>,
        T: Task + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut results = Vec::with_capacity(self.config.max_cycles());

        // The judge reports the cap as "not acceptable", so the cap is
        // enforced here as well.
        while results.len() < self.config.max_cycles() && !self.judge.should_stop(&results) {
            let task = factory().map_err(|e| ClockError::FactoryFailure(Box::new(e)))?;
            let duration = self.time_generated(task)?;

            results.push(duration);
            if log_cycles {
                log_duration(duration);
            }
        }

        if self.judge.evaluate(&results) == Verdict::CapReached {
            tracing::debug!(
                cycles = results.len(),
                "cycle cap reached before the window stabilized"
            );
        }
        Ok(results)
    }

    /// Replicate `task` into one cycle's batch.
    pub fn generate_tasks<T: Task + 'static>(&self, task: T) -> Batch {
        generate_tasks(task, self.config.iterations_per_cycle())
    }

    /// Time a single cycle of `task`.
    pub fn time_generated<T: Task + 'static>(&self, task: T) -> Result<Duration> {
        self.time_batch(&self.generate_tasks(task))
    }

    /// Time one prepared batch.
    pub fn time_batch(&self, batch: &Batch) -> Result<Duration> {
        self.runner.run_cycle(batch)
    }

    /// Time one prepared batch, returning the runner's full statistics.
    pub fn time_batch_stats(&self, batch: &Batch) -> Result<CycleStats> {
        self.runner.run_cycle_stats(batch)
    }

    /// `true` if the stopping rule accepts `results`.
    pub fn is_stable(&self, results: &[Duration]) -> bool {
        self.judge.should_stop(results)
    }
}

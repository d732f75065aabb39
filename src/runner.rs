//! Cycle runner: executes one batch on a bounded worker pool.
//!
//! Each cycle gets its own pool of `thread_pool_size` scoped worker threads.
//! Workers are spawned and parked at a start gate before the clock starts, so
//! pool setup is not measured. Once released they claim task indices from a
//! shared counter until the batch is drained or the cycle is cancelled. The
//! runner stops the clock as soon as every worker reports done or the
//! deadline passes, then joins the whole pool before returning.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;

use crate::config::ClockConfig;
use crate::error::{ClockError, Result};
use crate::task::{Batch, CycleScope, CycleSignal};
use crate::utils::CpuPinGuard;

/// What happened during one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleStats {
    /// Wall-clock time from releasing the pool to the end of the bulk wait
    pub elapsed: Duration,
    /// Tasks handed to the pool
    pub submitted: usize,
    /// Tasks that ran to completion
    pub completed: usize,
    /// Tasks that panicked
    pub failed: usize,
    /// Whether the cycle hit its deadline
    pub timed_out: bool,
}

/// Runs batches under the pool size, deadline and pinning of a config.
#[derive(Clone, Debug)]
pub struct CycleRunner {
    pool_size: usize,
    timeout: Duration,
    pin_workers: bool,
}

/// State shared by the workers of one cycle.
struct WorkerPool<'a> {
    batch: &'a Batch,
    next: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    signal: Arc<CycleSignal>,
}

impl WorkerPool<'_> {
    fn drain(&self) {
        while !self.signal.is_cancelled() {
            let index = self.next.fetch_add(1, Ordering::Relaxed);
            let Some(task) = self.batch.get(index) else {
                break;
            };
            match panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
                Ok(()) => self.completed.fetch_add(1, Ordering::Relaxed),
                Err(_) => self.failed.fetch_add(1, Ordering::Relaxed),
            };
        }
    }
}

impl CycleRunner {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            pool_size: config.thread_pool_size(),
            timeout: config.timeout(),
            pin_workers: config.pin_workers(),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `batch` and return the cycle's wall-clock duration.
    pub fn run_cycle(&self, batch: &Batch) -> Result<Duration> {
        self.run_cycle_stats(batch).map(|stats| stats.elapsed)
    }

    /// Run `batch` and return the full cycle statistics.
    ///
    /// # Errors
    /// [`ClockError::WorkerSpawn`] if a worker cannot be started, and
    /// [`ClockError::RunnerInterrupted`] if a worker dies outside a task.
    pub fn run_cycle_stats(&self, batch: &Batch) -> Result<CycleStats> {
        let pool = WorkerPool {
            batch,
            next: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            signal: Arc::new(CycleSignal::default()),
        };

        let stats = thread::scope(|s| {
            let (start_tx, start_rx) = crossbeam_channel::unbounded::<()>();
            let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(self.pool_size);

            let mut workers = Vec::with_capacity(self.pool_size);
            for index in 0..self.pool_size {
                let start_rx = start_rx.clone();
                let done_tx = done_tx.clone();
                let pool = &pool;
                let pin = self.pin_workers;

                let spawned = thread::Builder::new()
                    .name(format!("cycle-worker-{}", index))
                    .spawn_scoped(s, move || {
                        // A closed gate means the cycle was abandoned before it began.
                        if start_rx.recv().is_err() {
                            return;
                        }
                        let _pin = pin.then(|| CpuPinGuard::for_worker(index));
                        let _scope = CycleScope::enter(Arc::clone(&pool.signal));
                        pool.drain();
                        let _ = done_tx.send(());
                    });

                match spawned {
                    Ok(handle) => workers.push(handle),
                    // Dropping the gate sender releases the parked workers.
                    Err(e) => return Err(ClockError::WorkerSpawn(e)),
                }
            }
            drop(done_tx);
            drop(start_rx);

            let start = Instant::now();
            for _ in 0..self.pool_size {
                if start_tx.send(()).is_err() {
                    break;
                }
            }
            let deadline = start.checked_add(self.timeout);

            let mut finished = 0;
            let mut timed_out = false;
            let mut broken = false;
            while finished < self.pool_size {
                let received = match deadline {
                    Some(deadline) => done_rx.recv_deadline(deadline),
                    None => done_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                };
                match received {
                    Ok(()) => finished += 1,
                    Err(RecvTimeoutError::Timeout) => {
                        timed_out = true;
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        broken = true;
                        break;
                    }
                }
            }
            let elapsed = start.elapsed();

            if timed_out || broken {
                pool.signal.cancel();
            }

            for (index, worker) in workers.into_iter().enumerate() {
                if worker.join().is_err() {
                    tracing::error!(worker = index, "cycle worker died outside a task");
                    broken = true;
                }
            }

            if broken {
                return Err(ClockError::RunnerInterrupted(format!(
                    "only {} of {} workers reported completion",
                    finished, self.pool_size
                )));
            }

            Ok(CycleStats {
                elapsed,
                submitted: batch.len(),
                completed: pool.completed.load(Ordering::Relaxed),
                failed: pool.failed.load(Ordering::Relaxed),
                timed_out,
            })
        })?;

        tracing::debug!(
            elapsed = ?stats.elapsed,
            submitted = stats.submitted,
            completed = stats.completed,
            failed = stats.failed,
            timed_out = stats.timed_out,
            "cycle finished"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClockBuilder, TimeUnit};
    use crate::task::{self, generate_tasks};
    use std::sync::atomic::AtomicUsize;

    fn runner(threads: usize, timeout_ms: u64) -> CycleRunner {
        let config = ClockBuilder::new()
            .thread_pool_size(threads)
            .timeout(timeout_ms, TimeUnit::Milliseconds)
            .build_config()
            .unwrap();
        CycleRunner::new(&config)
    }

    #[test]
    fn test_runs_every_task_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let batch = generate_tasks(move || counter.fetch_add(1, Ordering::Relaxed), 500);

        let stats = runner(4, 10_000).run_cycle_stats(&batch).unwrap();

        assert_eq!(stats.submitted, 500);
        assert_eq!(stats.completed, 500);
        assert_eq!(stats.failed, 0);
        assert!(!stats.timed_out);
        assert_eq!(calls.load(Ordering::Relaxed), 500);
    }

    #[test]
    fn test_duration_covers_sequential_work() {
        let batch = generate_tasks(|| std::thread::sleep(Duration::from_millis(1)), 10);
        let elapsed = runner(1, 10_000).run_cycle(&batch).unwrap();
        assert!(elapsed >= Duration::from_millis(10), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_panicking_tasks_are_swallowed() {
        let batch = generate_tasks(|| -> u32 { panic!("task failure") }, 20);
        let stats = runner(2, 10_000).run_cycle_stats(&batch).unwrap();

        assert_eq!(stats.completed, 0);
        assert_eq!(stats.failed, 20);
        assert!(!stats.timed_out);
    }

    #[test]
    fn test_timeout_is_a_ceiling() {
        let batch = generate_tasks(|| task::sleep(Duration::from_secs(3_600)), 100);
        let stats = runner(2, 50).run_cycle_stats(&batch).unwrap();

        assert!(stats.timed_out);
        assert!(stats.elapsed >= Duration::from_millis(50));
        assert!(
            stats.elapsed < Duration::from_secs(5),
            "cycle overshot its deadline: {:?}",
            stats.elapsed
        );
        // Only the tasks already running when the deadline hit were started.
        assert!(stats.completed <= 2);
    }

    #[test]
    fn test_pool_is_quiesced_before_return() {
        let running = Arc::new(AtomicUsize::new(0));
        let in_task = Arc::clone(&running);
        let batch = generate_tasks(
            move || {
                in_task.fetch_add(1, Ordering::SeqCst);
                task::sleep(Duration::from_secs(3_600));
                in_task.fetch_sub(1, Ordering::SeqCst);
            },
            8,
        );

        runner(4, 20).run_cycle(&batch).unwrap();
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    fn spin() -> u64 {
        (0..2_000_000u64).fold(0, |acc, i| std::hint::black_box(acc.wrapping_add(i)))
    }

    #[test]
    fn test_parallel_spin_beats_single_worker() {
        let cores = crate::utils::core_count().unwrap_or(1);
        if cores < 2 {
            return;
        }
        let threads = cores.min(8);
        let batch = generate_tasks(spin, 32);

        let single = runner(1, 60_000).run_cycle(&batch).unwrap();
        let parallel = runner(threads, 60_000).run_cycle(&batch).unwrap();
        assert!(
            parallel < single,
            "{} threads took {:?} vs {:?} on one",
            threads,
            parallel,
            single
        );
    }

    #[test]
    fn test_invalid_pool_never_reaches_runner() {
        let err = ClockBuilder::new().thread_pool_size(0).build_config().unwrap_err();
        assert!(matches!(
            err,
            ClockError::ConfigInvalid { field: "thread_pool_size", .. }
        ));

        // The only configs a runner can see have at least one worker.
        let runner = CycleRunner::new(&ClockConfig::default());
        assert_eq!(runner.pool_size(), 1);
        let batch = generate_tasks(|| 1 + 1, 100);
        let stats = runner.run_cycle_stats(&batch).unwrap();
        assert_eq!(stats.submitted, 100);
        assert_eq!(stats.completed, 100);
    }

    #[test]
    fn test_pinned_workers_still_complete() {
        let config = ClockBuilder::new()
            .thread_pool_size(2)
            .timeout(10, TimeUnit::Seconds)
            .pin_workers(true)
            .build_config()
            .unwrap();
        let batch = generate_tasks(|| 1 + 1, 64);
        let stats = CycleRunner::new(&config).run_cycle_stats(&batch).unwrap();
        assert_eq!(stats.completed, 64);
    }
}

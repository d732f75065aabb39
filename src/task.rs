//! Units of measured work and the batches they are replicated into.
//!
//! A [`Task`] is the nullary operation being timed. Its return value is
//! discarded at the harness boundary, so any `Fn() -> R` qualifies. A task is
//! shared by every worker of a cycle and must therefore be `Send + Sync`.
//!
//! Cancellation is cooperative: when a cycle hits its deadline the runner
//! raises a flag that tasks can observe through [`is_cancelled`], and
//! [`sleep`] wakes early once it is raised.

use std::cell::RefCell;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// The measured unit of work.
///
/// Only [`sleep`] and [`is_cancelled`] see a cycle's deadline. A task that
/// blocks elsewhere, for example in `std::thread::sleep` or on I/O, still has
/// its cycle clock stopped on time, but the runner joins the pool before
/// returning and so waits for the blocking call to finish.
pub trait Task: Send + Sync {
    fn run(&self);
}

impl<F, R> Task for F
where
    F: Fn() -> R + Send + Sync,
{
    #[inline(always)]
    fn run(&self) {
        std::hint::black_box(self());
    }
}

/// One cycle's work list: `len` handles to the same task.
#[derive(Clone)]
pub struct Batch {
    tasks: Vec<Arc<dyn Task>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Task>> {
        self.tasks.iter()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Arc<dyn Task>> {
        self.tasks.get(index)
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch").field("len", &self.tasks.len()).finish()
    }
}

/// Replicate `task` into a batch of `count` handles.
pub fn generate_tasks<T: Task + 'static>(task: T, count: usize) -> Batch {
    let task: Arc<dyn Task> = Arc::new(task);
    Batch {
        tasks: vec![task; count],
    }
}

/// Wrap a fallible operation so failures are logged instead of propagated.
///
/// The returned task yields `None` when `f` fails, which keeps a failing
/// payload consuming comparable wall time without aborting the batch.
pub fn guarded<F, T, E>(name: impl Into<String>, f: F) -> impl Fn() -> Option<T> + Send + Sync
where
    F: Fn() -> Result<T, E> + Send + Sync,
    E: Display,
{
    let name = name.into();
    move || match f() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("Error encountered in {}: {}", name, e);
            None
        }
    }
}

// ============================================================================
// Cooperative cancellation
// ============================================================================

/// Per-cycle cancellation flag shared by the runner and its workers.
#[derive(Debug, Default)]
pub(crate) struct CycleSignal {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl CycleSignal {
    pub(crate) fn cancel(&self) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.cancelled.store(true, Ordering::Release);
        self.wake.notify_all();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn sleep(&self, duration: Duration) {
        let deadline = Instant::now().checked_add(duration);
        let mut guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        while !self.is_cancelled() {
            let remaining = match deadline {
                Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                    Some(remaining) if !remaining.is_zero() => remaining,
                    _ => return,
                },
                // Unrepresentable deadline: wait in long slices until cancelled.
                None => Duration::from_secs(3_600),
            };
            guard = match self.wake.wait_timeout(guard, remaining) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
    }
}

thread_local! {
    static CURRENT_CYCLE: RefCell<Option<Arc<CycleSignal>>> = const { RefCell::new(None) };
}

/// Attaches a worker thread to a cycle for as long as the guard lives.
pub(crate) struct CycleScope;

impl CycleScope {
    pub(crate) fn enter(signal: Arc<CycleSignal>) -> Self {
        CURRENT_CYCLE.with(|cell| *cell.borrow_mut() = Some(signal));
        CycleScope
    }
}

impl Drop for CycleScope {
    fn drop(&mut self) {
        CURRENT_CYCLE.with(|cell| cell.borrow_mut().take());
    }
}

/// `true` once the cycle running the current task has hit its deadline.
///
/// Always `false` outside a harness worker.
pub fn is_cancelled() -> bool {
    CURRENT_CYCLE.with(|cell| {
        cell.borrow()
            .as_ref()
            .is_some_and(|signal| signal.is_cancelled())
    })
}

/// Sleep for `duration`, returning early if the current cycle is cancelled.
///
/// Outside a harness worker this is [`std::thread::sleep`].
pub fn sleep(duration: Duration) {
    let signal = CURRENT_CYCLE.with(|cell| cell.borrow().clone());
    match signal {
        Some(signal) => signal.sleep(duration),
        None => std::thread::sleep(duration),
    }
}

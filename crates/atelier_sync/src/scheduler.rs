//! Cancellable debounce timers.
//!
//! The sync layer owns exactly one pending timer per handle: every mutation
//! cancels the previous timer and schedules a fresh one. Keeping the timer
//! behind a trait lets tests drive it from a virtual clock
//! ([`ManualScheduler`]) instead of sleeping.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Handle to one scheduled task.
///
/// A handle is active until it is cancelled or its task has run. Cancelling
/// is idempotent, and a cancelled task never runs.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    /// Creates an active handle.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Prevents the task from running, if it has not run yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true while the task is still going to run.
    pub fn is_active(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Schedules tasks to run once after a delay.
pub trait Scheduler: Send + Sync {
    /// Schedules `task` to run after `delay`, unless cancelled first.
    ///
    /// The returned handle goes inert once the task has run.
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle;
}

/// Wall-clock scheduler backed by one sleeping thread per task.
///
/// Debounce timers fire at most once per quiet period per collection, so
/// the thread churn stays negligible. The cancellation flag is checked
/// after the sleep, immediately before the task runs.
#[derive(Debug, Default)]
pub struct ThreadScheduler;

impl ThreadScheduler {
    /// Creates a new scheduler.
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let handle = TimerHandle::new();
        let returned = handle.clone();
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            if handle.is_active() {
                task();
            }
            handle.cancel();
        });
        returned
    }
}

/// Virtual-clock scheduler for tests.
///
/// Nothing runs until [`advance`](ManualScheduler::advance) moves the
/// clock; due tasks then run on the caller's thread in deadline order.
/// This makes every debounce property assertable without a real clock.
#[derive(Default)]
pub struct ManualScheduler {
    inner: Mutex<ManualInner>,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_seq: u64,
    pending: Vec<PendingTask>,
}

struct PendingTask {
    fire_at: Duration,
    seq: u64,
    handle: TimerHandle,
    task: Box<dyn FnOnce() + Send>,
}

impl ManualScheduler {
    /// Creates a scheduler with the clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.lock().now
    }

    /// Returns how many scheduled tasks are still live.
    pub fn pending(&self) -> usize {
        self.inner
            .lock()
            .pending
            .iter()
            .filter(|p| p.handle.is_active())
            .count()
    }

    /// Moves the clock forward and runs every task that came due.
    ///
    /// Tasks run outside the scheduler lock, so a task may schedule
    /// further tasks; anything it schedules within the advanced window
    /// runs before this call returns.
    pub fn advance(&self, by: Duration) {
        let target = {
            let mut inner = self.inner.lock();
            inner.now += by;
            inner.now
        };

        loop {
            let due = {
                let mut inner = self.inner.lock();
                inner.pending.retain(|p| p.handle.is_active());
                let next = inner
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.fire_at <= target)
                    .min_by_key(|(_, p)| (p.fire_at, p.seq))
                    .map(|(index, _)| index);
                match next {
                    Some(index) => inner.pending.remove(index),
                    None => break,
                }
            };
            (due.task)();
            due.handle.cancel();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut inner = self.inner.lock();
        let fire_at = inner.now + delay;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.pending.push(PendingTask {
            fire_at,
            seq,
            handle: handle.clone(),
            task,
        });
        handle
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &inner.now)
            .field("pending", &inner.pending.len())
            .finish()
    }
}

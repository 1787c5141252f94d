//! Control flags shared between the presentation thread and the campaign worker.
//!
//! Two independent flags: a pause flag that can be set and cleared any number of times,
//! and a stop flag that is set once per run and never cleared. The worker observes both
//! only at iteration boundaries. A paused worker blocks on a condition variable rather
//! than spinning; stop wakes it.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// What the worker should do at an iteration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Continue,
    Stop,
}

/// Waits performed by the campaign worker.
pub trait Waiter: Send + Sync {
    /// Uninterruptible wait used for UI stabilization and retry backoff.
    fn settle(&self, duration: Duration);

    /// Pacing wait between contacts or batches. Returns `false` if a stop was requested
    /// before the wait elapsed.
    fn pace(&self, duration: Duration) -> bool;
}

#[derive(Debug, Default)]
pub struct ControlSignals {
    paused: Mutex<bool>,
    wake: Condvar,
    stop: AtomicBool,
}

impl ControlSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pause flag. Idempotent.
    pub fn pause(&self) {
        *self.paused.lock() = true;
    }

    /// Clear the pause flag and wake a blocked worker. Idempotent.
    pub fn resume(&self) {
        *self.paused.lock() = false;
        self.wake.notify_all();
    }

    /// Set the stop flag and release any pause so the worker can observe it.
    pub fn stop(&self) {
        let mut paused = self.paused.lock();
        self.stop.store(true, Ordering::SeqCst);
        *paused = false;
        self.wake.notify_all();
    }

    #[cfg(test)]
    fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Iteration boundary: block while paused, then report whether to keep going.
    /// Stop always wins over pause.
    pub fn checkpoint(&self) -> Checkpoint {
        let mut paused = self.paused.lock();
        while *paused && !self.is_stop_requested() {
            self.wake.wait(&mut paused);
        }
        if self.is_stop_requested() {
            Checkpoint::Stop
        } else {
            Checkpoint::Continue
        }
    }
}

impl Waiter for ControlSignals {
    fn settle(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    fn pace(&self, duration: Duration) -> bool {
        if self.is_stop_requested() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }
        let deadline = Instant::now() + duration;
        let mut paused = self.paused.lock();
        while !self.is_stop_requested() {
            if self.wake.wait_until(&mut paused, deadline).timed_out() {
                break;
            }
        }
        !self.is_stop_requested()
    }
}

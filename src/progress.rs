//! Progress reporting and cooperative cancellation.
//!
//! A build runs on one thread. Other threads may poll its [`Progress`] and flip
//! its [`CancellationToken`]; the builder checks the token between iterations
//! and aborts with [`Error::Cancelled`](crate::Error::Cancelled).

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Percentage value meaning "total work not known".
pub const INDETERMINATE: i32 = -1;

#[derive(Debug, Default)]
struct ProgressState {
    percent: AtomicI32,
    status: Mutex<String>,
}

/// Shared, pollable progress of a running build.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    inner: Arc<ProgressState>,
}

impl Progress {
    /// Create a fresh handle at 0% with an empty status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current percentage in `0..=100`, or [`INDETERMINATE`].
    pub fn percent(&self) -> i32 {
        self.inner.percent.load(Ordering::Relaxed)
    }

    /// Whether the current phase has no known total.
    pub fn is_indeterminate(&self) -> bool {
        self.percent() < 0
    }

    /// Name of the current phase.
    pub fn status(&self) -> String {
        self.inner.status.lock().clone()
    }

    /// Enter a phase, resetting the percentage.
    ///
    /// The percentage is reset before the status changes, so an observer that
    /// sees the new status also sees the new starting percentage.
    pub fn begin(&self, status: &str, indeterminate: bool) {
        let start = if indeterminate { INDETERMINATE } else { 0 };
        self.inner.percent.store(start, Ordering::Relaxed);

        let mut guard = self.inner.status.lock();
        guard.clear();
        guard.push_str(status);
    }

    /// Report `done` out of `total` units of the current phase.
    pub fn report(&self, done: usize, total: usize) {
        self.set_percent(percent_of(done, total));
    }

    /// Set the percentage directly; values are clamped to `0..=100` unless
    /// [`INDETERMINATE`].
    pub fn set_percent(&self, percent: i32) {
        let value = if percent < 0 {
            INDETERMINATE
        } else {
            percent.min(100)
        };
        self.inner.percent.store(value, Ordering::Relaxed);
    }

    /// Return to the idle state (0%, empty status).
    pub fn reset(&self) {
        self.inner.status.lock().clear();
        self.inner.percent.store(0, Ordering::Relaxed);
    }
}

fn percent_of(done: usize, total: usize) -> i32 {
    if total == 0 {
        return 100;
    }
    let p = (done.min(total) as u128 * 100) / total as u128;
    p as i32
}

/// Cooperative cancellation signal shared between a build and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear a previous request so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

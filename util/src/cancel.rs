//! # Cooperative cancellation
//!
//! A [`CancelToken`] is shared between the thread performing blocking work and any thread that may
//! need to abort that work. Blocking calls are expected to observe the token at their suspension
//! points, either by waiting on it through [`CancelToken::sleep`] or by polling
//! [`CancelToken::check`], and to unwind with [`Interrupted`] once it has been cancelled.
//!
//! Cancellation is sticky: once cancelled the token stays cancelled until [`CancelToken::reset`]
//! is called by the owner of the blocking work.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Cloneable cancellation handle. All clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

/// Signal raised at a cancellation point when the token has been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Execution was interrupted")]
pub struct Interrupted;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CancelToken {
    /// Create a new, not cancelled, token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token, waking every thread currently sleeping on it.
    pub fn cancel(&self) {
        *self.lock() = true;
        self.inner.cond.notify_all();
    }

    /// Clear a previous cancellation so the token can be used for the next piece of work.
    pub fn reset(&self) {
        *self.lock() = false;
    }

    /// Returns true if the token has been cancelled and not yet reset.
    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Cancellation point which does not block.
    pub fn check(&self) -> Result<(), Interrupted> {
        match self.is_cancelled() {
            true => Err(Interrupted),
            false => Ok(()),
        }
    }

    /// Block for the given duration, returning early with `Err(Interrupted)` if the token is
    /// cancelled before or during the sleep.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now() + duration;
        let mut cancelled = self.lock();

        loop {
            if *cancelled {
                return Err(Interrupted);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }

            // Spurious wakeups are handled by re-checking the flag and the deadline
            cancelled = match self.inner.cond.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

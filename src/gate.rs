//! Process-wide write gate for the attendance store.
//!
//! The gate is a plain flag under a mutex with a condvar for waiters. It is
//! not reentrant: a holder that asks again waits on itself until its own
//! timeout fires.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::StoreError;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
pub struct AccessGate {
    held: Mutex<bool>,
    released: Condvar,
}

/// Holding this value is holding the gate. Dropping it releases the gate.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct GateGuard<'a> {
    gate: &'a AccessGate,
}

impl AccessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits at most `timeout` for the gate.
    pub fn acquire(&self, timeout: Duration) -> Result<GateGuard<'_>, StoreError> {
        let start = Instant::now();
        let mut held = self.state();
        while *held {
            let Some(remaining) = timeout.checked_sub(start.elapsed()) else {
                return Err(StoreError::LockUnavailable { waited: timeout });
            };
            let (next, _) = self
                .released
                .wait_timeout(held, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            held = next;
        }
        *held = true;
        Ok(GateGuard { gate: self })
    }

    pub fn is_held(&self) -> bool {
        *self.state()
    }

    fn state(&self) -> MutexGuard<'_, bool> {
        // The flag is always consistent, so a panic elsewhere never poisons it for us.
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        *self.gate.state() = false;
        self.gate.released.notify_one();
    }
}

//! Reader/writer lock with unlock notification.
//!
//! `DirLock` pairs an `RwLock` with a generation counter guarded by a
//! `Mutex` + `Condvar`. Writers that release directories call
//! `notify_unlocked`; waiters record the generation *before* inspecting
//! the protected state and sleep only while it is unchanged, so a release
//! landing between the inspection and the wait is never missed.
//!
//! The generation mutex is never held while taking the `RwLock`.

use std::sync::{Condvar, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

pub struct DirLock<T> {
    inner: RwLock<T>,
    generation: Mutex<u64>,
    unlocked: Condvar,
}

impl<T> DirLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
            generation: Mutex::new(0),
            unlocked: Condvar::new(),
        }
    }

    /// Shared access; a poisoned lock still yields the data
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Exclusive access; a poisoned lock still yields the data
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Current unlock generation
    pub fn generation(&self) -> u64 {
        *self.generation.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wake every waiter after directories were released
    pub fn notify_unlocked(&self) {
        let mut generation = self.generation.lock().unwrap_or_else(|e| e.into_inner());
        *generation = generation.wrapping_add(1);
        self.unlocked.notify_all();
    }

    /// Block until the generation moves past `seen` or `deadline` passes
    ///
    /// Returns false on timeout.
    pub fn wait_for_unlock(&self, seen: u64, deadline: Instant) -> bool {
        let mut generation = self.generation.lock().unwrap_or_else(|e| e.into_inner());
        while *generation == seen {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            generation = match self.unlocked.wait_timeout(generation, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

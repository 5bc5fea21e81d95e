//! In-process wake lock.
//!
//! Exclusive: a second `acquire` while held is refused, so a leaked
//! acquisition shows up as an error instead of silently stacking.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{HostError, WakeLock};

#[derive(Debug, Default)]
pub struct ProcessWakeLock {
    held: AtomicBool,
}

impl ProcessWakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

impl WakeLock for ProcessWakeLock {
    fn acquire(&self) -> Result<(), HostError> {
        if self.held.swap(true, Ordering::SeqCst) {
            return Err(HostError::WakeLock("already held".into()));
        }
        log::debug!("wake-lock: acquired");
        Ok(())
    }

    fn release(&self) {
        if self.held.swap(false, Ordering::SeqCst) {
            log::debug!("wake-lock: released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_cycle() {
        let lock = ProcessWakeLock::new();
        lock.acquire().unwrap();
        assert!(lock.is_held());
        lock.release();
        assert!(!lock.is_held());
        lock.acquire().unwrap();
    }

    #[test]
    fn double_acquire_is_refused() {
        let lock = ProcessWakeLock::new();
        lock.acquire().unwrap();
        assert!(matches!(lock.acquire(), Err(HostError::WakeLock(_))));
        assert!(lock.is_held());
    }

    #[test]
    fn release_when_not_held_is_harmless() {
        let lock = ProcessWakeLock::new();
        lock.release();
        assert!(!lock.is_held());
    }
}

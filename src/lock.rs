//! Record-level mutual exclusion.

use parking_lot::{Condvar, Mutex};

use crate::error::{DbError, Result};

/// A binary lock without an owner: any thread may release a lock taken by
/// another. The flip side is that a thread re-acquiring a lock it already
/// holds will deadlock, a documented limitation of this primitive.
#[derive(Default)]
pub struct RecordLock {
    locked: Mutex<bool>,
    released: Condvar,
}

impl RecordLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of the lock.
    pub fn is_locked(&self) -> bool {
        *self.locked.lock()
    }

    /// Acquires the lock, returning immediately if it is free and blocking
    /// until release otherwise. There is no timeout.
    pub fn lock(&self) {
        let mut locked = self.locked.lock();
        while *locked {
            self.released.wait(&mut locked);
        }
        *locked = true;
    }

    /// Releases the lock and wakes every thread blocked in
    /// [`RecordLock::lock`].
    pub fn unlock(&self) -> Result<()> {
        let mut locked = self.locked.lock();
        if !*locked {
            return Err(DbError::NotLocked);
        }
        *locked = false;
        self.released.notify_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn starts_unlocked() {
        assert!(!RecordLock::new().is_locked());
    }

    #[test]
    fn lock_then_unlock() {
        let lock = RecordLock::new();
        lock.lock();
        assert!(lock.is_locked());
        lock.unlock().unwrap();
        assert!(!lock.is_locked());
    }

    #[test]
    fn unlock_clean_lock_fails() {
        let lock = RecordLock::new();
        assert!(matches!(lock.unlock(), Err(DbError::NotLocked)));
    }

    #[test]
    fn double_unlock_fails() {
        let lock = RecordLock::new();
        lock.lock();
        lock.unlock().unwrap();
        assert!(matches!(lock.unlock(), Err(DbError::NotLocked)));
    }

    #[test]
    fn foreign_thread_may_unlock() {
        let lock = Arc::new(RecordLock::new());
        lock.lock();

        let other = Arc::clone(&lock);
        thread::spawn(move || other.unlock().unwrap())
            .join()
            .unwrap();

        assert!(!lock.is_locked());
    }

    #[test]
    fn contended_lock_is_mutually_exclusive() {
        const THREADS: u32 = 64;

        let lock = Arc::new(RecordLock::new());
        let inside = Arc::new(AtomicU32::new(0));
        let acquisitions = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let inside = Arc::clone(&inside);
                let acquisitions = Arc::clone(&acquisitions);
                thread::spawn(move || {
                    lock.lock();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    thread::sleep(Duration::from_millis(1));
                    assert_eq!(inside.fetch_sub(1, Ordering::SeqCst), 1);
                    acquisitions.fetch_add(1, Ordering::SeqCst);
                    lock.unlock().unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(!lock.is_locked());
        assert_eq!(acquisitions.load(Ordering::SeqCst), THREADS);
    }
}

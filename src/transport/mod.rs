//! Publisher/subscriber implementations.
//!
//! This module provides concrete implementations of the domain-level
//! `Publisher` and `Subscriber` traits, exposed through constructor
//! functions and their own handle types.
//!
//! Domain code must not depend on transport-specific types.

mod memory;
mod observed;

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use memory::create_bus as create_memory_bus;
pub use memory::{MemoryPublisher, MemorySubscriber};
pub use observed::{ObservedMessage, ObservedPublisher};

/// Acquire mutex guard, ignoring poisoning
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Acquire read guard, ignoring poisoning
fn read_ignore_poison<T>(rw: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match rw.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Acquire write guard, ignoring poisoning
fn write_ignore_poison<T>(rw: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match rw.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_poisoned_locks_stay_usable() {
        // ---
        let mutex = Arc::new(Mutex::new(1));
        let rw = Arc::new(RwLock::new(vec![1]));

        let poisoner = {
            let mutex = Arc::clone(&mutex);
            let rw = Arc::clone(&rw);
            std::thread::spawn(move || {
                let _m = mutex.lock().expect("fresh mutex");
                let _w = rw.write().expect("fresh rwlock");
                panic!("poison both locks");
            })
        };
        assert!(poisoner.join().is_err());
        assert!(mutex.is_poisoned());
        assert!(rw.is_poisoned());

        *lock_ignore_poison(&mutex) += 1;
        write_ignore_poison(&rw).push(2);

        assert_eq!(*lock_ignore_poison(&mutex), 2);
        assert_eq!(*read_ignore_poison(&rw), vec![1, 2]);
    }
}

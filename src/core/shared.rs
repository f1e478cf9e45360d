use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `Shared` provides synchronized access to a value of type `T` that is read by
/// worker threads and mutated on the coordinating thread. Reads are concurrent;
/// writes are exclusive.
///
/// Worker-side users should hold the read guard only long enough to copy what
/// they need; long-lived guards starve the writer that loads and unloads
/// regions.
pub struct Shared<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> Shared<T> {
    /// Creates a new `Shared` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard for the contained value.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap()
    }

    /// Returns a write guard for the contained value.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap()
    }
}

impl<T: Send + Sync> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

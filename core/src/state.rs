use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

/// State shared between a component handle and the tasks it spawns.
///
/// Locks are short and never held across an `.await`. Each `update`
/// bumps a revision so views can wait for `changed()`.
pub struct Shared<T> {
    inner: Arc<Mutex<T>>,
    revision: Arc<watch::Sender<u64>>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared {
            inner: Arc::clone(&self.inner),
            revision: Arc::clone(&self.revision),
        }
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Shared::new(T::default())
    }
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        let (revision, _) = watch::channel(0);
        Shared {
            inner: Arc::new(Mutex::new(value)),
            revision: Arc::new(revision),
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        // a panic elsewhere must not wedge the UI state
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock())
    }

    /// Mutate and notify observers.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.lock());
        self.notify();
        result
    }

    /// Mutate without notifying; the closure reports whether to notify.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let changed = f(&mut self.lock());
        if changed {
            self.notify();
        }
        changed
    }

    pub fn notify(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }
}

impl<T: Clone> Shared<T> {
    pub fn get(&self) -> T {
        self.lock().clone()
    }
}

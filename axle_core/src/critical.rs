//! Short critical sections around state shared with the tick thread.

use std::sync::{Arc, Mutex, PoisonError};

/// State owned by the tick context and read by the main loop.
///
/// Every access goes through [`Shared::with`]; keep the closure short, the
/// tick thread blocks for as long as it runs.
#[derive(Debug, Default)]
pub struct Shared<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Run `f` with exclusive access. A panic in another holder does not
    /// poison the state for later callers.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

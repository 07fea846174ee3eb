//! `Mutex` used by the registry and the name translation table. Swapped for Loom's under
//! `--features loom` so the registry's currency invariant can be model-checked.

#[cfg(all(feature = "loom", test))]
pub(crate) use loom::sync::{Mutex, MutexGuard};
#[cfg(not(all(feature = "loom", test)))]
pub(crate) use std::sync::{Mutex, MutexGuard};

/// Locks `m`, ignoring poisoning: every critical section leaves the data consistent before any
/// call that could panic.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//! How a ring side waits when its region is empty (consumer) or full (producer).
//!
//! The mode is chosen once per ring. Everything above the ring is written against
//! [`WaitStrategy`] and never branches on the mode itself.

use std::sync::{Condvar, Mutex, PoisonError};

/// Setting this to a truthy value (`1`/`true`/`yes`/`on`) selects [`TransportMode::Blocking`].
/// Anything else, including leaving it unset, selects [`TransportMode::BusyPoll`].
pub(crate) const TRANSPORT_BLOCKING_ENV: &str = "SHADOWGL_TRANSPORT_BLOCKING";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportMode {
    /// Region queries return immediately; callers retry after a short sleep.
    #[default]
    BusyPoll,
    /// Region queries block on a per-direction condition variable.
    Blocking,
}

impl TransportMode {
    pub fn from_env() -> Self {
        if env_var_truthy(TRANSPORT_BLOCKING_ENV) {
            TransportMode::Blocking
        } else {
            TransportMode::BusyPoll
        }
    }

    pub(crate) fn strategy(self) -> Box<dyn WaitStrategy> {
        match self {
            TransportMode::BusyPoll => Box::new(BusyPoll),
            TransportMode::Blocking => Box::new(Blocking::default()),
        }
    }
}

fn env_var_truthy(name: &str) -> bool {
    let Ok(raw) = std::env::var(name) else {
        return false;
    };
    is_truthy(&raw)
}

fn is_truthy(raw: &str) -> bool {
    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

/// Which condition a side is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The producer needs free bytes.
    Space,
    /// The consumer needs committed bytes.
    Data,
}

pub trait WaitStrategy: Send + Sync {
    fn mode(&self) -> TransportMode;

    /// Waits until `ready()` holds and returns `true`, or returns `ready()` immediately if this
    /// strategy leaves retrying to the caller.
    fn wait(&self, dir: Direction, ready: &dyn Fn() -> bool) -> bool;

    /// Wakes the side waiting on `dir`. Called after the shared counters were updated.
    fn notify(&self, dir: Direction);
}

pub struct BusyPoll;

impl WaitStrategy for BusyPoll {
    fn mode(&self) -> TransportMode {
        TransportMode::BusyPoll
    }

    fn wait(&self, _dir: Direction, ready: &dyn Fn() -> bool) -> bool {
        ready()
    }

    fn notify(&self, _dir: Direction) {}
}

/// One mutex plus one condition variable per direction.
///
/// The predicate is always re-checked under the mutex and `notify` takes the mutex before
/// signalling, so a wakeup can't slip between a waiter's check and its `wait`.
#[derive(Default)]
pub struct Blocking {
    lock: Mutex<()>,
    space: Condvar,
    data: Condvar,
}

impl Blocking {
    fn condvar(&self, dir: Direction) -> &Condvar {
        match dir {
            Direction::Space => &self.space,
            Direction::Data => &self.data,
        }
    }
}

impl WaitStrategy for Blocking {
    fn mode(&self) -> TransportMode {
        TransportMode::Blocking
    }

    fn wait(&self, dir: Direction, ready: &dyn Fn() -> bool) -> bool {
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !ready() {
            guard = self
                .condvar(dir)
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        true
    }

    fn notify(&self, dir: Direction) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.condvar(dir).notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn truthy_values() {
        for v in ["1", "true", "TRUE", " yes ", "On"] {
            assert!(is_truthy(v), "{v:?}");
        }
        for v in ["", "0", "false", "blocking", "2"] {
            assert!(!is_truthy(v), "{v:?}");
        }
    }

    #[test]
    fn busy_poll_never_blocks() {
        let s = TransportMode::BusyPoll.strategy();
        assert!(!s.wait(Direction::Data, &|| false));
        assert!(s.wait(Direction::Data, &|| true));
    }

    #[test]
    fn blocking_wakes_on_notify() {
        let s: Arc<Blocking> = Arc::new(Blocking::default());
        let flag = Arc::new(AtomicBool::new(false));

        let waiter = {
            let s = s.clone();
            let flag = flag.clone();
            std::thread::spawn(move || s.wait(Direction::Data, &|| flag.load(Ordering::Acquire)))
        };

        std::thread::sleep(std::time::Duration::from_millis(10));
        flag.store(true, Ordering::Release);
        s.notify(Direction::Data);
        assert!(waiter.join().unwrap());
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every engine of one server.
///
/// Cheap to bump from dispatch threads; read with [`EngineStats::snapshot`].
#[derive(Debug, Default)]
pub struct EngineStats {
    records_dispatched: AtomicU64,
    driver_calls: AtomicU64,
    calls_elided: AtomicU64,
    errors_recorded: AtomicU64,
    authoritative_error_queries: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStatsSnapshot {
    pub records_dispatched: u64,
    pub driver_calls: u64,
    pub calls_elided: u64,
    pub errors_recorded: u64,
    pub authoritative_error_queries: u64,
}

impl EngineStats {
    pub fn inc_records_dispatched(&self) {
        self.records_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_driver_calls(&self) {
        self.driver_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_calls_elided(&self) {
        self.calls_elided.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_errors_recorded(&self) {
        self.errors_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_authoritative_error_queries(&self) {
        self.authoritative_error_queries
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            records_dispatched: self.records_dispatched.load(Ordering::Relaxed),
            driver_calls: self.driver_calls.load(Ordering::Relaxed),
            calls_elided: self.calls_elided.load(Ordering::Relaxed),
            errors_recorded: self.errors_recorded.load(Ordering::Relaxed),
            authoritative_error_queries: self.authoritative_error_queries.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let stats = EngineStats::default();
        stats.inc_calls_elided();
        stats.inc_calls_elided();
        stats.inc_errors_recorded();
        let snap = stats.snapshot();
        assert_eq!(snap.calls_elided, 2);
        assert_eq!(snap.errors_recorded, 1);
        assert_eq!(snap.driver_calls, 0);
    }
}

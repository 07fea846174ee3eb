use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::layout::{DEFAULT_RING_BYTES, DEFAULT_SHM_DIR};
use crate::transport::TransportMode;

/// Requested ring capacity in bytes, before page rounding.
pub(crate) const RING_BYTES_ENV: &str = "SHADOWGL_RING_BYTES";
/// Directory that holds the (immediately unlinked) ring backing files.
pub(crate) const SHM_DIR_ENV: &str = "SHADOWGL_SHM_DIR";
/// Sleep between empty polls in busy-poll mode.
pub(crate) const POLL_INTERVAL_ENV: &str = "SHADOWGL_POLL_INTERVAL_NS";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_nanos(100);

/// Construction parameters for one ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingConfig {
    pub capacity_bytes: usize,
    pub mode: TransportMode,
    pub shm_dir: PathBuf,
    pub poll_interval: Duration,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_RING_BYTES,
            mode: TransportMode::BusyPoll,
            shm_dir: PathBuf::from(DEFAULT_SHM_DIR),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl RingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self {
            mode: TransportMode::from_env(),
            ..Self::default()
        };
        if let Some(bytes) = parse_env::<usize>(RING_BYTES_ENV)? {
            cfg.capacity_bytes = bytes;
        }
        if let Ok(dir) = std::env::var(SHM_DIR_ENV) {
            if !dir.trim().is_empty() {
                cfg.shm_dir = PathBuf::from(dir);
            }
        }
        if let Some(ns) = parse_env::<u64>(POLL_INTERVAL_ENV)? {
            cfg.poll_interval = Duration::from_nanos(ns);
        }
        Ok(cfg)
    }

    pub fn with_capacity(mut self, capacity_bytes: usize) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    pub fn with_mode(mut self, mode: TransportMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Parses an optional numeric environment variable. Unset or blank means "use the default".
pub fn parse_env<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(None);
    };
    parse_value(var, &raw)
}

fn parse_value<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<Option<T>, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(|_| ConfigError {
        var,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_fall_back_to_defaults() {
        assert_eq!(parse_value::<usize>(RING_BYTES_ENV, "  ").unwrap(), None);
        assert_eq!(parse_value::<usize>(RING_BYTES_ENV, "4096").unwrap(), Some(4096));
    }

    #[test]
    fn garbage_is_reported_with_the_variable_name() {
        let err = parse_value::<u64>(POLL_INTERVAL_ENV, "soon").unwrap_err();
        assert_eq!(err.var, POLL_INTERVAL_ENV);
        assert_eq!(err.value, "soon");
    }

    #[test]
    fn default_is_one_mebibyte_busy_poll() {
        let cfg = RingConfig::default();
        assert_eq!(cfg.capacity_bytes, 1 << 20);
        assert_eq!(cfg.mode, TransportMode::BusyPoll);
    }
}

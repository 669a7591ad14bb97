//! Configuration for the access engine

use std::time::Duration;

/// Minimum wall-clock delay between successive sidecar re-checks of one object
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(20);

/// Default number of concurrent stat calls during content-size backfill
pub const DEFAULT_STAT_CONCURRENCY: usize = 4;

/// Tunables for the access service
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// How long an indexed object is served without re-checking its sidecar.
    /// Bounds staleness under load while preventing backend storms.
    pub refresh_interval: Duration,

    /// Concurrent stat calls during content-size backfill. Remote backends
    /// (S3) reward modest parallelism; local disks saturate at low
    /// concurrency. `0` means "use available parallelism".
    pub stat_concurrency: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            stat_concurrency: DEFAULT_STAT_CONCURRENCY,
        }
    }
}

impl AccessConfig {
    /// Resolve the configured stat concurrency to a usable worker count
    pub fn effective_stat_concurrency(&self) -> usize {
        if self.stat_concurrency >= 1 {
            return self.stat_concurrency;
        }
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(DEFAULT_STAT_CONCURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AccessConfig::default();
        assert_eq!(config.refresh_interval, Duration::from_secs(20));
        assert_eq!(config.effective_stat_concurrency(), 4);
    }

    #[test]
    fn test_zero_concurrency_uses_parallelism() {
        let config = AccessConfig {
            stat_concurrency: 0,
            ..AccessConfig::default()
        };
        assert!(config.effective_stat_concurrency() >= 1);
    }
}

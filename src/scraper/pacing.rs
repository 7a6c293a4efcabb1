use std::time::Duration;

use crate::config::ScrapingConfig;

/// Randomized delay before each navigation/extraction step. A fixed cadence
/// is an easy fingerprint, so every call draws a fresh duration from the
/// configured range.
#[derive(Debug, Clone, Copy)]
pub struct PacingPolicy {
    min_ms: u64,
    max_ms: u64,
}

impl PacingPolicy {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        // An inverted range is a config mistake; normalize instead of panicking.
        if min_ms <= max_ms {
            Self { min_ms, max_ms }
        } else {
            Self {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        }
    }

    pub fn from_config(config: &ScrapingConfig) -> Self {
        Self::new(config.pacing_min_ms, config.pacing_max_ms)
    }

    pub fn next_delay(&self) -> Duration {
        Duration::from_millis(fastrand::u64(self.min_ms..=self.max_ms))
    }
}

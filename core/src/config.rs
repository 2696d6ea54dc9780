//! # Coordinator Configuration
//!
//! Tunables for link quiescence and the lifecycle hooks. The defaults match
//! the shipping firmware's timing.

use core::fmt;

use static_assertions::const_assert;

// ============================================================================
// DEFAULTS
// ============================================================================

/// Link status polls before giving up on removal
pub const DEFAULT_POLL_ATTEMPTS: u32 = 20;

/// Sleep between link status polls
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 50;

/// Longest total wait accepted by [`ShpsConfig::validate`]
pub const MAX_QUIESCENCE_MS: u64 = 10_000;

const_assert!(DEFAULT_POLL_ATTEMPTS > 0);
const_assert!(DEFAULT_POLL_INTERVAL_MS > 0);
const_assert!((DEFAULT_POLL_ATTEMPTS as u64) * (DEFAULT_POLL_INTERVAL_MS as u64) <= MAX_QUIESCENCE_MS);

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Coordinator configuration parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShpsConfig {
    /// Link status polls while waiting for removal
    pub poll_attempts: u32,
    /// Milliseconds slept between polls
    pub poll_interval_ms: u32,
    /// Drive the bus path off at the end of probe
    pub power_off_at_probe: bool,
    /// Drive the bus path on at system shutdown
    pub power_on_at_shutdown: bool,
}

impl Default for ShpsConfig {
    fn default() -> Self {
        Self {
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            power_off_at_probe: true,
            power_on_at_shutdown: true,
        }
    }
}

impl ShpsConfig {
    /// Configuration with custom quiescence timing
    pub fn with_polling(attempts: u32, interval_ms: u32) -> Self {
        Self {
            poll_attempts: attempts,
            poll_interval_ms: interval_ms,
            ..Default::default()
        }
    }

    /// Leave the device in whatever state firmware handed over
    pub fn passive() -> Self {
        Self {
            power_off_at_probe: false,
            power_on_at_shutdown: false,
            ..Default::default()
        }
    }

    /// Worst-case time spent waiting for link removal
    pub fn quiescence_budget_ms(&self) -> u64 {
        u64::from(self.poll_attempts) * u64::from(self.poll_interval_ms)
    }

    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_attempts == 0 {
            return Err(ConfigError::ZeroPollAttempts);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.quiescence_budget_ms() > MAX_QUIESCENCE_MS {
            return Err(ConfigError::QuiescenceTooLong);
        }
        Ok(())
    }
}

/// Configuration validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `poll_attempts` is zero
    ZeroPollAttempts,
    /// `poll_interval_ms` is zero
    ZeroPollInterval,
    /// Total quiescence wait exceeds [`MAX_QUIESCENCE_MS`]
    QuiescenceTooLong,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPollAttempts => write!(f, "poll attempts must be non-zero"),
            Self::ZeroPollInterval => write!(f, "poll interval must be non-zero"),
            Self::QuiescenceTooLong => {
                write!(f, "quiescence wait exceeds {} ms", MAX_QUIESCENCE_MS)
            },
        }
    }
}

//! Polling configuration for awaits
//!
//! Every await runs against a [`PollConfig`]: how often the condition is
//! evaluated, how long to wait before the first evaluation, and when to give
//! up. Callers override it per await; the process-wide default is read once
//! from the environment.
//!
//! ## Environment
//!
//! | Variable                   | Field           | Default |
//! |----------------------------|-----------------|---------|
//! | `SIPUNIT_POLL_INTERVAL_MS` | `poll_interval` | 100     |
//! | `SIPUNIT_MAX_WAIT_MS`      | `max_wait`      | 10000   |
//! | `SIPUNIT_POLL_DELAY_MS`    | `poll_delay`    | 0       |
//!
//! ## Examples
//!
//! ```rust
//! use rvoip_sip_unit::PollConfig;
//! use std::time::Duration;
//!
//! let config = PollConfig::default()
//!     .with_max_wait(Duration::from_millis(500))
//!     .with_poll_interval(Duration::from_millis(20));
//!
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SipUnitError};

/// Default pause between two evaluations of a condition
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default time after which an await gives up
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10);

/// Default delay before the first evaluation
pub const DEFAULT_POLL_DELAY: Duration = Duration::ZERO;

pub const ENV_POLL_INTERVAL_MS: &str = "SIPUNIT_POLL_INTERVAL_MS";
pub const ENV_MAX_WAIT_MS: &str = "SIPUNIT_MAX_WAIT_MS";
pub const ENV_POLL_DELAY_MS: &str = "SIPUNIT_POLL_DELAY_MS";

static GLOBAL: Lazy<PollConfig> = Lazy::new(|| match PollConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
        warn!("Ignoring polling environment, using defaults: {}", e);
        PollConfig::default()
    }
});

/// Timing of an await.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Pause between evaluations
    pub poll_interval: Duration,
    /// Deadline, measured from the start of the await
    pub max_wait: Duration,
    /// Wait before the first evaluation
    pub poll_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            poll_delay: DEFAULT_POLL_DELAY,
        }
    }
}

impl PollConfig {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
            ..Default::default()
        }
    }

    /// The process-wide default.
    ///
    /// Built on first use from [`PollConfig::from_env`]; a malformed
    /// environment falls back to [`PollConfig::default`] with a warning.
    pub fn global() -> PollConfig {
        *GLOBAL
    }

    /// Defaults overlaid with the `SIPUNIT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(interval) = env_millis(ENV_POLL_INTERVAL_MS)? {
            config.poll_interval = interval;
        }
        if let Some(max_wait) = env_millis(ENV_MAX_WAIT_MS)? {
            config.max_wait = max_wait;
        }
        if let Some(delay) = env_millis(ENV_POLL_DELAY_MS)? {
            config.poll_delay = delay;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(SipUnitError::config("poll interval must be greater than zero"));
        }
        if self.poll_delay > self.max_wait {
            return Err(SipUnitError::config(format!(
                "poll delay {:?} exceeds max wait {:?}",
                self.poll_delay, self.max_wait
            )));
        }
        Ok(())
    }
}

fn env_millis(name: &str) -> Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| SipUnitError::config(format!("{} is not a number of milliseconds: {:?}", name, value))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(SipUnitError::config(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Environment mutation is only done from #[serial] tests.
    fn set_env(name: &str, value: &str) {
        unsafe { std::env::set_var(name, value) }
    }

    fn clear_env() {
        for name in [ENV_POLL_INTERVAL_MS, ENV_MAX_WAIT_MS, ENV_POLL_DELAY_MS] {
            unsafe { std::env::remove_var(name) }
        }
    }

    #[test]
    fn test_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.max_wait, Duration::from_secs(10));
        assert_eq!(config.poll_delay, Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let zero_interval = PollConfig::default().with_poll_interval(Duration::ZERO);
        assert!(zero_interval.validate().is_err());

        let late_delay = PollConfig::new(Duration::from_millis(10), Duration::from_millis(50))
            .with_poll_delay(Duration::from_millis(60));
        assert!(late_delay.validate().is_err());

        let ok = PollConfig::new(Duration::from_millis(10), Duration::from_millis(50))
            .with_poll_delay(Duration::from_millis(50));
        assert!(ok.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        set_env(ENV_POLL_INTERVAL_MS, "25");
        set_env(ENV_MAX_WAIT_MS, " 750 ");

        let config = PollConfig::from_env().unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(25));
        assert_eq!(config.max_wait, Duration::from_millis(750));
        assert_eq!(config.poll_delay, DEFAULT_POLL_DELAY);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        clear_env();
        set_env(ENV_MAX_WAIT_MS, "soon");
        let err = PollConfig::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_WAIT_MS));

        set_env(ENV_MAX_WAIT_MS, "10");
        set_env(ENV_POLL_DELAY_MS, "20");
        assert!(PollConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_without_variables_is_default() {
        clear_env();
        assert_eq!(PollConfig::from_env().unwrap(), PollConfig::default());
    }

    #[test]
    fn test_serde() {
        let config = PollConfig::new(Duration::from_millis(50), Duration::from_millis(200));
        let json = serde_json::to_string(&config).unwrap();
        let back: PollConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

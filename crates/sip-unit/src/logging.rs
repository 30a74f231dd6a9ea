//! Logging bootstrap for test binaries.
//!
//! Tests call [`init_test_logging`] at the top of each test; only the first
//! call installs a subscriber. `RUST_LOG` overrides the default level, e.g.
//! `RUST_LOG=rvoip_sip_unit=trace` to watch every poll attempt.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, SipUnitError};

/// Install a test-friendly subscriber at `WARN`, unless `RUST_LOG` says otherwise.
pub fn init_test_logging() {
    init_logging(Level::WARN);
}

/// Install a subscriber writing through the test harness's captured output.
///
/// Repeated calls are no-ops.
pub fn init_logging(level: Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| SipUnitError::config(format!("Invalid log level: {}", level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn test_init_is_idempotent() {
        init_test_logging();
        init_test_logging();
        init_logging(Level::TRACE);
        tracing::debug!("logging initialised twice without panicking");
    }
}

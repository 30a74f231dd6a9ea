//! Error types for the SIP test assertion layer
//!
//! Three families are kept apart so a failing test says what went wrong:
//!
//! - [`ConditionError`] is reported by a condition body while it is being
//!   polled. `NotYet` is retried, `Fatal` stops polling immediately.
//! - [`AwaitError`] is what an await returns: it either timed out, or a
//!   condition failed fatally.
//! - [`SipUnitError`] is the crate-level error, wrapping the above plus
//!   configuration problems.

use std::time::Duration;

use thiserror::Error;

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, SipUnitError>;

/// Crate-level error
#[derive(Debug, Error)]
pub enum SipUnitError {
    /// Invalid polling configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An await did not succeed
    #[error(transparent)]
    Await(#[from] AwaitError),
}

impl SipUnitError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True if this is an await that ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SipUnitError::Await(AwaitError::Timeout { .. }))
    }
}

/// Failure of a single await.
#[derive(Debug, Error)]
pub enum AwaitError {
    /// The deadline passed without the condition being satisfied
    #[error(
        "timed out after {elapsed:?} (max wait {max_wait:?}, {attempts} attempts) waiting for {description}{}",
        .last_reason.as_ref().map(|r| format!(": {}", r)).unwrap_or_default()
    )]
    Timeout {
        description: String,
        max_wait: Duration,
        elapsed: Duration,
        attempts: u32,
        /// Last "not yet" reason reported by the condition, if any
        last_reason: Option<String>,
    },

    /// The condition raised an unexpected error; polling stopped
    #[error("fatal error while waiting for {description} (attempt {attempts}): {source}")]
    Fatal {
        description: String,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
}

impl AwaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AwaitError::Timeout { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, AwaitError::Fatal { .. })
    }

    /// Number of times the condition was evaluated.
    pub fn attempts(&self) -> u32 {
        match self {
            AwaitError::Timeout { attempts, .. } | AwaitError::Fatal { attempts, .. } => *attempts,
        }
    }
}

/// Reported by a condition that is not satisfied.
#[derive(Debug, Error)]
pub enum ConditionError {
    /// Expected state not reached yet; retried
    #[error("not yet: {0}")]
    NotYet(String),

    /// Unexpected failure; never retried
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl ConditionError {
    pub fn not_yet(reason: impl Into<String>) -> Self {
        Self::NotYet(reason.into())
    }

    pub fn fatal(error: impl Into<anyhow::Error>) -> Self {
        Self::Fatal(error.into())
    }
}

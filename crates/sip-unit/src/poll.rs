//! # Await Engine
//!
//! Bounded-retry polling that turns "eventually true" conditions into a
//! deterministic pass or fail. A condition is evaluated, and if it is not
//! satisfied the caller sleeps for the poll interval and tries again, until
//! the condition holds or the maximum wait has elapsed.
//!
//! ```text
//!            ┌─────────┐  satisfied   ┌───────────┐
//!  start ──► │ POLLING │ ───────────► │ SATISFIED │
//!            └─────────┘              └───────────┘
//!              │     │  deadline      ┌───────────┐
//!              │     └──────────────► │ TIMED_OUT │
//!              │       fatal error    ├───────────┤
//!              └────────────────────► │   FATAL   │
//!                                     └───────────┘
//! ```
//!
//! Every await runs a fresh state machine; nothing is shared between awaits,
//! so they can be nested.
//!
//! ## Retryable vs fatal
//!
//! | Condition outcome                                  | Handling       |
//! |----------------------------------------------------|----------------|
//! | `Ok(true)` / `Ok(Some(_))` / value matches         | satisfied      |
//! | `Ok(false)` / `Ok(None)` / value does not match    | retry          |
//! | `Err(ConditionError::NotYet(_))`                   | retry          |
//! | panic inside [`Poller::until_asserted`]            | retry          |
//! | `Err(ConditionError::Fatal(_))` (incl. `?` on `anyhow`) | stop, propagate |
//!
//! A panic raised by any other form is not caught. Every caught panic still
//! goes through the process panic hook, so each failed attempt of an
//! `until_asserted` await prints its panic message to the test output.
//!
//! A poll interval of zero is treated as [`MIN_POLL_INTERVAL`], so an await
//! never spins without sleeping.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use rvoip_sip_unit::{MessageListener, MessageStore, Poller};
//! use std::time::Duration;
//!
//! # async fn example(store: MessageStore) -> Result<(), rvoip_sip_unit::AwaitError> {
//! Poller::new("two responses")
//!     .within(Duration::from_secs(2))
//!     .poll_interval(Duration::from_millis(20))
//!     .until(|| Ok(store.all_received_responses().len() == 2))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::config::PollConfig;
use crate::error::{AwaitError, ConditionError};

/// Outcome of one evaluation of a condition
pub type ConditionResult<T> = Result<T, ConditionError>;

/// Shortest pause between two evaluations
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Builder for a single await.
#[derive(Debug, Clone)]
pub struct Poller {
    description: String,
    config: PollConfig,
}

impl Poller {
    /// Starts from the process-wide [`PollConfig::global`].
    ///
    /// `description` names what is awaited and appears in failures.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            config: PollConfig::global(),
        }
    }

    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the maximum wait.
    pub fn within(mut self, max_wait: Duration) -> Self {
        self.config.max_wait = max_wait;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn poll_delay(mut self, delay: Duration) -> Self {
        self.config.poll_delay = delay;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    // ==================== Async drivers ====================

    /// Wait until `condition` returns `Ok(true)`.
    pub async fn until<F>(self, mut condition: F) -> Result<(), AwaitError>
    where
        F: FnMut() -> ConditionResult<bool>,
    {
        self.until_some(move || condition().map(|done| done.then_some(())))
            .await
    }

    /// Wait until `condition` produces a value, and return it.
    pub async fn until_some<T, F>(self, mut condition: F) -> Result<T, AwaitError>
    where
        F: FnMut() -> ConditionResult<Option<T>>,
    {
        let mut run = PollRun::start(self);
        if !run.config.poll_delay.is_zero() {
            tokio::time::sleep(run.config.poll_delay).await;
        }
        loop {
            match run.step(condition()) {
                Step::Satisfied(value) => return Ok(value),
                Step::Sleep(pause) => tokio::time::sleep(pause).await,
                Step::Failed(e) => return Err(e),
            }
        }
    }

    /// Wait until `condition` produces a value equal to `expected`.
    pub async fn until_eq<T, F>(self, mut condition: F, expected: T) -> Result<T, AwaitError>
    where
        F: FnMut() -> ConditionResult<T>,
        T: PartialEq + Debug,
    {
        self.until_some(move || equal_to(condition()?, &expected))
            .await
    }

    /// Wait until `condition` produces a value accepted by `matcher`.
    pub async fn until_matches<T, F, M>(self, mut condition: F, matcher: M) -> Result<T, AwaitError>
    where
        F: FnMut() -> ConditionResult<T>,
        M: Fn(&T) -> bool,
    {
        self.until_some(move || {
            let value = condition()?;
            Ok(matcher(&value).then_some(value))
        })
        .await
    }

    /// Wait until `assertion` runs without panicking.
    ///
    /// A panic (a failed `assert!`) counts as "not yet"; its message becomes
    /// the reason reported on timeout.
    pub async fn until_asserted<F>(self, mut assertion: F) -> Result<(), AwaitError>
    where
        F: FnMut(),
    {
        self.until_some(move || run_assertion(&mut assertion))
            .await
    }

    // ==================== Blocking drivers ====================

    /// Blocking form of [`Poller::until`], for synchronous tests.
    pub fn until_blocking<F>(self, mut condition: F) -> Result<(), AwaitError>
    where
        F: FnMut() -> ConditionResult<bool>,
    {
        self.until_some_blocking(move || condition().map(|done| done.then_some(())))
    }

    /// Blocking form of [`Poller::until_some`].
    pub fn until_some_blocking<T, F>(self, mut condition: F) -> Result<T, AwaitError>
    where
        F: FnMut() -> ConditionResult<Option<T>>,
    {
        let mut run = PollRun::start(self);
        if !run.config.poll_delay.is_zero() {
            std::thread::sleep(run.config.poll_delay);
        }
        loop {
            match run.step(condition()) {
                Step::Satisfied(value) => return Ok(value),
                Step::Sleep(pause) => std::thread::sleep(pause),
                Step::Failed(e) => return Err(e),
            }
        }
    }

    /// Blocking form of [`Poller::until_eq`].
    pub fn until_eq_blocking<T, F>(self, mut condition: F, expected: T) -> Result<T, AwaitError>
    where
        F: FnMut() -> ConditionResult<T>,
        T: PartialEq + Debug,
    {
        self.until_some_blocking(move || equal_to(condition()?, &expected))
    }

    /// Blocking form of [`Poller::until_asserted`].
    pub fn until_asserted_blocking<F>(self, mut assertion: F) -> Result<(), AwaitError>
    where
        F: FnMut(),
    {
        self.until_some_blocking(move || run_assertion(&mut assertion))
    }
}

fn equal_to<T: PartialEq + Debug>(value: T, expected: &T) -> ConditionResult<Option<T>> {
    if value == *expected {
        Ok(Some(value))
    } else {
        Err(ConditionError::NotYet(format!(
            "expected {:?} but was {:?}",
            expected, value
        )))
    }
}

fn run_assertion<F: FnMut()>(assertion: &mut F) -> ConditionResult<Option<()>> {
    match panic::catch_unwind(AssertUnwindSafe(|| assertion())) {
        Ok(()) => Ok(Some(())),
        Err(payload) => Err(ConditionError::NotYet(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "assertion failed".to_string()
    }
}

enum Step<T> {
    Satisfied(T),
    Sleep(Duration),
    Failed(AwaitError),
}

/// State of one await, shared by the async and blocking drivers.
struct PollRun {
    description: String,
    config: PollConfig,
    started: Instant,
    attempts: u32,
    last_reason: Option<String>,
}

impl PollRun {
    fn start(mut poller: Poller) -> Self {
        if poller.config.poll_interval < MIN_POLL_INTERVAL {
            warn!(
                "Await for {}: poll interval {:?} is below {:?}, using the minimum",
                poller.description, poller.config.poll_interval, MIN_POLL_INTERVAL
            );
            poller.config.poll_interval = MIN_POLL_INTERVAL;
        }
        trace!(
            "Awaiting {} (interval {:?}, max wait {:?})",
            poller.description, poller.config.poll_interval, poller.config.max_wait
        );
        Self {
            description: poller.description,
            config: poller.config,
            started: Instant::now(),
            attempts: 0,
            last_reason: None,
        }
    }

    fn step<T>(&mut self, outcome: ConditionResult<Option<T>>) -> Step<T> {
        self.attempts = self.attempts.saturating_add(1);
        match outcome {
            Ok(Some(value)) => {
                debug!(
                    "Await for {} satisfied after {} attempts ({:?})",
                    self.description,
                    self.attempts,
                    self.started.elapsed()
                );
                return Step::Satisfied(value);
            }
            Ok(None) => {}
            Err(ConditionError::NotYet(reason)) => {
                trace!("Await for {}: not yet ({})", self.description, reason);
                self.last_reason = Some(reason);
            }
            Err(ConditionError::Fatal(source)) => {
                warn!(
                    "Await for {} stopped on attempt {}: {}",
                    self.description, self.attempts, source
                );
                return Step::Failed(AwaitError::Fatal {
                    description: self.description.clone(),
                    attempts: self.attempts,
                    source,
                });
            }
        }

        let elapsed = self.started.elapsed();
        if elapsed >= self.config.max_wait {
            debug!(
                "Await for {} timed out after {} attempts ({:?})",
                self.description, self.attempts, elapsed
            );
            return Step::Failed(AwaitError::Timeout {
                description: self.description.clone(),
                max_wait: self.config.max_wait,
                elapsed,
                attempts: self.attempts,
                last_reason: self.last_reason.take(),
            });
        }
        Step::Sleep(self.config.poll_interval.min(self.config.max_wait - elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(description: &str) -> Poller {
        Poller::new(description)
            .within(Duration::from_millis(200))
            .poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_satisfied_on_first_attempt() {
        let start = Instant::now();
        fast("immediate").until(|| Ok(true)).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_returns_before_deadline_once_true() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        Poller::new("third attempt")
            .within(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until(|| Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_times_out_no_earlier_than_max_wait() {
        let start = Instant::now();
        let err = Poller::new("never")
            .within(Duration::from_millis(200))
            .poll_interval(Duration::from_millis(50))
            .until(|| Ok(false))
            .await
            .unwrap_err();
        assert!(start.elapsed() >= Duration::from_millis(200));
        match err {
            AwaitError::Timeout { elapsed, attempts, .. } => {
                assert!(elapsed >= Duration::from_millis(200));
                assert!(attempts >= 2);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fatal_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let err = Poller::new("dispose")
            .within(Duration::from_secs(5))
            .until(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ConditionError::fatal(anyhow::anyhow!("stack already disposed")))
            })
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.attempts(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_not_yet_is_retried_and_reported() {
        let calls = AtomicU32::new(0);
        fast("retry")
            .until(|| {
                if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(ConditionError::not_yet("still ringing"))
                } else {
                    Ok(true)
                }
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let err = fast("ringing stops")
            .within(Duration::from_millis(30))
            .until(|| Err(ConditionError::not_yet("still ringing")))
            .await
            .unwrap_err();
        assert!(err.to_string().ends_with("still ringing"));
    }

    #[tokio::test]
    async fn test_until_eq_returns_value() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let value = fast("count reaches 3")
            .until_eq(move || Ok(c.fetch_add(1, Ordering::SeqCst) + 1), 3)
            .await
            .unwrap();
        assert_eq!(value, 3);

        let err = fast("count reaches 99")
            .within(Duration::from_millis(30))
            .until_eq(|| Ok(1u32), 99)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected 99 but was 1"));
    }

    #[tokio::test]
    async fn test_until_matches_and_some() {
        let value = fast("even")
            .until_matches(|| Ok(4u32), |v| v % 2 == 0)
            .await
            .unwrap();
        assert_eq!(value, 4);

        let calls = AtomicU32::new(0);
        let found = fast("dialog ready")
            .until_some(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok((n >= 1).then(|| "dialog-1".to_string()))
            })
            .await
            .unwrap();
        assert_eq!(found, "dialog-1");
    }

    #[tokio::test]
    async fn test_until_asserted_retries_panics() {
        let calls = AtomicU32::new(0);
        fast("answered")
            .until_asserted(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                assert!(n >= 2, "not answered yet");
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let err = fast("never answered")
            .within(Duration::from_millis(30))
            .until_asserted(|| panic!("not answered"))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("not answered"));
    }

    #[tokio::test]
    async fn test_poll_delay_defers_first_attempt() {
        let start = Instant::now();
        fast("delayed")
            .poll_delay(Duration::from_millis(40))
            .until(|| Ok(true))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_nested_awaits_are_independent() {
        let outer_calls = AtomicU32::new(0);
        let mut inner_runs = 0;
        Poller::new("outer")
            .within(Duration::from_secs(2))
            .poll_interval(Duration::from_millis(5))
            .until_some_blocking(|| {
                fast("inner").until_blocking(|| Ok(true)).unwrap();
                inner_runs += 1;
                Ok((outer_calls.fetch_add(1, Ordering::SeqCst) >= 1).then_some(()))
            })
            .unwrap();
        assert_eq!(inner_runs, 2);
    }

    #[test]
    fn test_blocking_driver_times_out() {
        let start = Instant::now();
        let err = Poller::new("blocking never")
            .within(Duration::from_millis(100))
            .poll_interval(Duration::from_millis(20))
            .until_blocking(|| Ok(false))
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_zero_interval_still_sleeps_between_attempts() {
        let config = PollConfig::new(Duration::ZERO, Duration::from_millis(100));
        assert!(config.validate().is_err());

        let start = Instant::now();
        let err = Poller::new("zero interval")
            .with_config(config)
            .until_blocking(|| Ok(false))
            .unwrap_err();
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(err.is_timeout());
        assert!(err.attempts() <= 110, "spun {} times", err.attempts());
    }

    #[tokio::test]
    async fn test_zero_interval_async_driver() {
        let err = Poller::new("zero interval async")
            .within(Duration::from_millis(50))
            .poll_interval(Duration::ZERO)
            .until(|| Ok(false))
            .await
            .unwrap_err();
        assert!(err.attempts() <= 60, "spun {} times", err.attempts());
    }

    #[test]
    fn test_attempt_count_saturates() {
        let mut run = PollRun::start(fast("saturating"));
        run.attempts = u32::MAX;
        match run.step::<()>(Ok(None)) {
            Step::Sleep(_) => {}
            _ => panic!("expected another attempt"),
        }
        assert_eq!(run.attempts, u32::MAX);
    }

    #[test]
    fn test_blocking_driver_sees_other_thread() {
        let flag = Arc::new(AtomicU32::new(0));
        let writer = flag.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            writer.store(1, Ordering::SeqCst);
        });
        Poller::new("flag set")
            .within(Duration::from_secs(2))
            .poll_interval(Duration::from_millis(5))
            .until_blocking(|| Ok(flag.load(Ordering::SeqCst) == 1))
            .unwrap();
        handle.join().unwrap();

        fast("asserted blocking")
            .until_asserted_blocking(|| assert_eq!(flag.load(Ordering::SeqCst), 1))
            .unwrap();
        assert_eq!(fast("eq blocking").until_eq_blocking(|| Ok(7), 7).unwrap(), 7);
    }

    fn panic_plain() {
        panic!("plain")
    }

    fn panic_formatted(n: u32) {
        panic!("formatted {}", n)
    }

    #[test]
    fn test_panic_message_extraction() {
        let err = panic::catch_unwind(panic_plain).unwrap_err();
        assert_eq!(panic_message(err.as_ref()), "plain");
        let err = panic::catch_unwind(|| panic_formatted(42)).unwrap_err();
        assert_eq!(panic_message(err.as_ref()), "formatted 42");
    }
}

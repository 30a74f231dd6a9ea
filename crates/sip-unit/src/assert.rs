//! # Assertions
//!
//! Test-facing assertions over exchanges and messages. Immediate assertions
//! evaluate a predicate once and panic with a message naming what was
//! missing or unexpected. `await_*` assertions poll with the Await Engine and
//! panic with the timeout message (`timed out after …`) when the deadline
//! passes, so a test log tells "never happened" apart from "gave up waiting".
//!
//! Immediate assertions are `#[track_caller]` and report the test's line.
//! `#[track_caller]` does not carry through an `async fn`, so a failed await
//! reports its location inside this module; the panic message names what was
//! awaited.
//!
//! ```rust,no_run
//! use rvoip_sip_unit::assert::*;
//! use rvoip_sip_unit::{MessageStore, PollConfig};
//!
//! # async fn example(call: MessageStore) {
//! await_response_received(200, &call, PollConfig::global()).await;
//! assert_response_received_for(200, "INVITE", 1, &call);
//! assert_request_not_received("BYE", &call);
//! # }
//! ```

use crate::config::PollConfig;
use crate::error::{AwaitError, ConditionError};
use crate::message::SipMessage;
use crate::poll::Poller;
use crate::predicates;
use crate::store::{Disposable, EventSubscriber, MessageListener, SipActionObject, SipCall};

// ==================== Operation outcome ====================

#[track_caller]
pub fn assert_last_operation_success<O: SipActionObject + ?Sized>(op: &O) {
    let error = op.error_message();
    assert!(error.is_empty(), "expected last operation to succeed, but it failed: {}", error);
}

#[track_caller]
pub fn assert_last_operation_fail<O: SipActionObject + ?Sized>(op: &O) {
    assert!(
        !op.error_message().is_empty(),
        "expected last operation to fail, but it succeeded"
    );
}

// ==================== Headers ====================

#[track_caller]
pub fn assert_header_present<M: SipMessage + ?Sized>(message: &M, header: &str) {
    assert!(message.has_header(header), "expected header {} to be present", header);
}

#[track_caller]
pub fn assert_header_not_present<M: SipMessage + ?Sized>(message: &M, header: &str) {
    assert!(!message.has_header(header), "expected header {} to be absent", header);
}

#[track_caller]
pub fn assert_header_contains<M: SipMessage + ?Sized>(message: &M, header: &str, value: &str) {
    assert!(
        predicates::header_contains(message, header, value),
        "expected a {} header containing {:?}",
        header,
        value
    );
}

#[track_caller]
pub fn assert_header_not_contains<M: SipMessage + ?Sized>(message: &M, header: &str, value: &str) {
    assert!(
        !predicates::header_contains(message, header, value),
        "expected no {} header containing {:?}",
        header,
        value
    );
}

// ==================== Responses ====================

#[track_caller]
pub fn assert_response_received<L: MessageListener + ?Sized>(status_code: u16, obj: &L) {
    let responses = obj.all_received_responses();
    assert!(
        predicates::response_received(&responses, status_code),
        "expected response {} to have been received; received {:?}",
        status_code,
        predicates::status_codes(&responses)
    );
}

#[track_caller]
pub fn assert_response_received_for<L: MessageListener + ?Sized>(
    status_code: u16,
    method: &str,
    seq: u32,
    obj: &L,
) {
    let responses = obj.all_received_responses();
    assert!(
        predicates::response_received_for(&responses, status_code, method, seq),
        "expected response {} for CSeq {} {} to have been received; received {:?}",
        status_code,
        seq,
        method,
        predicates::status_codes(&responses)
    );
}

#[track_caller]
pub fn assert_response_not_received<L: MessageListener + ?Sized>(status_code: u16, obj: &L) {
    assert!(
        predicates::response_not_received(&obj.all_received_responses(), status_code),
        "unexpected response {} was received",
        status_code
    );
}

#[track_caller]
pub fn assert_response_not_received_for<L: MessageListener + ?Sized>(
    status_code: u16,
    method: &str,
    seq: u32,
    obj: &L,
) {
    assert!(
        predicates::response_not_received_for(&obj.all_received_responses(), status_code, method, seq),
        "unexpected response {} for CSeq {} {} was received",
        status_code,
        seq,
        method
    );
}

// ==================== Requests ====================

#[track_caller]
pub fn assert_request_received<L: MessageListener + ?Sized>(method: &str, obj: &L) {
    let requests = obj.all_received_requests();
    assert!(
        predicates::request_received(&requests, method),
        "expected request {} to have been received; received {:?}",
        method,
        predicates::methods(&requests)
    );
}

#[track_caller]
pub fn assert_request_received_for<L: MessageListener + ?Sized>(method: &str, seq: u32, obj: &L) {
    let requests = obj.all_received_requests();
    assert!(
        predicates::request_received_for(&requests, method, seq),
        "expected request {} with CSeq {} to have been received; received {:?}",
        method,
        seq,
        predicates::methods(&requests)
    );
}

#[track_caller]
pub fn assert_request_not_received<L: MessageListener + ?Sized>(method: &str, obj: &L) {
    assert!(
        predicates::request_not_received(&obj.all_received_requests(), method),
        "unexpected request {} was received",
        method
    );
}

#[track_caller]
pub fn assert_request_not_received_for<L: MessageListener + ?Sized>(method: &str, seq: u32, obj: &L) {
    assert!(
        predicates::request_not_received_for(&obj.all_received_requests(), method, seq),
        "unexpected request {} with CSeq {} was received",
        method,
        seq
    );
}

// ==================== Calls and subscriptions ====================

#[track_caller]
pub fn assert_answered<C: SipCall + ?Sized>(call: &C) {
    assert!(call.is_call_answered(), "expected the call to be answered");
}

#[track_caller]
pub fn assert_not_answered<C: SipCall + ?Sized>(call: &C) {
    assert!(!call.is_call_answered(), "expected the call not to be answered");
}

#[track_caller]
pub fn assert_no_subscription_errors<S: EventSubscriber + ?Sized>(subscription: &S) {
    let errors = subscription.event_errors();
    assert!(errors.is_empty(), "subscription reported errors: {:?}", errors);
}

// ==================== Bodies ====================

#[track_caller]
pub fn assert_body_present<M: SipMessage + ?Sized>(message: &M) {
    assert!(predicates::body_present(message), "expected a message body");
}

#[track_caller]
pub fn assert_body_not_present<M: SipMessage + ?Sized>(message: &M) {
    assert!(
        !predicates::body_present(message),
        "expected no message body, found {} bytes",
        message.content_length()
    );
}

#[track_caller]
pub fn assert_body_contains<M: SipMessage + ?Sized>(message: &M, value: &str) {
    assert_body_present(message);
    assert!(
        predicates::body_contains(message, value),
        "expected the body to contain {:?}",
        value
    );
}

#[track_caller]
pub fn assert_body_not_contains<M: SipMessage + ?Sized>(message: &M, value: &str) {
    assert!(
        !predicates::body_contains(message, value),
        "expected the body not to contain {:?}",
        value
    );
}

// ==================== Awaits ====================

fn fail_await(error: AwaitError) -> ! {
    panic!("{}", error)
}

/// Wait until `status_code` has been received.
pub async fn await_response_received<L: MessageListener + ?Sized>(status_code: u16, obj: &L, config: PollConfig) {
    let result = Poller::new(format!("response {}", status_code))
        .with_config(config)
        .until(|| {
            let responses = obj.all_received_responses();
            if predicates::response_received(&responses, status_code) {
                Ok(true)
            } else {
                Err(ConditionError::not_yet(format!(
                    "received {:?}",
                    predicates::status_codes(&responses)
                )))
            }
        })
        .await;
    if let Err(e) = result {
        fail_await(e);
    }
}

/// Wait until `status_code` for `CSeq: seq method` has been received.
pub async fn await_response_received_for<L: MessageListener + ?Sized>(
    status_code: u16,
    method: &str,
    seq: u32,
    obj: &L,
    config: PollConfig,
) {
    let result = Poller::new(format!("response {} for CSeq {} {}", status_code, seq, method))
        .with_config(config)
        .until(|| {
            let responses = obj.all_received_responses();
            if predicates::response_received_for(&responses, status_code, method, seq) {
                Ok(true)
            } else {
                Err(ConditionError::not_yet(format!(
                    "received {:?}",
                    predicates::status_codes(&responses)
                )))
            }
        })
        .await;
    if let Err(e) = result {
        fail_await(e);
    }
}

/// Wait until a `method` request has been received.
pub async fn await_request_received<L: MessageListener + ?Sized>(method: &str, obj: &L, config: PollConfig) {
    let result = Poller::new(format!("request {}", method))
        .with_config(config)
        .until(|| {
            let requests = obj.all_received_requests();
            if predicates::request_received(&requests, method) {
                Ok(true)
            } else {
                Err(ConditionError::not_yet(format!(
                    "received {:?}",
                    predicates::methods(&requests)
                )))
            }
        })
        .await;
    if let Err(e) = result {
        fail_await(e);
    }
}

/// Wait until exactly `count` responses have been received.
pub async fn await_received_responses<L: MessageListener + ?Sized>(obj: &L, count: usize, config: PollConfig) {
    let result = Poller::new(format!("{} received responses", count))
        .with_config(config)
        .until_eq(|| Ok(obj.all_received_responses().len()), count)
        .await;
    if let Err(e) = result {
        fail_await(e);
    }
}

/// Wait until the call has been answered.
pub async fn await_answered<C: SipCall + ?Sized>(call: &C, config: PollConfig) {
    let result = Poller::new("call answered")
        .with_config(config)
        .until_asserted(|| assert_answered(call))
        .await;
    if let Err(e) = result {
        fail_await(e);
    }
}

/// Wait until `probe` yields a value (e.g. a dialog becoming available) and
/// return it.
pub async fn await_some<T, F>(description: &str, mut probe: F, config: PollConfig) -> T
where
    F: FnMut() -> Option<T>,
{
    match Poller::new(description)
        .with_config(config)
        .until_some(|| Ok(probe()))
        .await
    {
        Ok(value) => value,
        Err(e) => fail_await(e),
    }
}

/// Dispose `stack`, treating any disposal error as fatal.
pub async fn await_stack_dispose<D: Disposable + ?Sized>(stack: &D, config: PollConfig) {
    let result = Poller::new("stack disposal")
        .with_config(config)
        .until(|| {
            stack.dispose().map_err(ConditionError::Fatal)?;
            Ok(true)
        })
        .await;
    if let Err(e) = result {
        fail_await(e);
    }
}

//! # Message Store
//!
//! Append-only record of everything an exchange (call leg, subscription,
//! registration) has received, in arrival order.
//!
//! The stack's delivery thread appends; the test thread reads snapshots.
//! Each append happens under a write lock as one unit, and every read
//! returns a copy of the current sequence, so a reader always sees a prefix
//! of the true arrival order and a snapshot never changes after it is taken.
//!
//! Exchange objects expose their store through the [`MessageListener`] and
//! [`SipActionObject`] traits; assertions are written against those traits,
//! never against a concrete store.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::event::SipEvent;
use crate::message::{SipRequest, SipResponse};

/// Anything that accumulates received messages.
pub trait MessageListener {
    /// Snapshot of all responses received so far, in arrival order.
    fn all_received_responses(&self) -> Vec<Arc<SipResponse>>;

    /// Snapshot of all requests received so far, in arrival order.
    fn all_received_requests(&self) -> Vec<Arc<SipRequest>>;
}

/// Anything that reports the outcome of its most recent operation.
pub trait SipActionObject {
    /// Empty if the last operation succeeded, a description otherwise.
    fn error_message(&self) -> String;
}

/// A call leg.
pub trait SipCall: MessageListener {
    fn is_call_answered(&self) -> bool;
}

/// An event subscription.
pub trait EventSubscriber {
    /// Errors seen while processing NOTIFY traffic for this subscription.
    fn event_errors(&self) -> Vec<String>;
}

/// A stack-level resource that can be torn down.
///
/// Disposal belongs to the external stack and may fail; such a failure is
/// fatal to any await that performs it.
pub trait Disposable {
    fn dispose(&self) -> anyhow::Result<()>;
}

impl<T: MessageListener + ?Sized> MessageListener for Arc<T> {
    fn all_received_responses(&self) -> Vec<Arc<SipResponse>> {
        (**self).all_received_responses()
    }

    fn all_received_requests(&self) -> Vec<Arc<SipRequest>> {
        (**self).all_received_requests()
    }
}

/// The store behind an exchange object.
#[derive(Default)]
pub struct MessageStore {
    label: String,
    responses: RwLock<Vec<Arc<SipResponse>>>,
    requests: RwLock<Vec<Arc<SipRequest>>>,
    last_error: RwLock<String>,
}

impl fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStore")
            .field("label", &self.label)
            .field("responses", &self.responses.read().len())
            .field("requests", &self.requests.read().len())
            .field("last_error", &*self.last_error.read())
            .finish()
    }
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose log lines carry `label` (e.g. the call leg's URI).
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Append a received response.
    pub fn record_response(&self, response: impl Into<Arc<SipResponse>>) -> Arc<SipResponse> {
        let response = response.into();
        trace!("[{}] received response {}", self.label, response);
        self.responses.write().push(response.clone());
        response
    }

    /// Append a received request.
    pub fn record_request(&self, request: impl Into<Arc<SipRequest>>) -> Arc<SipRequest> {
        let request = request.into();
        trace!("[{}] received request {}", self.label, request);
        self.requests.write().push(request.clone());
        request
    }

    /// Append whatever `event` carries. Timeouts carry no message and are
    /// not stored.
    pub fn record(&self, event: &SipEvent) {
        match event {
            SipEvent::Request(request) => {
                self.record_request(request.clone());
            }
            SipEvent::Response(response) => {
                self.record_response(response.clone());
            }
            SipEvent::Timeout { .. } => {
                debug!("[{}] transaction timeout reported", self.label);
            }
        }
    }

    /// Record the outcome of an operation; an empty message means success.
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        if !message.is_empty() {
            debug!("[{}] operation failed: {}", self.label, message);
        }
        *self.last_error.write() = message;
    }

    pub fn clear_error(&self) {
        self.last_error.write().clear();
    }

    pub fn response_count(&self) -> usize {
        self.responses.read().len()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().len()
    }

    pub fn last_response(&self) -> Option<Arc<SipResponse>> {
        self.responses.read().last().cloned()
    }

    pub fn last_request(&self) -> Option<Arc<SipRequest>> {
        self.requests.read().last().cloned()
    }

    /// Drop everything recorded. Only the owning exchange calls this, when
    /// it is disposed.
    pub fn clear(&self) {
        debug!("[{}] clearing message store", self.label);
        self.responses.write().clear();
        self.requests.write().clear();
        self.last_error.write().clear();
    }
}

impl MessageListener for MessageStore {
    fn all_received_responses(&self) -> Vec<Arc<SipResponse>> {
        self.responses.read().clone()
    }

    fn all_received_requests(&self) -> Vec<Arc<SipRequest>> {
        self.requests.read().clone()
    }
}

impl SipActionObject for MessageStore {
    fn error_message(&self) -> String {
        self.last_error.read().clone()
    }
}

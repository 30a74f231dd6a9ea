//! Event records: the atomic unit stored in message stores and transaction logs.

use std::fmt;
use std::sync::Arc;

use crate::message::{SipMessage, SipRequest, SipResponse};

/// A protocol event observed by a listener.
///
/// Payloads are shared behind `Arc` so a record can sit in a transaction log
/// and in a message store at once. Records are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SipEvent {
    /// A request arrived
    Request(Arc<SipRequest>),
    /// A response arrived
    Response(Arc<SipResponse>),
    /// The stack reported that the transaction timed out
    Timeout {
        /// True for a server (remotely-initiated) transaction
        server: bool,
    },
}

impl SipEvent {
    pub fn request(request: SipRequest) -> Self {
        SipEvent::Request(Arc::new(request))
    }

    pub fn response(response: SipResponse) -> Self {
        SipEvent::Response(Arc::new(response))
    }

    pub fn as_request(&self) -> Option<&Arc<SipRequest>> {
        match self {
            SipEvent::Request(request) => Some(request),
            _ => None,
        }
    }

    pub fn as_response(&self) -> Option<&Arc<SipResponse>> {
        match self {
            SipEvent::Response(response) => Some(response),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SipEvent::Timeout { .. })
    }
}

impl fmt::Display for SipEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SipEvent::Request(request) => match request.cseq() {
                Some(cseq) => write!(f, "request {} (CSeq {})", request.method, cseq),
                None => write!(f, "request {}", request.method),
            },
            SipEvent::Response(response) => match response.cseq() {
                Some(cseq) => write!(f, "response {} (CSeq {})", response.status_code, cseq),
                None => write!(f, "response {}", response.status_code),
            },
            SipEvent::Timeout { server: true } => f.write_str("server transaction timeout"),
            SipEvent::Timeout { server: false } => f.write_str("client transaction timeout"),
        }
    }
}

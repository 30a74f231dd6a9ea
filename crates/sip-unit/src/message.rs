//! # Delivered SIP Messages
//!
//! Owned views of the requests and responses an external SIP stack delivers
//! to a listener. They carry only what correlation and assertions read: the
//! start line, the header list, and the body.
//!
//! The `CSeq` header is the correlation key. It is parsed on demand from the
//! header list; a message whose `CSeq` is missing or malformed simply has no
//! sequence header, it is never an error.
//!
//! ## Examples
//!
//! ```rust
//! use rvoip_sip_unit::message::{SipMessage, SipRequest, SipResponse};
//!
//! let invite = SipRequest::new("INVITE", "sip:bob@example.com")
//!     .with_cseq(1)
//!     .with_header("Call-ID", "a84b4c76e66710");
//!
//! let ringing = SipResponse::new(180).with_header("CSeq", "1 INVITE");
//! assert_eq!(ringing.reason_phrase(), "Ringing");
//!
//! let cseq = ringing.cseq().unwrap();
//! assert_eq!(cseq.method, invite.method);
//! assert_eq!(cseq.seq, 1);
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::status;

/// Method name constants for the common request methods.
pub mod methods {
    pub const INVITE: &str = "INVITE";
    pub const ACK: &str = "ACK";
    pub const BYE: &str = "BYE";
    pub const CANCEL: &str = "CANCEL";
    pub const REGISTER: &str = "REGISTER";
    pub const OPTIONS: &str = "OPTIONS";
    pub const REFER: &str = "REFER";
    pub const SUBSCRIBE: &str = "SUBSCRIBE";
    pub const NOTIFY: &str = "NOTIFY";
    pub const MESSAGE: &str = "MESSAGE";
    pub const INFO: &str = "INFO";
    pub const PRACK: &str = "PRACK";
    pub const UPDATE: &str = "UPDATE";
}

/// Name of the sequence header used for correlation.
pub const CSEQ_HEADER: &str = "CSeq";

/// A single header line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    /// Header name as delivered
    pub name: String,
    /// Raw header value
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name comparison, per RFC 3261 Section 7.3.1.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// The sequence header: a number plus the method it sequences.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CSeq {
    pub seq: u32,
    pub method: String,
}

impl CSeq {
    pub fn new(seq: u32, method: impl Into<String>) -> Self {
        Self {
            seq,
            method: method.into(),
        }
    }

    /// True if both the method (case-sensitive) and the number match.
    pub fn matches(&self, method: &str, seq: u32) -> bool {
        self.method == method && self.seq == seq
    }
}

impl fmt::Display for CSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.seq, self.method)
    }
}

/// Error returned when a `CSeq` header value cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CSeq value: {0:?}")]
pub struct InvalidCSeq(pub String);

impl FromStr for CSeq {
    type Err = InvalidCSeq;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let seq = parts
            .next()
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| InvalidCSeq(s.to_string()))?;
        let method = parts.next().ok_or_else(|| InvalidCSeq(s.to_string()))?;
        if parts.next().is_some() {
            return Err(InvalidCSeq(s.to_string()));
        }
        Ok(CSeq::new(seq, method))
    }
}

/// Read access shared by requests and responses.
pub trait SipMessage {
    fn headers(&self) -> &[Header];

    fn body(&self) -> &Bytes;

    /// First header with the given name.
    fn header(&self, name: &str) -> Option<&Header> {
        self.headers().iter().find(|h| h.is_named(name))
    }

    /// Every header with the given name, in message order.
    fn headers_named<'a>(&'a self, name: &'a str) -> Box<dyn Iterator<Item = &'a Header> + 'a> {
        Box::new(self.headers().iter().filter(move |h| h.is_named(name)))
    }

    fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Parsed `CSeq` header, `None` when absent or malformed.
    fn cseq(&self) -> Option<CSeq> {
        self.header(CSEQ_HEADER)
            .and_then(|h| h.value.parse::<CSeq>().ok())
    }

    fn content_length(&self) -> usize {
        self.body().len()
    }

    /// Body decoded as UTF-8, lossily.
    fn body_text(&self) -> String {
        String::from_utf8_lossy(self.body()).into_owned()
    }
}

/// A request delivered by the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipRequest {
    pub method: String,
    pub request_uri: String,
    pub headers: Vec<Header>,
    pub body: Bytes,
}

impl SipRequest {
    pub fn new(method: impl Into<String>, request_uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            request_uri: request_uri.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    /// Adds a `CSeq` header sequencing this request's own method.
    pub fn with_cseq(self, seq: u32) -> Self {
        let value = CSeq::new(seq, self.method.clone()).to_string();
        self.with_header(CSEQ_HEADER, value)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl SipMessage for SipRequest {
    fn headers(&self) -> &[Header] {
        &self.headers
    }

    fn body(&self) -> &Bytes {
        &self.body
    }
}

impl fmt::Display for SipRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} SIP/2.0", self.method, self.request_uri)
    }
}

/// A response delivered by the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipResponse {
    pub status_code: u16,
    pub reason_phrase: String,
    pub headers: Vec<Header>,
    pub body: Bytes,
}

impl SipResponse {
    /// Creates a response carrying the canonical reason phrase for `status_code`.
    pub fn new(status_code: u16) -> Self {
        Self::with_reason(status_code, status::reason_phrase_for(status_code))
    }

    pub fn with_reason(status_code: u16, reason_phrase: impl Into<String>) -> Self {
        Self {
            status_code,
            reason_phrase: reason_phrase.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    pub fn with_cseq(self, seq: u32, method: impl Into<String>) -> Self {
        let value = CSeq::new(seq, method).to_string();
        self.with_header(CSEQ_HEADER, value)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }
}

impl SipMessage for SipResponse {
    fn headers(&self) -> &[Header] {
        &self.headers
    }

    fn body(&self) -> &Bytes {
        &self.body
    }
}

impl fmt::Display for SipResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIP/2.0 {} {}", self.status_code, self.reason_phrase)
    }
}

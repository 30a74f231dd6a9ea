//! # SIP Status Taxonomy
//!
//! Read-only reference data mapping numeric SIP status codes to their
//! canonical reason phrases, as registered by
//! [RFC 3261 Section 21](https://datatracker.ietf.org/doc/html/rfc3261#section-21)
//! plus the RFC 3265 event extensions (202, 489).
//!
//! Status codes are grouped into six classes:
//!
//! - `1xx`: Provisional
//! - `2xx`: Success
//! - `3xx`: Redirection
//! - `4xx`: Client Error
//! - `5xx`: Server Error
//! - `6xx`: Global Failure
//!
//! The table is built once on first access and never written afterwards, so
//! concurrent lookups need no synchronization beyond the one-time
//! initialization.
//!
//! ## Examples
//!
//! ```rust
//! use rvoip_sip_unit::status::{self, codes, StatusClass};
//!
//! assert_eq!(status::reason_phrase_for(codes::OK), "OK");
//! assert_eq!(status::reason_phrase_for(486), "Busy Here");
//! assert_eq!(status::reason_phrase_for(9999), "");
//!
//! assert_eq!(StatusClass::of(180), Some(StatusClass::Provisional));
//! ```

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Returned by [`reason_phrase_for`] for codes outside the registry.
pub const UNKNOWN_REASON_PHRASE: &str = "";

/// Named status codes.
pub mod codes {
    // 1xx: Provisional
    pub const TRYING: u16 = 100;
    pub const RINGING: u16 = 180;
    pub const CALL_IS_BEING_FORWARDED: u16 = 181;
    pub const QUEUED: u16 = 182;
    pub const SESSION_PROGRESS: u16 = 183;

    // 2xx: Success
    pub const OK: u16 = 200;
    /// RFC 3265
    pub const ACCEPTED: u16 = 202;

    // 3xx: Redirection
    pub const MULTIPLE_CHOICES: u16 = 300;
    pub const MOVED_PERMANENTLY: u16 = 301;
    pub const MOVED_TEMPORARILY: u16 = 302;
    pub const USE_PROXY: u16 = 305;
    pub const ALTERNATIVE_SERVICE: u16 = 380;

    // 4xx: Client Error
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const PAYMENT_REQUIRED: u16 = 402;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const METHOD_NOT_ALLOWED: u16 = 405;
    pub const NOT_ACCEPTABLE: u16 = 406;
    pub const PROXY_AUTHENTICATION_REQUIRED: u16 = 407;
    pub const REQUEST_TIMEOUT: u16 = 408;
    pub const GONE: u16 = 410;
    pub const REQUEST_ENTITY_TOO_LARGE: u16 = 413;
    pub const REQUEST_URI_TOO_LONG: u16 = 414;
    pub const UNSUPPORTED_MEDIA_TYPE: u16 = 415;
    pub const UNSUPPORTED_URI_SCHEME: u16 = 416;
    pub const BAD_EXTENSION: u16 = 420;
    pub const EXTENSION_REQUIRED: u16 = 421;
    pub const INTERVAL_TOO_BRIEF: u16 = 423;
    pub const TEMPORARILY_UNAVAILABLE: u16 = 480;
    pub const CALL_OR_TRANSACTION_DOES_NOT_EXIST: u16 = 481;
    pub const LOOP_DETECTED: u16 = 482;
    pub const TOO_MANY_HOPS: u16 = 483;
    pub const ADDRESS_INCOMPLETE: u16 = 484;
    pub const AMBIGUOUS: u16 = 485;
    pub const BUSY_HERE: u16 = 486;
    pub const REQUEST_TERMINATED: u16 = 487;
    pub const NOT_ACCEPTABLE_HERE: u16 = 488;
    /// RFC 3265
    pub const BAD_EVENT: u16 = 489;
    pub const REQUEST_PENDING: u16 = 491;
    pub const UNDECIPHERABLE: u16 = 493;

    // 5xx: Server Error
    pub const SERVER_INTERNAL_ERROR: u16 = 500;
    pub const NOT_IMPLEMENTED: u16 = 501;
    pub const BAD_GATEWAY: u16 = 502;
    pub const SERVICE_UNAVAILABLE: u16 = 503;
    pub const SERVER_TIMEOUT: u16 = 504;
    pub const VERSION_NOT_SUPPORTED: u16 = 505;
    pub const MESSAGE_TOO_LARGE: u16 = 513;

    // 6xx: Global Failure
    pub const BUSY_EVERYWHERE: u16 = 600;
    pub const DECLINE: u16 = 603;
    pub const DOES_NOT_EXIST_ANYWHERE: u16 = 604;
    pub const SESSION_NOT_ACCEPTABLE: u16 = 606;
}

use codes::*;

static REASON_PHRASES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (TRYING, "Trying"),
        (RINGING, "Ringing"),
        (CALL_IS_BEING_FORWARDED, "Call is Being Forwarded"),
        (QUEUED, "Queued"),
        (SESSION_PROGRESS, "Session Progress"),
        (OK, "OK"),
        (ACCEPTED, "Accepted"),
        (MULTIPLE_CHOICES, "Multiple Choices"),
        (MOVED_PERMANENTLY, "Moved Permanently"),
        (MOVED_TEMPORARILY, "Moved Temporarily"),
        (USE_PROXY, "Use Proxy"),
        (ALTERNATIVE_SERVICE, "Alternative Service"),
        (BAD_REQUEST, "Bad Request"),
        (UNAUTHORIZED, "Unauthorized"),
        (PAYMENT_REQUIRED, "Payment Required"),
        (FORBIDDEN, "Forbidden"),
        (NOT_FOUND, "Not Found"),
        (METHOD_NOT_ALLOWED, "Method Not Allowed"),
        (NOT_ACCEPTABLE, "Not Acceptable"),
        (PROXY_AUTHENTICATION_REQUIRED, "Proxy Authentication Required"),
        (REQUEST_TIMEOUT, "Request Timeout"),
        (GONE, "Gone"),
        (REQUEST_ENTITY_TOO_LARGE, "Request Entity Too Large"),
        (REQUEST_URI_TOO_LONG, "Request URI Too Long"),
        (UNSUPPORTED_MEDIA_TYPE, "Unsupported Media Type"),
        (UNSUPPORTED_URI_SCHEME, "Unsupported URI Scheme"),
        (BAD_EXTENSION, "Bad Extension"),
        (EXTENSION_REQUIRED, "Extension Required"),
        (INTERVAL_TOO_BRIEF, "Interval Too Brief"),
        (TEMPORARILY_UNAVAILABLE, "Temporarily Unavailable"),
        (CALL_OR_TRANSACTION_DOES_NOT_EXIST, "Call or Transaction Does Not Exist"),
        (LOOP_DETECTED, "Loop Detected"),
        (TOO_MANY_HOPS, "Too Many Hops"),
        (ADDRESS_INCOMPLETE, "Address Incomplete"),
        (AMBIGUOUS, "Ambiguous"),
        (BUSY_HERE, "Busy Here"),
        (REQUEST_TERMINATED, "Request Terminated"),
        (NOT_ACCEPTABLE_HERE, "Not Acceptable Here"),
        (BAD_EVENT, "Bad Event"),
        (REQUEST_PENDING, "Request Pending"),
        (UNDECIPHERABLE, "Undecipherable"),
        (SERVER_INTERNAL_ERROR, "Server Internal Error"),
        (NOT_IMPLEMENTED, "Not Implemented"),
        (BAD_GATEWAY, "Bad Gateway"),
        (SERVICE_UNAVAILABLE, "Service Unavailable"),
        (SERVER_TIMEOUT, "Server Timeout"),
        (VERSION_NOT_SUPPORTED, "Version Not Supported"),
        (MESSAGE_TOO_LARGE, "Message Too Large"),
        (BUSY_EVERYWHERE, "Busy Everywhere"),
        (DECLINE, "Decline"),
        (DOES_NOT_EXIST_ANYWHERE, "Does Not Exist Anywhere"),
        (SESSION_NOT_ACCEPTABLE, "Session Not Acceptable"),
    ])
});

/// Returns the canonical reason phrase for `code`.
///
/// Codes outside the registry yield [`UNKNOWN_REASON_PHRASE`] (the empty
/// string). This never panics.
pub fn reason_phrase_for(code: u16) -> &'static str {
    REASON_PHRASES
        .get(&code)
        .copied()
        .unwrap_or(UNKNOWN_REASON_PHRASE)
}

/// Returns true if `code` is present in the registry.
pub fn is_registered(code: u16) -> bool {
    REASON_PHRASES.contains_key(&code)
}

/// Class of a SIP status code, determined by its leading digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusClass {
    /// 1xx
    Provisional,
    /// 2xx
    Success,
    /// 3xx
    Redirection,
    /// 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// 6xx
    GlobalFailure,
}

impl StatusClass {
    /// Classifies `code`, or returns `None` outside 100-699.
    pub fn of(code: u16) -> Option<Self> {
        match code {
            100..=199 => Some(StatusClass::Provisional),
            200..=299 => Some(StatusClass::Success),
            300..=399 => Some(StatusClass::Redirection),
            400..=499 => Some(StatusClass::ClientError),
            500..=599 => Some(StatusClass::ServerError),
            600..=699 => Some(StatusClass::GlobalFailure),
            _ => None,
        }
    }

    /// Final responses are everything except 1xx.
    pub fn is_final(&self) -> bool {
        !matches!(self, StatusClass::Provisional)
    }

    /// 4xx, 5xx and 6xx.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StatusClass::ClientError | StatusClass::ServerError | StatusClass::GlobalFailure
        )
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusClass::Provisional => "Provisional",
            StatusClass::Success => "Success",
            StatusClass::Redirection => "Redirection",
            StatusClass::ClientError => "Client Error",
            StatusClass::ServerError => "Server Error",
            StatusClass::GlobalFailure => "Global Failure",
        };
        f.write_str(name)
    }
}

//! # Correlation Predicates
//!
//! Pure functions over a snapshot of received messages. They answer
//! existence questions only ("was a 200 for INVITE/1 ever received?"), so
//! they scan the whole snapshot and stop at the first hit; duplicates and
//! retransmissions never change the answer.
//!
//! Predicates are total: an empty snapshot makes every positive form false,
//! and a message without a usable `CSeq` header simply does not match a
//! sequence-qualified form.
//!
//! ```rust
//! use rvoip_sip_unit::message::SipResponse;
//! use rvoip_sip_unit::predicates;
//!
//! let responses = vec![
//!     SipResponse::new(180).with_cseq(1, "INVITE"),
//!     SipResponse::new(180).with_cseq(1, "INVITE"),
//!     SipResponse::new(200).with_cseq(1, "INVITE"),
//! ];
//!
//! assert!(predicates::response_received_for(&responses, 200, "INVITE", 1));
//! assert!(!predicates::response_received_for(&responses, 487, "INVITE", 1));
//! ```

use std::borrow::Borrow;

use crate::message::{SipMessage, SipRequest, SipResponse};

/// Any response with `status_code`.
pub fn response_received<R: Borrow<SipResponse>>(responses: &[R], status_code: u16) -> bool {
    responses
        .iter()
        .any(|r| r.borrow().status_code == status_code)
}

/// Any response with `status_code` whose `CSeq` is `seq method`.
pub fn response_received_for<R: Borrow<SipResponse>>(
    responses: &[R],
    status_code: u16,
    method: &str,
    seq: u32,
) -> bool {
    responses.iter().any(|r| {
        let response = r.borrow();
        response.status_code == status_code
            && response
                .cseq()
                .map_or(false, |cseq| cseq.matches(method, seq))
    })
}

pub fn response_not_received<R: Borrow<SipResponse>>(responses: &[R], status_code: u16) -> bool {
    !response_received(responses, status_code)
}

pub fn response_not_received_for<R: Borrow<SipResponse>>(
    responses: &[R],
    status_code: u16,
    method: &str,
    seq: u32,
) -> bool {
    !response_received_for(responses, status_code, method, seq)
}

/// Any request whose method is exactly `method`.
pub fn request_received<R: Borrow<SipRequest>>(requests: &[R], method: &str) -> bool {
    requests.iter().any(|r| r.borrow().method == method)
}

/// Any request whose `CSeq` is `seq method`.
pub fn request_received_for<R: Borrow<SipRequest>>(requests: &[R], method: &str, seq: u32) -> bool {
    requests.iter().any(|r| {
        r.borrow()
            .cseq()
            .map_or(false, |cseq| cseq.matches(method, seq))
    })
}

pub fn request_not_received<R: Borrow<SipRequest>>(requests: &[R], method: &str) -> bool {
    !request_received(requests, method)
}

pub fn request_not_received_for<R: Borrow<SipRequest>>(requests: &[R], method: &str, seq: u32) -> bool {
    !request_received_for(requests, method, seq)
}

/// Status codes in arrival order, for failure messages.
pub fn status_codes<R: Borrow<SipResponse>>(responses: &[R]) -> Vec<u16> {
    responses.iter().map(|r| r.borrow().status_code).collect()
}

/// Request methods in arrival order, for failure messages.
pub fn methods<R: Borrow<SipRequest>>(requests: &[R]) -> Vec<String> {
    requests.iter().map(|r| r.borrow().method.clone()).collect()
}

/// Some header named `name` renders (as `Name: value`) to a string
/// containing `value`.
pub fn header_contains<M: SipMessage + ?Sized>(message: &M, name: &str, value: &str) -> bool {
    message
        .headers_named(name)
        .any(|h| h.to_string().contains(value))
}

pub fn body_present<M: SipMessage + ?Sized>(message: &M) -> bool {
    message.content_length() > 0
}

pub fn body_contains<M: SipMessage + ?Sized>(message: &M, value: &str) -> bool {
    body_present(message) && message.body_text().contains(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn invite_flow() -> Vec<Arc<SipResponse>> {
        [180, 180, 200]
            .into_iter()
            .map(|code| Arc::new(SipResponse::new(code).with_cseq(1, "INVITE")))
            .collect()
    }

    #[test]
    fn test_status_only_match() {
        let responses = invite_flow();
        assert!(response_received(&responses, 180));
        assert!(response_received(&responses, 200));
        assert!(!response_received(&responses, 486));
        assert!(response_not_received(&responses, 486));
    }

    #[test]
    fn test_qualified_match_needs_all_three() {
        let responses = invite_flow();
        assert!(response_received_for(&responses, 200, "INVITE", 1));
        assert!(!response_received_for(&responses, 487, "INVITE", 1));
        assert!(!response_received_for(&responses, 200, "BYE", 1));
        assert!(!response_received_for(&responses, 200, "INVITE", 2));
        assert!(!response_received_for(&responses, 200, "invite", 1));
    }

    #[test]
    fn test_response_without_cseq_never_matches_qualified_form() {
        let responses = vec![SipResponse::new(200), SipResponse::new(200).with_header("CSeq", "one INVITE")];
        assert!(response_received(&responses, 200));
        assert!(!response_received_for(&responses, 200, "INVITE", 1));
        assert!(response_not_received_for(&responses, 200, "INVITE", 1));
    }

    #[test]
    fn test_empty_snapshot() {
        let responses: Vec<SipResponse> = Vec::new();
        let requests: Vec<SipRequest> = Vec::new();
        for code in [100, 200, 486, 603] {
            assert!(!response_received(&responses, code));
            assert!(response_not_received(&responses, code));
        }
        assert!(!request_received(&requests, "INVITE"));
        assert!(request_not_received_for(&requests, "INVITE", 1));
    }

    #[test]
    fn test_request_matching() {
        let requests = vec![
            SipRequest::new("INVITE", "sip:bob@example.com").with_cseq(1),
            SipRequest::new("ACK", "sip:bob@example.com").with_cseq(1),
            SipRequest::new("BYE", "sip:bob@example.com"),
        ];
        assert!(request_received(&requests, "BYE"));
        assert!(!request_received(&requests, "bye"));
        assert!(request_received_for(&requests, "ACK", 1));
        assert!(!request_received_for(&requests, "BYE", 2));
        assert!(request_not_received(&requests, "CANCEL"));
        assert_eq!(methods(&requests), vec!["INVITE", "ACK", "BYE"]);
    }

    #[test]
    fn test_borrowed_snapshots() {
        let owned = SipResponse::new(202);
        let refs = vec![&owned];
        assert!(response_received(&refs, 202));
        assert_eq!(status_codes(&refs), vec![202]);
    }

    #[test]
    fn test_header_and_body_predicates() {
        let request = SipRequest::new("MESSAGE", "sip:bob@example.com")
            .with_header("Contact", "<sip:alice@10.0.0.1>")
            .with_header("Contact", "<sip:alice@192.168.0.1>")
            .with_body("Hello Bob");

        assert!(header_contains(&request, "contact", "192.168.0.1"));
        assert!(header_contains(&request, "Contact", "Contact: <sip"));
        assert!(!header_contains(&request, "Contact", "172.16"));
        assert!(!header_contains(&request, "Route", "sip"));
        assert!(body_present(&request));
        assert!(body_contains(&request, "Bob"));
        assert!(!body_contains(&request, "Carol"));

        let empty = SipResponse::new(200);
        assert!(!body_present(&empty));
        assert!(!body_contains(&empty, ""));
    }

    proptest! {
        #[test]
        fn prop_negated_forms_are_complements(
            entries in prop::collection::vec((100u16..700, 0u32..4, prop::bool::ANY), 0..20),
            code in 100u16..700,
            seq in 0u32..4,
        ) {
            let responses: Vec<SipResponse> = entries
                .iter()
                .map(|(c, s, bye)| SipResponse::new(*c).with_cseq(*s, if *bye { "BYE" } else { "INVITE" }))
                .collect();
            prop_assert_eq!(response_received(&responses, code), !response_not_received(&responses, code));
            prop_assert_eq!(
                response_received_for(&responses, code, "INVITE", seq),
                !response_not_received_for(&responses, code, "INVITE", seq)
            );
            prop_assert_eq!(
                response_received(&responses, code),
                entries.iter().any(|(c, _, _)| *c == code)
            );
        }

        #[test]
        fn prop_request_negated_forms_are_complements(
            entries in prop::collection::vec((0usize..4, 0u32..4, prop::bool::ANY), 0..20),
            method_index in 0usize..4,
            seq in 0u32..4,
        ) {
            const METHODS: [&str; 4] = ["INVITE", "ACK", "BYE", "NOTIFY"];
            let requests: Vec<SipRequest> = entries
                .iter()
                .map(|(m, s, sequenced)| {
                    let request = SipRequest::new(METHODS[*m], "sip:bob@example.com");
                    if *sequenced { request.with_cseq(*s) } else { request }
                })
                .collect();
            let method = METHODS[method_index];
            prop_assert_eq!(request_received(&requests, method), !request_not_received(&requests, method));
            prop_assert_eq!(
                request_received_for(&requests, method, seq),
                !request_not_received_for(&requests, method, seq)
            );
            prop_assert_eq!(
                request_received_for(&requests, method, seq),
                entries.iter().any(|(m, s, sequenced)| *sequenced && *m == method_index && *s == seq)
            );
        }
    }
}

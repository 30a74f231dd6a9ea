//! # SIP Unit - Test Assertions for SIP Exchanges
//!
//! This crate is the assertion layer that sits on top of a SIP stack under
//! test. The stack delivers requests and responses to listeners; this crate
//! records them, correlates them, and lets tests assert on them, either
//! immediately or by waiting until they arrive.
//!
//! - **[`status`]**: status code taxonomy and canonical reason phrases
//! - **[`message`]**: delivered requests and responses, and the `CSeq` header
//! - **[`event`]**: event records observed on transactions
//! - **[`transaction`]**: client/server transaction handles with event logs
//! - **[`store`]**: append-only message stores and exchange traits
//! - **[`predicates`]**: pure correlation predicates over snapshots
//! - **[`poll`]**: the bounded-retry Await Engine
//! - **[`assert`]**: panicking assertions for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use rvoip_sip_unit::assert::*;
//! use rvoip_sip_unit::{MessageStore, PollConfig, SipEvent, SipResponse};
//!
//! #[tokio::main]
//! async fn main() {
//!     let call = Arc::new(MessageStore::labeled("sip:alice@example.com"));
//!
//!     // The stack's delivery thread records what arrives
//!     let delivery = call.clone();
//!     std::thread::spawn(move || {
//!         for code in [180, 200] {
//!             delivery.record(&SipEvent::response(SipResponse::new(code).with_cseq(1, "INVITE")));
//!         }
//!     });
//!
//!     // The test waits for it, then asserts
//!     let config = PollConfig::new(Duration::from_millis(50), Duration::from_secs(5));
//!     await_response_received_for(200, "INVITE", 1, &*call, config).await;
//!     assert_response_not_received(487, &*call);
//! }
//! ```

pub mod assert;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod message;
pub mod poll;
pub mod predicates;
pub mod status;
pub mod store;
pub mod transaction;

// Re-export main types
pub use config::PollConfig;
pub use error::{AwaitError, ConditionError, Result, SipUnitError};
pub use event::SipEvent;
pub use message::{CSeq, Header, SipMessage, SipRequest, SipResponse};
pub use poll::{ConditionResult, Poller};
pub use status::{reason_phrase_for, StatusClass};
pub use store::{Disposable, EventSubscriber, MessageListener, MessageStore, SipActionObject, SipCall};
pub use transaction::{RecordedTransaction, SipTransaction, StackTransaction, TransactionKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Transaction Handle
//!
//! One request exchange as seen from this side: either a client transaction
//! (we sent the request) or a server transaction (we received it). The role
//! is a tagged variant, so a handle always has exactly one underlying stack
//! transaction and the originating request can always be read.
//!
//! Each handle keeps its own append-only log of the events observed on the
//! transaction. [`SipTransaction::deliver`] appends to that log and forwards
//! the event to the owning [`MessageStore`], if it is still alive.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::AwaitError;
use crate::event::SipEvent;
use crate::message::SipRequest;
use crate::poll::Poller;
use crate::store::MessageStore;

/// A transaction object owned by the external stack.
pub trait StackTransaction: Send + Sync + fmt::Debug {
    /// Stack-assigned identifier (typically the branch parameter).
    fn transaction_id(&self) -> &str;

    /// The request that opened the transaction.
    fn request(&self) -> Arc<SipRequest>;
}

/// Minimal [`StackTransaction`] for stacks that only expose an id and a request.
#[derive(Debug, Clone)]
pub struct RecordedTransaction {
    id: String,
    request: Arc<SipRequest>,
}

impl RecordedTransaction {
    pub fn new(id: impl Into<String>, request: impl Into<Arc<SipRequest>>) -> Self {
        Self {
            id: id.into(),
            request: request.into(),
        }
    }
}

impl StackTransaction for RecordedTransaction {
    fn transaction_id(&self) -> &str {
        &self.id
    }

    fn request(&self) -> Arc<SipRequest> {
        self.request.clone()
    }
}

/// Which side initiated the transaction.
#[derive(Debug, Clone)]
pub enum TransactionKind {
    /// Locally initiated: this side sent the request
    Client(Arc<dyn StackTransaction>),
    /// Remotely initiated: this side received the request
    Server(Arc<dyn StackTransaction>),
}

impl TransactionKind {
    fn inner(&self) -> &Arc<dyn StackTransaction> {
        match self {
            TransactionKind::Client(tx) | TransactionKind::Server(tx) => tx,
        }
    }
}

/// Handle over a single client or server transaction.
pub struct SipTransaction {
    kind: TransactionKind,
    events: RwLock<Vec<SipEvent>>,
    listener: Weak<MessageStore>,
}

impl fmt::Debug for SipTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SipTransaction")
            .field("kind", &self.kind)
            .field("events", &self.events.read().len())
            .field("listener_alive", &(self.listener.strong_count() > 0))
            .finish()
    }
}

impl SipTransaction {
    /// Handle for a transaction opened by sending a request.
    pub fn client(transaction: Arc<dyn StackTransaction>, listener: &Arc<MessageStore>) -> Self {
        Self::new(TransactionKind::Client(transaction), Arc::downgrade(listener))
    }

    /// Handle for a transaction opened by receiving a request.
    pub fn server(transaction: Arc<dyn StackTransaction>, listener: &Arc<MessageStore>) -> Self {
        Self::new(TransactionKind::Server(transaction), Arc::downgrade(listener))
    }

    /// Handle with no owning store; delivered events only reach its own log.
    pub fn detached(kind: TransactionKind) -> Self {
        Self::new(kind, Weak::new())
    }

    fn new(kind: TransactionKind, listener: Weak<MessageStore>) -> Self {
        trace!("Opened transaction handle {:?}", kind);
        Self {
            kind,
            events: RwLock::new(Vec::new()),
            listener,
        }
    }

    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    pub fn is_client(&self) -> bool {
        matches!(self.kind, TransactionKind::Client(_))
    }

    pub fn transaction_id(&self) -> &str {
        self.kind.inner().transaction_id()
    }

    /// The request that opened this transaction.
    pub fn request(&self) -> Arc<SipRequest> {
        self.kind.inner().request()
    }

    pub fn client_transaction(&self) -> Option<&Arc<dyn StackTransaction>> {
        match &self.kind {
            TransactionKind::Client(tx) => Some(tx),
            TransactionKind::Server(_) => None,
        }
    }

    pub fn server_transaction(&self) -> Option<&Arc<dyn StackTransaction>> {
        match &self.kind {
            TransactionKind::Server(tx) => Some(tx),
            TransactionKind::Client(_) => None,
        }
    }

    /// The store this transaction delivers into, while it is alive.
    pub fn listener(&self) -> Option<Arc<MessageStore>> {
        self.listener.upgrade()
    }

    /// Append an observed event and forward it to the owning store.
    pub fn deliver(&self, event: SipEvent) {
        trace!("[{}] observed {}", self.transaction_id(), event);
        if let Some(store) = self.listener.upgrade() {
            store.record(&event);
        }
        self.events.write().push(event);
    }

    /// Snapshot of the events observed so far, in order.
    pub fn events(&self) -> Vec<SipEvent> {
        self.events.read().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    pub fn last_event(&self) -> Option<SipEvent> {
        self.events.read().last().cloned()
    }

    /// Wait until at least `count` events have been observed and return the
    /// log at that point.
    pub async fn await_event_count(&self, count: usize, poller: Poller) -> Result<Vec<SipEvent>, AwaitError> {
        poller
            .until_some(|| {
                let events = self.events();
                Ok((events.len() >= count).then_some(events))
            })
            .await
    }
}

//! Broadcast transport abstraction.
//!
//! The subscription manager never talks to a concrete socket library;
//! it receives a [`TransportHandle`] wrapping whatever transport the host
//! application wires in. The handle also carries a readiness signal so
//! the manager can wait for the underlying connection instead of polling
//! a global for the socket object.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use staffline_types::{ChannelName, EventFrame};
use tokio::sync::{mpsc, watch};

/// Capacity of the per-subscription frame buffer. Matches the server-side
/// session buffer so a stalled consumer drops frames instead of backing up
/// the publisher.
pub const SUBSCRIPTION_BUFFER: usize = 256;

/// Identifies one live channel subscription on a transport.
pub type SubscriptionId = u64;

/// Errors raised by transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport connection has not been established yet.
    #[error("transport is not ready")]
    NotReady,
    /// The transport connection was closed.
    #[error("transport is closed")]
    Closed,
}

/// A broadcast transport the subscription manager can attach to.
///
/// `subscribe` is synchronous: implementations register interest locally
/// and return the receiving end immediately; frames arrive once the
/// connection delivers them.
pub trait Transport: Send + Sync {
    /// Registers interest in a channel and returns the frame stream.
    fn subscribe(
        &self,
        channel: &ChannelName,
    ) -> Result<(SubscriptionId, mpsc::Receiver<EventFrame>), TransportError>;

    /// Removes one subscription from a channel. Unknown ids are ignored.
    fn leave(&self, channel: &ChannelName, id: SubscriptionId);
}

/// A cloneable handle to a shared transport plus its readiness signal.
#[derive(Clone)]
pub struct TransportHandle {
    transport: Arc<dyn Transport>,
    ready: watch::Receiver<bool>,
}

/// The sending side of a transport's readiness signal, held by whoever
/// manages the underlying connection.
pub struct ReadySignal(watch::Sender<bool>);

impl ReadySignal {
    /// Marks the transport ready; pending attach waits resume.
    pub fn mark_ready(&self) {
        // Receivers may all be gone; that's fine.
        let _ = self.0.send(true);
    }

    /// Marks the transport not ready (connection lost).
    pub fn mark_not_ready(&self) {
        let _ = self.0.send(false);
    }
}

impl TransportHandle {
    /// Wraps a transport whose connection is still being established.
    /// Returns the handle and the signal used to flip it ready later.
    pub fn pending(transport: Arc<dyn Transport>) -> (Self, ReadySignal) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                transport,
                ready: rx,
            },
            ReadySignal(tx),
        )
    }

    /// Wraps a transport that is already connected.
    pub fn ready(transport: Arc<dyn Transport>) -> Self {
        let (_tx, rx) = watch::channel(true);
        Self {
            transport,
            ready: rx,
        }
    }

    /// Whether the underlying connection is currently established.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    pub(crate) fn subscribe(
        &self,
        channel: &ChannelName,
    ) -> Result<(SubscriptionId, mpsc::Receiver<EventFrame>), TransportError> {
        if !self.is_ready() {
            return Err(TransportError::NotReady);
        }
        self.transport.subscribe(channel)
    }

    pub(crate) fn leave(&self, channel: &ChannelName, id: SubscriptionId) {
        self.transport.leave(channel, id);
    }
}

/// In-process transport used by tests and demos.
///
/// `publish` fans a frame out to every live subscriber of the channel,
/// dropping frames for stalled receivers the same way the server hub does.
#[derive(Default)]
pub struct LocalTransport {
    subscribers: Mutex<HashMap<ChannelName, Vec<(SubscriptionId, mpsc::Sender<EventFrame>)>>>,
    next_id: AtomicU64,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a frame to every subscriber of the channel. Returns the
    /// number of receivers it reached.
    pub fn publish(&self, channel: &ChannelName, frame: EventFrame) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(entries) = subscribers.get_mut(channel) else {
            return 0;
        };

        let mut delivered = 0;
        entries.retain(|(id, sender)| match sender.try_send(frame.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(subscription = id, channel = %channel, "dropping frame for slow subscriber");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        delivered
    }

    /// Number of live subscriptions on a channel.
    pub fn subscriber_count(&self, channel: &ChannelName) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(channel)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Transport for LocalTransport {
    fn subscribe(
        &self,
        channel: &ChannelName,
    ) -> Result<(SubscriptionId, mpsc::Receiver<EventFrame>), TransportError> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(channel.clone())
            .or_default()
            .push((id, tx));
        Ok((id, rx))
    }

    fn leave(&self, channel: &ChannelName, id: SubscriptionId) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(entries) = subscribers.get_mut(channel) {
            entries.retain(|(entry_id, _)| *entry_id != id);
            if entries.is_empty() {
                subscribers.remove(channel);
            }
        }
    }
}

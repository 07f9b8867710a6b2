//! Channel subscription lifecycle for one UI surface.
//!
//! A [`SubscriptionManager`] owns the live channel subscriptions of one
//! surface (header bell, admin dashboard). Attaching waits for transport
//! readiness inside a bounded retry budget, subscribes to the channels the
//! principal's roles resolve to, and spawns one listener task per channel
//! that decodes frames and feeds the shared [`NotificationStore`]. Detaching
//! tears all of that down and is safe to call any number of times.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use staffline_types::{
    ChannelName, EventFrame, Principal, PrincipalKind, RoleFlags, LISTENED_EVENTS,
};
use tokio::task::JoinHandle;

use crate::store::NotificationStore;
use crate::transport::{SubscriptionId, TransportHandle};

/// How many times attach re-checks transport readiness before giving up.
pub const ATTACH_RETRY_ATTEMPTS: u32 = 20;

/// Delay between readiness checks.
pub const ATTACH_RETRY_INTERVAL: Duration = Duration::from_millis(250);

/// Resolves the channels a principal's surface listens on.
///
/// Staff surfaces pick exactly one channel by role precedence (supervisor
/// before HR before the shared staff feed); employee surfaces listen on the
/// employee's private channel.
pub fn resolve_channels(principal: &Principal, flags: RoleFlags) -> Vec<ChannelName> {
    match principal.kind {
        PrincipalKind::Employee => vec![ChannelName::Employee(principal.id)],
        PrincipalKind::Staff if flags.supervisor => vec![ChannelName::Supervisor(principal.id)],
        PrincipalKind::Staff if flags.hr => vec![ChannelName::Hr(principal.id)],
        PrincipalKind::Staff => vec![ChannelName::Notifications],
    }
}

struct ActiveSubscription {
    channel: ChannelName,
    id: SubscriptionId,
    task: JoinHandle<()>,
}

/// Cancels a pending attach from outside the manager (surface unmounted
/// while the readiness wait was still sleeping).
#[derive(Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Owns the live channel subscriptions of one UI surface.
pub struct SubscriptionManager {
    transport: TransportHandle,
    store: Arc<Mutex<NotificationStore>>,
    active: Vec<ActiveSubscription>,
    cancelled: Arc<AtomicBool>,
}

impl SubscriptionManager {
    pub fn new(transport: TransportHandle, store: Arc<Mutex<NotificationStore>>) -> Self {
        Self {
            transport,
            store,
            active: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for cancelling a pending attach when the surface goes away.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancelled))
    }

    /// Attaches the surface for a principal, resolving channels from the
    /// principal's roles. See [`Self::attach_channels`].
    pub async fn attach(&mut self, principal: &Principal, flags: RoleFlags) -> bool {
        let channels = resolve_channels(principal, flags);
        self.attach_channels(&channels).await
    }

    /// Attaches the surface to an explicit channel list (admin dashboards
    /// subscribe to scope channels directly).
    ///
    /// Detaches first, so repeated attaches never stack listeners. Waits
    /// for transport readiness inside the retry budget; when the budget
    /// runs out the surface degrades to history-only and this returns
    /// `false` without failing the caller.
    pub async fn attach_channels(&mut self, channels: &[ChannelName]) -> bool {
        self.detach();

        let mut attempts = 0u32;
        while !self.transport.is_ready() {
            if self.cancelled.load(Ordering::Relaxed) {
                return false;
            }
            attempts += 1;
            if attempts >= ATTACH_RETRY_ATTEMPTS {
                tracing::warn!(
                    attempts,
                    "transport never became ready; surface degrades to history-only"
                );
                return false;
            }
            tokio::time::sleep(ATTACH_RETRY_INTERVAL).await;
        }
        if self.cancelled.load(Ordering::Relaxed) {
            return false;
        }

        for channel in channels {
            let (id, mut receiver) = match self.transport.subscribe(channel) {
                Ok(sub) => sub,
                Err(err) => {
                    tracing::warn!(channel = %channel, error = %err, "subscribe failed");
                    continue;
                }
            };

            let store = Arc::clone(&self.store);
            let task_channel = channel.clone();
            let task = tokio::spawn(async move {
                while let Some(frame) = receiver.recv().await {
                    handle_frame(&store, &task_channel, frame);
                }
            });

            tracing::debug!(channel = %channel, "subscribed");
            self.active.push(ActiveSubscription {
                channel: channel.clone(),
                id,
                task,
            });
        }

        !self.active.is_empty()
    }

    /// Tears down every live subscription. Idempotent.
    pub fn detach(&mut self) {
        for sub in self.active.drain(..) {
            sub.task.abort();
            self.transport.leave(&sub.channel, sub.id);
            tracing::debug!(channel = %sub.channel, "unsubscribed");
        }
    }

    /// Channels this surface is currently subscribed to.
    pub fn subscribed_channels(&self) -> Vec<ChannelName> {
        self.active.iter().map(|sub| sub.channel.clone()).collect()
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.detach();
    }
}

fn handle_frame(store: &Mutex<NotificationStore>, channel: &ChannelName, frame: EventFrame) {
    let listened = LISTENED_EVENTS
        .iter()
        .any(|name| *name == frame.event || name.trim_start_matches('.') == frame.event);
    if !listened {
        return;
    }

    match frame.decode() {
        Ok(event) => {
            let mut store = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            store.apply_inbound_event(&event);
        }
        Err(err) => {
            tracing::warn!(channel = %channel, event = %frame.event, error = %err, "dropping undecodable frame");
        }
    }
}

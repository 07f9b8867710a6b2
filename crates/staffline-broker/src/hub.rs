//! In-process subscription registry and fan-out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use staffline_types::ChannelName;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Active connections: connection id -> sender of serialized frames.
type SessionMap = HashMap<Uuid, mpsc::Sender<String>>;

/// Manages live connections and their channel subscriptions.
///
/// Lock ordering everywhere: `sessions` → `channel_subscriptions` →
/// `connection_subscriptions`. Subscribe, unsubscribe, and removal all
/// follow it to prevent deadlocks.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    /// Active sessions keyed by connection id.
    sessions: Arc<RwLock<SessionMap>>,
    /// channel -> set of subscribed connection ids.
    channel_subscriptions: Arc<RwLock<HashMap<ChannelName, HashSet<Uuid>>>>,
    /// Reverse mapping: connection id -> set of channels.
    connection_subscriptions: Arc<RwLock<HashMap<Uuid, HashSet<ChannelName>>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection and returns its id.
    ///
    /// Connection ids are fresh UUIDs, so re-connections never collide with
    /// a stale registration; cleanup of the old connection happens through
    /// [`BroadcastHub::remove_session`] when its socket closes.
    pub async fn add_session(&self, sender: mpsc::Sender<String>) -> Uuid {
        let connection_id = Uuid::new_v4();
        self.sessions.write().await.insert(connection_id, sender);
        connection_id
    }

    /// Removes a connection and every subscription it held.
    pub async fn remove_session(&self, connection_id: Uuid) {
        // 1. Remove from sessions (independent lock, always acquired first).
        {
            let mut sessions = self.sessions.write().await;
            if sessions.remove(&connection_id).is_none() {
                return; // Already removed
            }
        }

        // 2. Collect the channels this connection was subscribed to.
        let channels = {
            let conn_subs = self.connection_subscriptions.read().await;
            conn_subs.get(&connection_id).cloned()
        };

        // 3. Remove from channel_subscriptions first (matches subscribe order).
        if let Some(ref channels) = channels {
            let mut chan_subs = self.channel_subscriptions.write().await;
            for channel in channels {
                if let Some(listeners) = chan_subs.get_mut(channel) {
                    listeners.remove(&connection_id);
                    if listeners.is_empty() {
                        chan_subs.remove(channel);
                    }
                }
            }
        }

        // 4. Remove the reverse index last.
        if channels.is_some() {
            let mut conn_subs = self.connection_subscriptions.write().await;
            conn_subs.remove(&connection_id);
        }
    }

    /// Subscribes a connection to a channel. Idempotent.
    pub async fn subscribe(&self, channel: ChannelName, connection_id: Uuid) {
        let mut chan_subs = self.channel_subscriptions.write().await;
        chan_subs
            .entry(channel.clone())
            .or_default()
            .insert(connection_id);

        let mut conn_subs = self.connection_subscriptions.write().await;
        conn_subs.entry(connection_id).or_default().insert(channel);
    }

    /// Unsubscribes a connection from a channel. A no-op when the
    /// subscription does not exist.
    pub async fn unsubscribe(&self, channel: &ChannelName, connection_id: Uuid) {
        let mut chan_subs = self.channel_subscriptions.write().await;
        if let Some(listeners) = chan_subs.get_mut(channel) {
            listeners.remove(&connection_id);
            if listeners.is_empty() {
                chan_subs.remove(channel);
            }
        }

        let mut conn_subs = self.connection_subscriptions.write().await;
        if let Some(channels) = conn_subs.get_mut(&connection_id) {
            channels.remove(channel);
            if channels.is_empty() {
                conn_subs.remove(&connection_id);
            }
        }
    }

    /// Fans a serialized frame out to every subscriber of a channel.
    ///
    /// Slow consumers whose buffer is full have the frame dropped with a
    /// warning rather than blocking the publisher.
    pub async fn publish(&self, channel: &ChannelName, frame_json: String) {
        let chan_subs = self.channel_subscriptions.read().await;
        if let Some(listeners) = chan_subs.get(channel) {
            let sessions = self.sessions.read().await;
            for connection_id in listeners {
                if let Some(sender) = sessions.get(connection_id) {
                    if let Err(e) = sender.try_send(frame_json.clone()) {
                        tracing::warn!(
                            connection_id = %connection_id,
                            channel = %channel,
                            "dropping frame for slow consumer: {}",
                            e
                        );
                    }
                }
            }
        }
    }

    /// Sends a serialized frame to a single connection.
    pub async fn send(&self, connection_id: Uuid, frame_json: String) {
        let sessions = self.sessions.read().await;
        if let Some(sender) = sessions.get(&connection_id) {
            if let Err(e) = sender.try_send(frame_json) {
                tracing::warn!(
                    connection_id = %connection_id,
                    "dropping direct frame for slow consumer: {}",
                    e
                );
            }
        }
    }

    /// Number of live subscribers on a channel. Used by tests and the
    /// server's diagnostics surface.
    pub async fn subscriber_count(&self, channel: &ChannelName) -> usize {
        self.channel_subscriptions
            .read()
            .await
            .get(channel)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

//! Client-side notification pipeline.
//!
//! This crate holds everything a notification surface needs: a transport
//! abstraction with an explicit readiness signal, the subscription manager
//! that attaches a surface to its channels, the local reconciliation store,
//! and the HTTP client that syncs read state with the server.
//!
//! Typical wiring:
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//! use staffline_client::{
//!     HttpNotificationApi, LocalTransport, NotificationCenter, NotificationStore,
//!     SubscriptionManager, TransportHandle,
//! };
//! use staffline_types::{Principal, RoleFlags};
//!
//! # async fn wire() {
//! let transport = TransportHandle::ready(Arc::new(LocalTransport::new()));
//! let store = Arc::new(Mutex::new(NotificationStore::new()));
//!
//! let mut manager = SubscriptionManager::new(transport, Arc::clone(&store));
//! manager.attach(&Principal::staff(7, "Sup One"), RoleFlags::none()).await;
//!
//! let api = Arc::new(HttpNotificationApi::new("http://localhost:8080", "token"));
//! let center = NotificationCenter::new(store, api);
//! center.refresh().await;
//! # }
//! ```

mod api;
mod store;
mod subscription;
mod transport;

pub use api::{
    ApiCallError, HttpNotificationApi, NotificationApi, NotificationCenter, MARK_ALL_SENTINEL,
};
pub use store::NotificationStore;
pub use subscription::{
    resolve_channels, CancelHandle, SubscriptionManager, ATTACH_RETRY_ATTEMPTS,
    ATTACH_RETRY_INTERVAL,
};
pub use transport::{
    LocalTransport, ReadySignal, SubscriptionId, Transport, TransportError, TransportHandle,
    SUBSCRIPTION_BUFFER,
};

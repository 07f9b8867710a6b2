//! Read-state sync against the notification endpoints.
//!
//! The UI applies read-state changes optimistically: the local store flips
//! first, then the server call runs in the background. A failed call keeps
//! the optimistic local state and surfaces an error toast; the next history
//! refresh converges the two sides.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use staffline_types::{Notification, Toast};

use crate::store::NotificationStore;

/// Wire sentinel some producers send on the mark-read channel to mean
/// "mark everything read". Mapped to [`NotificationCenter::mark_all_read`]
/// at the boundary; it never reaches the store as a row id.
pub const MARK_ALL_SENTINEL: i64 = -1;

/// Errors from the notification endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiCallError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server rejected the request with status {0}")]
    Status(u16),
}

/// Server calls the notification center performs in the background.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn mark_read(&self, notification_id: i64) -> Result<(), ApiCallError>;
    async fn mark_all_read(&self) -> Result<(), ApiCallError>;
    async fn fetch_history(&self) -> Result<Vec<Notification>, ApiCallError>;
}

/// [`NotificationApi`] implementation against the HTTP endpoints.
pub struct HttpNotificationApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpNotificationApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn mark_read(&self, notification_id: i64) -> Result<(), ApiCallError> {
        let response = self
            .client
            .post(self.url("/employee/notifications/mark-read"))
            .header("X-Staffline-Token", &self.token)
            .json(&serde_json::json!({ "notification_id": notification_id }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiCallError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<(), ApiCallError> {
        let response = self
            .client
            .post(self.url("/employee/notifications/mark-all-read"))
            .header("X-Staffline-Token", &self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiCallError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn fetch_history(&self) -> Result<Vec<Notification>, ApiCallError> {
        let response = self
            .client
            .get(self.url("/employee/notifications"))
            .header("X-Staffline-Token", &self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiCallError::Status(response.status().as_u16()));
        }
        let body: NotificationsResponse = response.json().await?;
        Ok(body.notifications)
    }
}

#[derive(serde::Deserialize)]
struct NotificationsResponse {
    notifications: Vec<Notification>,
}

/// Binds a store to the server endpoints with optimistic read-state sync.
pub struct NotificationCenter {
    store: Arc<Mutex<NotificationStore>>,
    api: Arc<dyn NotificationApi>,
}

impl NotificationCenter {
    pub fn new(store: Arc<Mutex<NotificationStore>>, api: Arc<dyn NotificationApi>) -> Self {
        Self { store, api }
    }

    /// The store this center mutates, shared with the subscription manager.
    pub fn store(&self) -> Arc<Mutex<NotificationStore>> {
        Arc::clone(&self.store)
    }

    /// Marks one row read locally, then confirms with the server. The
    /// sentinel id expands to a mark-all before anything touches the store.
    pub async fn mark_one_read(&self, id: i64) {
        if id == MARK_ALL_SENTINEL {
            self.mark_all_read().await;
            return;
        }

        self.lock_store().mark_one_read(id);

        if let Err(err) = self.api.mark_read(id).await {
            tracing::warn!(id, error = %err, "mark-read sync failed; keeping optimistic state");
            self.lock_store()
                .push_toast(Toast::error("Could not sync read state"));
        }
    }

    /// Marks everything read locally, then confirms with the server.
    pub async fn mark_all_read(&self) {
        self.lock_store().mark_all_read();

        if let Err(err) = self.api.mark_all_read().await {
            tracing::warn!(error = %err, "mark-all-read sync failed; keeping optimistic state");
            self.lock_store()
                .push_toast(Toast::error("Could not sync read state"));
        }
    }

    /// Replaces the local view with the server history snapshot.
    pub async fn refresh(&self) {
        match self.api.fetch_history().await {
            Ok(snapshot) => self.lock_store().apply_server_snapshot(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, "history fetch failed");
                self.lock_store()
                    .push_toast(Toast::error("Could not load notifications"));
            }
        }
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, NotificationStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

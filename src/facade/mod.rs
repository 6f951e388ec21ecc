//! User-facing operation surface.
//!
//! Presentation components (bell, list, notification center) call the
//! facade instead of touching the network or the store directly. Every
//! operation performs exactly one network call and one corresponding
//! store transition, and surfaces failures as transient alerts while
//! recording them in the store's error field.

mod tracker;

use std::sync::Arc;

use crate::alert::AlertSink;
use crate::api::NotificationApi;
use crate::error::Result;
use crate::notification::{NotificationFilter, NotificationType};
use crate::store::{NotificationStore, StoreEvent};

pub use tracker::{ActionGuard, ActionTracker};

/// Unified read/write API for the notification feature.
pub struct NotificationFacade {
    api: Arc<dyn NotificationApi>,
    store: Arc<NotificationStore>,
    alerts: AlertSink,
    tracker: ActionTracker,
}

impl NotificationFacade {
    pub fn new(
        api: Arc<dyn NotificationApi>,
        store: Arc<NotificationStore>,
        alerts: AlertSink,
    ) -> Self {
        Self {
            api,
            store,
            alerts,
            tracker: ActionTracker::new(),
        }
    }

    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    /// Whether an action with the given key is currently in flight, so
    /// callers can disable the triggering control.
    pub fn is_pending(&self, key: &str) -> bool {
        self.tracker.is_pending(key)
    }

    pub fn is_marking_read(&self, id: &str) -> bool {
        self.tracker.is_pending(&format!("read-{}", id))
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.tracker.is_pending(&format!("delete-{}", id))
    }

    /// Fetch one page into the store.
    ///
    /// Concurrent calls with different pages are deliberately not queued
    /// or deduplicated; the last response to resolve wins.
    pub async fn fetch_page(
        &self,
        page: u32,
        limit: u32,
        filter: &NotificationFilter,
    ) -> Result<()> {
        let page = page.max(1);

        self.store.apply(StoreEvent::FetchStarted);
        match self.api.list(page, limit, filter).await {
            Ok(fetched) => {
                self.store.apply(StoreEvent::FetchSucceeded {
                    notifications: fetched.notifications,
                    pagination: fetched.pagination,
                });
                Ok(())
            }
            Err(e) => {
                let message = format!("Failed to load notifications: {}", e);
                self.store.apply(StoreEvent::FetchFailed(message.clone()));
                self.alerts.error(message);
                Err(e)
            }
        }
    }

    /// Mark a single notification as read.
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        let Some(_guard) = self.tracker.try_begin(&format!("read-{}", id)) else {
            tracing::debug!(id = %id, "mark_read already in flight, skipping");
            return Ok(());
        };

        match self.api.mark_read(id).await {
            Ok(_updated) => {
                self.store
                    .apply(StoreEvent::MarkReadSucceeded(id.to_string()));
                Ok(())
            }
            Err(e) => {
                let message = format!("Failed to mark notification as read: {}", e);
                self.store.apply(StoreEvent::MutationFailed(message.clone()));
                self.alerts.error(message);
                Err(e)
            }
        }
    }

    /// Mark all notifications as read, optionally scoped to one type.
    ///
    /// The server applies this to its full set; the store only reflects
    /// the held page, so the unread count is refetched afterwards.
    pub async fn mark_all_read(&self, kind: Option<NotificationType>) -> Result<()> {
        let Some(_guard) = self.tracker.try_begin("read-all") else {
            tracing::debug!("mark_all_read already in flight, skipping");
            return Ok(());
        };

        match self.api.mark_all_read(kind).await {
            Ok(()) => {
                self.store.apply(StoreEvent::MarkAllReadSucceeded { kind });
                self.refresh_count_after_bulk().await;
                self.alerts.success("All notifications marked as read");
                Ok(())
            }
            Err(e) => {
                let message = format!("Failed to mark all notifications as read: {}", e);
                self.store.apply(StoreEvent::MutationFailed(message.clone()));
                self.alerts.error(message);
                Err(e)
            }
        }
    }

    /// Delete a single notification.
    pub async fn delete_one(&self, id: &str) -> Result<()> {
        let Some(_guard) = self.tracker.try_begin(&format!("delete-{}", id)) else {
            tracing::debug!(id = %id, "delete_one already in flight, skipping");
            return Ok(());
        };

        match self.api.delete(id).await {
            Ok(()) => {
                self.store.apply(StoreEvent::DeleteSucceeded(id.to_string()));
                self.alerts.success("Notification deleted");
                Ok(())
            }
            Err(e) => {
                let message = format!("Failed to delete notification: {}", e);
                self.store.apply(StoreEvent::MutationFailed(message.clone()));
                self.alerts.error(message);
                Err(e)
            }
        }
    }

    /// Delete all notifications, then refetch the unread count.
    pub async fn delete_all(&self) -> Result<()> {
        let Some(_guard) = self.tracker.try_begin("delete-all") else {
            tracing::debug!("delete_all already in flight, skipping");
            return Ok(());
        };

        match self.api.delete_all().await {
            Ok(()) => {
                self.store.apply(StoreEvent::DeleteAllSucceeded);
                self.refresh_count_after_bulk().await;
                self.alerts.success("All notifications deleted");
                Ok(())
            }
            Err(e) => {
                let message = format!("Failed to delete notifications: {}", e);
                self.store.apply(StoreEvent::MutationFailed(message.clone()));
                self.alerts.error(message);
                Err(e)
            }
        }
    }

    /// Refresh the unread count from the server.
    ///
    /// The server-reported value always overwrites local bookkeeping: the
    /// client only holds a page-limited subset.
    pub async fn refresh_unread_count(&self, kind: Option<NotificationType>) -> Result<()> {
        let Some(_guard) = self.tracker.try_begin("unread-count") else {
            tracing::debug!("unread count refresh already in flight, skipping");
            return Ok(());
        };

        match self.api.unread_count(kind).await {
            Ok(count) => {
                self.store.apply(StoreEvent::UnreadCountFetched(count));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh unread count");
                Err(e)
            }
        }
    }

    /// Post-bulk count refresh; failure leaves the local value in place
    /// until the next refresh.
    async fn refresh_count_after_bulk(&self) {
        match self.api.unread_count(None).await {
            Ok(count) => self.store.apply(StoreEvent::UnreadCountFetched(count)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh unread count after bulk operation");
            }
        }
    }
}

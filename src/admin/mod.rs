//! Back-office operation surface.
//!
//! Mirrors the user facade over the admin-scoped endpoints, with its own
//! store instance for the admin list. Broadcast audiences are validated
//! client-side before any network call is attempted.

use std::sync::Arc;

use crate::alert::AlertSink;
use crate::api::{AdminNotificationApi, BroadcastAudience, BroadcastReceipt, NotificationStats};
use crate::error::{ClientError, Result};
use crate::facade::ActionTracker;
use crate::notification::{AdminFilter, NotificationDraft};
use crate::store::{NotificationStore, StoreEvent};

pub struct AdminFacade {
    api: Arc<dyn AdminNotificationApi>,
    store: Arc<NotificationStore>,
    alerts: AlertSink,
    tracker: ActionTracker,
}

impl AdminFacade {
    pub fn new(
        api: Arc<dyn AdminNotificationApi>,
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

    pub fn is_pending(&self, key: &str) -> bool {
        self.tracker.is_pending(key)
    }

    pub fn is_broadcasting(&self) -> bool {
        self.tracker.is_pending("broadcast")
    }

    /// Fetch one admin page into the admin store.
    pub async fn fetch_page(&self, page: u32, limit: u32, filter: &AdminFilter) -> Result<()> {
        let page = page.max(1);

        self.store.apply(StoreEvent::FetchStarted);
        match self.api.admin_list(page, limit, filter).await {
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

    /// Create a notification for the given audience.
    ///
    /// An explicit recipient set must be non-empty; validation fails
    /// before any network call is made.
    pub async fn broadcast(
        &self,
        draft: NotificationDraft,
        audience: BroadcastAudience,
    ) -> Result<BroadcastReceipt> {
        if audience.explicit_recipients() == Some(0) {
            let message = "Select at least one recipient for the broadcast";
            self.alerts.error(message);
            return Err(ClientError::Validation(message.to_string()));
        }

        let Some(_guard) = self.tracker.try_begin("broadcast") else {
            tracing::debug!("broadcast already in flight, rejecting");
            return Err(ClientError::Validation(
                "A broadcast is already being sent".to_string(),
            ));
        };

        match self.api.broadcast(&draft, &audience).await {
            Ok(receipt) => {
                match audience {
                    BroadcastAudience::All => {
                        self.alerts.success("Broadcast sent to all users");
                    }
                    BroadcastAudience::Users(_) => {
                        self.alerts.success(format!(
                            "Broadcast sent to {} recipient(s)",
                            receipt.recipients
                        ));
                    }
                }
                Ok(receipt)
            }
            Err(e) => {
                let message = format!("Failed to send broadcast: {}", e);
                self.store.apply(StoreEvent::MutationFailed(message.clone()));
                self.alerts.error(message);
                Err(e)
            }
        }
    }

    /// Delete every notification storewide, then refetch the unread count
    /// for the admin view.
    pub async fn delete_all(&self) -> Result<()> {
        let Some(_guard) = self.tracker.try_begin("delete-all") else {
            tracing::debug!("delete_all already in flight, skipping");
            return Ok(());
        };

        match self.api.admin_delete_all().await {
            Ok(()) => {
                self.store.apply(StoreEvent::DeleteAllSucceeded);
                match self.api.stats().await {
                    Ok(stats) => self
                        .store
                        .apply(StoreEvent::UnreadCountFetched(stats.unread)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to refresh counts after delete all");
                    }
                }
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

    /// Aggregate counts by type, priority, and read state.
    pub async fn stats(&self) -> Result<NotificationStats> {
        match self.api.stats().await {
            Ok(stats) => Ok(stats),
            Err(e) => {
                let message = format!("Failed to load notification stats: {}", e);
                self.alerts.error(message);
                Err(e)
            }
        }
    }

    /// Re-attempt failed deliveries; returns the number retried.
    pub async fn retry_delivery(&self) -> Result<u64> {
        let Some(_guard) = self.tracker.try_begin("retry-delivery") else {
            tracing::debug!("retry_delivery already in flight, skipping");
            return Ok(0);
        };

        match self.api.retry_delivery().await {
            Ok(retried) => {
                if retried > 0 {
                    self.alerts
                        .success(format!("Retried {} failed deliveries", retried));
                } else {
                    self.alerts.info("No failed deliveries to retry");
                }
                Ok(retried)
            }
            Err(e) => {
                let message = format!("Failed to retry deliveries: {}", e);
                self.alerts.error(message);
                Err(e)
            }
        }
    }
}

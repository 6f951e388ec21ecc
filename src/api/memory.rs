use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{ClientError, Result};
use crate::notification::{
    AdminFilter, Notification, NotificationDraft, NotificationFilter, NotificationType, Pagination,
};

use super::types::{BroadcastAudience, BroadcastReceipt, NotificationPage, NotificationStats};
use super::{AdminNotificationApi, NotificationApi};

/// A notification record with its delivery scope.
#[derive(Debug, Clone)]
struct StoredNotification {
    /// `None` means delivered to every user
    recipient: Option<String>,
    notification: Notification,
}

/// In-process simulation of the remote notification service.
///
/// Holds the full notification set, so unread counts and stats cover
/// records outside any fetched page, the same way the real service does.
/// Used as the factory fallback and as the backend for integration tests.
pub struct MemoryNotificationApi {
    user_id: String,
    entries: RwLock<Vec<StoredNotification>>,
    failed_deliveries: AtomicU64,
}

impl MemoryNotificationApi {
    pub fn new() -> Self {
        Self::with_user("local-user")
    }

    /// Simulate the mailbox of a specific user.
    pub fn with_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            entries: RwLock::new(Vec::new()),
            failed_deliveries: AtomicU64::new(0),
        }
    }

    /// Insert a notification visible to every user.
    pub fn seed(&self, notification: Notification) {
        self.entries
            .write()
            .expect("entries lock poisoned")
            .push(StoredNotification {
                recipient: None,
                notification,
            });
    }

    /// Insert a notification addressed to one user.
    pub fn seed_for(&self, user_id: impl Into<String>, notification: Notification) {
        self.entries
            .write()
            .expect("entries lock poisoned")
            .push(StoredNotification {
                recipient: Some(user_id.into()),
                notification,
            });
    }

    /// Record a failed delivery, to be picked up by `retry_delivery`.
    pub fn record_failed_delivery(&self) {
        self.failed_deliveries.fetch_add(1, Ordering::SeqCst);
    }

    fn visible_to_user(&self, entry: &StoredNotification) -> bool {
        match &entry.recipient {
            None => true,
            Some(recipient) => recipient == &self.user_id,
        }
    }

    fn paginate(mut items: Vec<Notification>, page: u32, limit: u32) -> NotificationPage {
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let page = page.max(1);
        let limit = limit.max(1);
        let total = items.len() as u64;
        let pages = ((total + limit as u64 - 1) / limit as u64) as u32;

        let start = (page as usize - 1) * limit as usize;
        let notifications = if start >= items.len() {
            // Beyond the last page: empty result, not an error
            Vec::new()
        } else {
            items.into_iter().skip(start).take(limit as usize).collect()
        };

        NotificationPage {
            notifications,
            pagination: Pagination {
                page,
                limit,
                total,
                pages,
            },
        }
    }
}

impl Default for MemoryNotificationApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationApi for MemoryNotificationApi {
    async fn list(
        &self,
        page: u32,
        limit: u32,
        filter: &NotificationFilter,
    ) -> Result<NotificationPage> {
        let entries = self.entries.read().expect("entries lock poisoned");
        let items: Vec<Notification> = entries
            .iter()
            .filter(|e| self.visible_to_user(e) && filter.matches(&e.notification))
            .map(|e| e.notification.clone())
            .collect();

        Ok(Self::paginate(items, page, limit))
    }

    async fn mark_read(&self, id: &str) -> Result<Notification> {
        let mut entries = self.entries.write().expect("entries lock poisoned");
        let entry = entries
            .iter_mut()
            .find(|e| e.notification.id == id)
            .filter(|e| {
                match &e.recipient {
                    None => true,
                    Some(recipient) => recipient == &self.user_id,
                }
            })
            .ok_or_else(|| ClientError::NotFound(format!("Notification {} not found", id)))?;

        entry.notification.read = true;
        Ok(entry.notification.clone())
    }

    async fn mark_all_read(&self, kind: Option<NotificationType>) -> Result<()> {
        let mut entries = self.entries.write().expect("entries lock poisoned");
        for entry in entries.iter_mut() {
            let visible = match &entry.recipient {
                None => true,
                Some(recipient) => recipient == &self.user_id,
            };
            if visible && kind.map_or(true, |k| entry.notification.kind == k) {
                entry.notification.read = true;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut entries = self.entries.write().expect("entries lock poisoned");
        let before = entries.len();
        entries.retain(|e| {
            let visible = match &e.recipient {
                None => true,
                Some(recipient) => recipient == &self.user_id,
            };
            !(visible && e.notification.id == id)
        });

        if entries.len() == before {
            return Err(ClientError::NotFound(format!(
                "Notification {} not found",
                id
            )));
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        let mut entries = self.entries.write().expect("entries lock poisoned");
        let user_id = self.user_id.clone();
        entries.retain(|e| match &e.recipient {
            None => false,
            Some(recipient) => recipient != &user_id,
        });
        Ok(())
    }

    async fn unread_count(&self, kind: Option<NotificationType>) -> Result<u64> {
        let entries = self.entries.read().expect("entries lock poisoned");
        let count = entries
            .iter()
            .filter(|e| {
                self.visible_to_user(e)
                    && !e.notification.read
                    && kind.map_or(true, |k| e.notification.kind == k)
            })
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl AdminNotificationApi for MemoryNotificationApi {
    async fn admin_list(
        &self,
        page: u32,
        limit: u32,
        filter: &AdminFilter,
    ) -> Result<NotificationPage> {
        let entries = self.entries.read().expect("entries lock poisoned");
        let items: Vec<Notification> = entries
            .iter()
            .filter(|e| {
                let recipient_matches = match &filter.user_id {
                    None => true,
                    Some(user_id) => e.recipient.as_deref() == Some(user_id.as_str()),
                };
                recipient_matches && filter.matches(&e.notification)
            })
            .map(|e| e.notification.clone())
            .collect();

        Ok(Self::paginate(items, page, limit))
    }

    async fn broadcast(
        &self,
        draft: &NotificationDraft,
        audience: &BroadcastAudience,
    ) -> Result<BroadcastReceipt> {
        let created: Vec<StoredNotification> = match audience {
            BroadcastAudience::All => vec![StoredNotification {
                recipient: None,
                notification: Notification::from_draft(draft.clone()),
            }],
            BroadcastAudience::Users(ids) => {
                if ids.is_empty() {
                    return Err(ClientError::Validation(
                        "Broadcast requires at least one recipient".to_string(),
                    ));
                }
                ids.iter()
                    .map(|user_id| StoredNotification {
                        recipient: Some(user_id.clone()),
                        notification: Notification::from_draft(draft.clone()),
                    })
                    .collect()
            }
        };

        let receipt = BroadcastReceipt {
            id: created[0].notification.id.clone(),
            recipients: created.len() as u64,
        };

        self.entries
            .write()
            .expect("entries lock poisoned")
            .extend(created);

        Ok(receipt)
    }

    async fn admin_delete_all(&self) -> Result<()> {
        self.entries.write().expect("entries lock poisoned").clear();
        Ok(())
    }

    async fn stats(&self) -> Result<NotificationStats> {
        let entries = self.entries.read().expect("entries lock poisoned");
        let mut stats = NotificationStats {
            total: entries.len() as u64,
            ..Default::default()
        };

        for entry in entries.iter() {
            let n = &entry.notification;
            if !n.read {
                stats.unread += 1;
            }
            *stats.by_type.entry(n.kind).or_insert(0) += 1;
            *stats.by_priority.entry(n.priority).or_insert(0) += 1;
        }

        Ok(stats)
    }

    async fn retry_delivery(&self) -> Result<u64> {
        Ok(self.failed_deliveries.swap(0, Ordering::SeqCst))
    }
}

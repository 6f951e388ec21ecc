use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::notification::{Notification, NotificationDraft, NotificationType, Pagination, Priority};

/// One page of notifications as returned by the list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub pagination: Pagination,
}

/// Target audience for an admin broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BroadcastAudience {
    /// Every user of the storefront
    All,
    /// An explicit set of user identifiers
    Users(Vec<String>),
}

impl BroadcastAudience {
    /// Number of explicit recipients; `None` for an all-users broadcast.
    pub fn explicit_recipients(&self) -> Option<usize> {
        match self {
            BroadcastAudience::All => None,
            BroadcastAudience::Users(ids) => Some(ids.len()),
        }
    }
}

/// Body of `POST /admin/notifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub notification: NotificationDraft,
    pub audience: BroadcastAudience,
}

/// Acknowledgement of a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReceipt {
    /// Id of the first created notification record
    pub id: String,
    /// Number of notification records created
    pub recipients: u64,
}

/// Aggregate counts from `GET /admin/notifications/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    pub by_type: HashMap<NotificationType, u64>,
    pub by_priority: HashMap<Priority, u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UnreadCountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RetryDeliveryResponse {
    pub retried: u64,
}

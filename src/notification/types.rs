use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single server-issued alert record shown to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique identifier, stable across fetch and push delivery
    pub id: String,
    /// Short display title
    pub title: String,
    /// Display body
    pub message: String,
    /// Notification category
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Priority level
    #[serde(default)]
    pub priority: Priority,
    /// Read flag; transitions false -> true only
    #[serde(default)]
    pub read: bool,
    /// Optional deep-link target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Creation timestamp (server-assigned)
    pub created_at: DateTime<Utc>,
    /// Optional expiry timestamp (server-enforced)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Notification categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Order,
    Payment,
    System,
    Promotion,
    Security,
    Product,
    Review,
    Wishlist,
    AdminAlert,
    SystemStatus,
}

impl NotificationType {
    /// Wire name, as used in query parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Order => "order",
            NotificationType::Payment => "payment",
            NotificationType::System => "system",
            NotificationType::Promotion => "promotion",
            NotificationType::Security => "security",
            NotificationType::Product => "product",
            NotificationType::Review => "review",
            NotificationType::Wishlist => "wishlist",
            NotificationType::AdminAlert => "admin_alert",
            NotificationType::SystemStatus => "system_status",
        }
    }
}

/// Priority levels for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority, can be delayed
    Low,
    /// Normal priority (default)
    #[default]
    Medium,
    /// High priority, should be delivered promptly
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Get numeric value for priority comparison
    pub fn as_weight(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_weight().cmp(&other.as_weight())
    }
}

impl Notification {
    /// Check whether the notification has passed its expiry timestamp.
    ///
    /// Expiry is server-enforced; items already in the store are never
    /// removed by the client based on this flag.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    /// Materialize a draft into a full notification with a fresh id.
    ///
    /// Mirrors what the server does on creation; used by the in-memory
    /// backend.
    pub fn from_draft(draft: NotificationDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            priority: draft.priority,
            read: false,
            link: draft.link,
            created_at: Utc::now(),
            expires_at: draft.expires_at,
        }
    }
}

/// Notification content as submitted for creation (id and timestamps are
/// server-assigned).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Builder for notification drafts
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    title: String,
    message: String,
    kind: NotificationType,
    priority: Priority,
    link: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl NotificationBuilder {
    /// Create a new builder with the required display fields
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationType,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            priority: Priority::default(),
            link: None,
            expires_at: None,
        }
    }

    /// Set the priority
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the deep-link target
    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Set the expiry timestamp
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Build the draft
    pub fn build(self) -> NotificationDraft {
        NotificationDraft {
            title: self.title,
            message: self.message,
            kind: self.kind,
            priority: self.priority,
            link: self.link,
            expires_at: self.expires_at,
        }
    }
}

/// Pagination state for a fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page, always >= 1
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Total records matching the query
    pub total: u64,
    /// Total pages
    pub pages: u32,
}

impl Pagination {
    pub fn has_next_page(&self) -> bool {
        self.page < self.pages
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            total: 0,
            pages: 0,
        }
    }
}

/// Filter set for the user-facing notification list
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    pub kind: Option<NotificationType>,
    pub read: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl NotificationFilter {
    pub fn matches(&self, notification: &Notification) -> bool {
        if let Some(kind) = self.kind {
            if notification.kind != kind {
                return false;
            }
        }
        if let Some(read) = self.read {
            if notification.read != read {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if notification.created_at < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if notification.created_at > end {
                return false;
            }
        }
        true
    }
}

/// Filter set for the admin notification list; extends the user filters
/// with priority and recipient scoping.
#[derive(Debug, Clone, Default)]
pub struct AdminFilter {
    pub kind: Option<NotificationType>,
    pub priority: Option<Priority>,
    pub read: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
}

impl AdminFilter {
    /// Content match; recipient scoping is applied by the backend, which
    /// knows who each record was delivered to.
    pub fn matches(&self, notification: &Notification) -> bool {
        if let Some(kind) = self.kind {
            if notification.kind != kind {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if notification.priority != priority {
                return false;
            }
        }
        if let Some(read) = self.read {
            if notification.read != read {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if notification.created_at < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if notification.created_at > end {
                return false;
            }
        }
        true
    }
}

//! REST backends for the notification service.
//!
//! The facade talks to the remote service through the [`NotificationApi`]
//! and [`AdminNotificationApi`] traits, allowing different backends to be
//! used interchangeably:
//!
//! - `HttpNotificationApi`: the real REST client (default)
//! - `MemoryNotificationApi`: an in-process simulation for tests and
//!   offline operation
//!
//! Use `create_api_backend()` / `create_admin_api_backend()` to create the
//! appropriate backend based on configuration.

mod http;
mod memory;
mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::error::Result;
use crate::notification::{AdminFilter, Notification, NotificationDraft, NotificationFilter, NotificationType};

pub use http::HttpNotificationApi;
pub use memory::MemoryNotificationApi;
pub use types::{
    BroadcastAudience, BroadcastReceipt, BroadcastRequest, NotificationPage, NotificationStats,
};

/// User-facing notification operations.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetch one page of the caller's notifications.
    async fn list(&self, page: u32, limit: u32, filter: &NotificationFilter)
        -> Result<NotificationPage>;

    /// Mark a single notification as read; returns the updated record.
    async fn mark_read(&self, id: &str) -> Result<Notification>;

    /// Mark all notifications as read, optionally scoped to one type.
    async fn mark_all_read(&self, kind: Option<NotificationType>) -> Result<()>;

    /// Delete a single notification.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all of the caller's notifications.
    async fn delete_all(&self) -> Result<()>;

    /// Server-authoritative unread count, optionally scoped to one type.
    async fn unread_count(&self, kind: Option<NotificationType>) -> Result<u64>;
}

/// Admin-scoped notification operations.
#[async_trait]
pub trait AdminNotificationApi: Send + Sync {
    /// Fetch one page across all users, with admin filters.
    async fn admin_list(&self, page: u32, limit: u32, filter: &AdminFilter)
        -> Result<NotificationPage>;

    /// Create a notification for the given audience.
    async fn broadcast(
        &self,
        draft: &NotificationDraft,
        audience: &BroadcastAudience,
    ) -> Result<BroadcastReceipt>;

    /// Delete all notifications, storewide.
    async fn admin_delete_all(&self) -> Result<()>;

    /// Aggregate counts by type, priority, and read state.
    async fn stats(&self) -> Result<NotificationStats>;

    /// Re-attempt failed deliveries; returns the number retried.
    async fn retry_delivery(&self) -> Result<u64>;
}

/// Create a user-facing API backend based on configuration.
///
/// - `"http"` (default): the REST client
/// - anything else: the in-memory simulation
pub fn create_api_backend(config: &ApiConfig) -> Result<Arc<dyn NotificationApi>> {
    match config.backend.as_str() {
        "http" => {
            tracing::info!(backend = "http", base_url = %config.base_url, "Creating HTTP API backend");
            Ok(Arc::new(HttpNotificationApi::new(config)?))
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory API backend");
            Ok(Arc::new(MemoryNotificationApi::new()))
        }
    }
}

/// Create an admin API backend based on configuration.
pub fn create_admin_api_backend(config: &ApiConfig) -> Result<Arc<dyn AdminNotificationApi>> {
    match config.backend.as_str() {
        "http" => {
            tracing::info!(backend = "http", base_url = %config.base_url, "Creating HTTP admin API backend");
            Ok(Arc::new(HttpNotificationApi::new(config)?))
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory admin API backend");
            Ok(Arc::new(MemoryNotificationApi::new()))
        }
    }
}

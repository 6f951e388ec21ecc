//! Notification domain types shared by the store, the REST backends, and
//! the push channel.

mod types;

pub use types::{
    AdminFilter, Notification, NotificationBuilder, NotificationDraft, NotificationFilter,
    NotificationType, Pagination, Priority,
};

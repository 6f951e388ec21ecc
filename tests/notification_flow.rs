//! Cross-component integration tests
//!
//! These tests verify interactions between the store, the facades, the
//! alert sink, and the push listener against the in-memory API backend,
//! without requiring a real server or Redis.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use emporia_notification_client::admin::AdminFacade;
use emporia_notification_client::alert::{AlertLevel, AlertSink};
use emporia_notification_client::api::{
    BroadcastAudience, MemoryNotificationApi, NotificationApi, NotificationPage,
};
use emporia_notification_client::error::{ClientError, Result};
use emporia_notification_client::facade::NotificationFacade;
use emporia_notification_client::notification::{
    AdminFilter, Notification, NotificationBuilder, NotificationDraft, NotificationFilter,
    NotificationType, Priority,
};
use emporia_notification_client::push::{MemoryPushTransport, PushListener};
use emporia_notification_client::store::NotificationStore;
use emporia_notification_client::config::PushConfig;

/// Create a full test environment backed by the in-memory API
fn create_test_environment() -> TestEnvironment {
    let api = Arc::new(MemoryNotificationApi::with_user("user-1"));
    let alerts = AlertSink::default();

    let store = Arc::new(NotificationStore::new());
    let facade = NotificationFacade::new(api.clone(), store.clone(), alerts.clone());

    let admin_store = Arc::new(NotificationStore::new());
    let admin = AdminFacade::new(api.clone(), admin_store.clone(), alerts.clone());

    TestEnvironment {
        api,
        alerts,
        store,
        facade,
        admin_store,
        admin,
    }
}

struct TestEnvironment {
    api: Arc<MemoryNotificationApi>,
    alerts: AlertSink,
    store: Arc<NotificationStore>,
    facade: NotificationFacade,
    admin_store: Arc<NotificationStore>,
    admin: AdminFacade,
}

fn draft(kind: NotificationType) -> NotificationDraft {
    NotificationBuilder::new("Title", "Message", kind).build()
}

fn notification(id: &str) -> Notification {
    let mut n = Notification::from_draft(draft(NotificationType::Order));
    n.id = id.to_string();
    n
}

// =============================================================================
// End-to-end scenarios: store + facade
// =============================================================================

mod scenario_tests {
    use super::*;
    use emporia_notification_client::store::StoreEvent;

    #[tokio::test]
    async fn test_push_insert_into_empty_store() {
        let env = create_test_environment();

        env.store
            .apply(StoreEvent::PushReceived(notification("n1")));

        let snap = env.store.snapshot();
        assert_eq!(snap.notifications.len(), 1);
        assert_eq!(snap.unread_count, 1);
    }

    #[tokio::test]
    async fn test_mark_read_after_push() {
        let env = create_test_environment();
        env.api.seed(notification("n1"));
        env.store
            .apply(StoreEvent::PushReceived(notification("n1")));

        env.facade.mark_read("n1").await.unwrap();

        let snap = env.store.snapshot();
        assert!(snap.notifications[0].read);
        assert_eq!(snap.unread_count, 0);
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let env = create_test_environment();
        for id in ["n1", "n2", "n3"] {
            env.api.seed(notification(id));
        }
        env.facade
            .fetch_page(1, 10, &NotificationFilter::default())
            .await
            .unwrap();
        env.store.apply(StoreEvent::UnreadCountFetched(2));

        env.facade.mark_all_read(None).await.unwrap();

        let snap = env.store.snapshot();
        assert_eq!(snap.notifications.len(), 3);
        assert!(snap.notifications.iter().all(|n| n.read));
        assert_eq!(snap.unread_count, 0);
    }

    #[tokio::test]
    async fn test_delete_one_of_two() {
        let env = create_test_environment();
        env.store
            .apply(StoreEvent::PushReceived(notification("n1")));
        env.store
            .apply(StoreEvent::PushReceived(notification("n2")));
        env.api.seed(notification("n1"));
        env.api.seed(notification("n2"));

        env.facade.delete_one("n1").await.unwrap();

        let snap = env.store.snapshot();
        assert_eq!(snap.notifications.len(), 1);
        assert_eq!(snap.notifications[0].id, "n2");
        assert_eq!(snap.unread_count, 1);
    }

    #[tokio::test]
    async fn test_server_count_overwrites_local_derivation() {
        let env = create_test_environment();
        // Seven unread on the server, but the client only loads a page of two
        for _ in 0..7 {
            env.api
                .seed(Notification::from_draft(draft(NotificationType::Order)));
        }
        env.facade
            .fetch_page(1, 2, &NotificationFilter::default())
            .await
            .unwrap();
        assert_eq!(env.store.snapshot().notifications.len(), 2);

        env.facade.refresh_unread_count(None).await.unwrap();

        assert_eq!(env.store.unread_count(), 7);
    }
}

// =============================================================================
// Fetch behavior and failure handling
// =============================================================================

mod fetch_tests {
    use super::*;

    /// API double that fails every call.
    struct FailingApi;

    #[async_trait]
    impl NotificationApi for FailingApi {
        async fn list(
            &self,
            _page: u32,
            _limit: u32,
            _filter: &NotificationFilter,
        ) -> Result<NotificationPage> {
            Err(ClientError::Api {
                status: 500,
                message: "internal error".to_string(),
            })
        }

        async fn mark_read(&self, _id: &str) -> Result<Notification> {
            Err(ClientError::Api {
                status: 500,
                message: "internal error".to_string(),
            })
        }

        async fn mark_all_read(&self, _kind: Option<NotificationType>) -> Result<()> {
            Err(ClientError::Api {
                status: 500,
                message: "internal error".to_string(),
            })
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            Err(ClientError::Api {
                status: 500,
                message: "internal error".to_string(),
            })
        }

        async fn delete_all(&self) -> Result<()> {
            Err(ClientError::Api {
                status: 500,
                message: "internal error".to_string(),
            })
        }

        async fn unread_count(&self, _kind: Option<NotificationType>) -> Result<u64> {
            Err(ClientError::Api {
                status: 500,
                message: "internal error".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_page_beyond_bounds_returns_empty() {
        let env = create_test_environment();
        for _ in 0..3 {
            env.api
                .seed(Notification::from_draft(draft(NotificationType::Order)));
        }

        env.facade
            .fetch_page(99, 2, &NotificationFilter::default())
            .await
            .unwrap();

        let snap = env.store.snapshot();
        assert!(snap.notifications.is_empty());
        assert_eq!(snap.pagination.total, 3);
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_fetch_page_zero_is_clamped() {
        let env = create_test_environment();
        env.api
            .seed(Notification::from_draft(draft(NotificationType::Order)));

        env.facade
            .fetch_page(0, 10, &NotificationFilter::default())
            .await
            .unwrap();

        assert_eq!(env.store.snapshot().pagination.page, 1);
        assert_eq!(env.store.snapshot().notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_with_type_filter() {
        let env = create_test_environment();
        env.api
            .seed(Notification::from_draft(draft(NotificationType::Order)));
        env.api
            .seed(Notification::from_draft(draft(NotificationType::Promotion)));

        let filter = NotificationFilter {
            kind: Some(NotificationType::Promotion),
            ..Default::default()
        };
        env.facade.fetch_page(1, 10, &filter).await.unwrap();

        let snap = env.store.snapshot();
        assert_eq!(snap.notifications.len(), 1);
        assert_eq!(snap.notifications[0].kind, NotificationType::Promotion);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_stale_data_and_records_error() {
        let env = create_test_environment();
        env.store.apply(
            emporia_notification_client::store::StoreEvent::PushReceived(notification("n1")),
        );

        let failing = NotificationFacade::new(
            Arc::new(FailingApi),
            env.store.clone(),
            env.alerts.clone(),
        );
        let mut alerts = env.alerts.subscribe();

        let result = failing
            .fetch_page(1, 10, &NotificationFilter::default())
            .await;
        assert!(result.is_err());

        let snap = env.store.snapshot();
        assert_eq!(snap.notifications.len(), 1);
        assert!(snap.error.is_some());
        assert_eq!(alerts.recv().await.unwrap().level, AlertLevel::Error);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_store_intact() {
        let env = create_test_environment();
        env.store.apply(
            emporia_notification_client::store::StoreEvent::PushReceived(notification("n1")),
        );

        let failing = NotificationFacade::new(
            Arc::new(FailingApi),
            env.store.clone(),
            env.alerts.clone(),
        );

        let result = failing.mark_read("n1").await;
        assert!(result.is_err());

        let snap = env.store.snapshot();
        assert!(!snap.notifications[0].read);
        assert_eq!(snap.unread_count, 1);
        assert!(snap.error.is_some());
    }

    #[tokio::test]
    async fn test_mark_read_on_stale_id_surfaces_error_without_mutation() {
        let env = create_test_environment();
        let mut alerts = env.alerts.subscribe();

        // Known to the store, already deleted on the server
        env.store.apply(
            emporia_notification_client::store::StoreEvent::PushReceived(notification("gone")),
        );

        let result = env.facade.mark_read("gone").await;
        assert!(matches!(result, Err(ClientError::NotFound(_))));

        let snap = env.store.snapshot();
        assert!(!snap.notifications[0].read);
        assert_eq!(snap.unread_count, 1);
        assert_eq!(alerts.recv().await.unwrap().level, AlertLevel::Error);
    }
}

// =============================================================================
// Duplicate-submission guard
// =============================================================================

mod pending_action_tests {
    use super::*;

    /// Delegating API whose mark_read blocks until released, for observing
    /// the in-flight window.
    struct GatedApi {
        inner: Arc<MemoryNotificationApi>,
        gate: Arc<Notify>,
        mark_read_calls: AtomicU32,
    }

    #[async_trait]
    impl NotificationApi for GatedApi {
        async fn list(
            &self,
            page: u32,
            limit: u32,
            filter: &NotificationFilter,
        ) -> Result<NotificationPage> {
            self.inner.list(page, limit, filter).await
        }

        async fn mark_read(&self, id: &str) -> Result<Notification> {
            self.mark_read_calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.inner.mark_read(id).await
        }

        async fn mark_all_read(&self, kind: Option<NotificationType>) -> Result<()> {
            self.inner.mark_all_read(kind).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id).await
        }

        async fn delete_all(&self) -> Result<()> {
            self.inner.delete_all().await
        }

        async fn unread_count(&self, kind: Option<NotificationType>) -> Result<u64> {
            self.inner.unread_count(kind).await
        }
    }

    #[tokio::test]
    async fn test_second_mark_read_is_skipped_while_first_in_flight() {
        let inner = Arc::new(MemoryNotificationApi::with_user("user-1"));
        inner.seed(notification("n1"));

        let gate = Arc::new(Notify::new());
        let gated = Arc::new(GatedApi {
            inner,
            gate: gate.clone(),
            mark_read_calls: AtomicU32::new(0),
        });

        let store = Arc::new(NotificationStore::new());
        let facade = Arc::new(NotificationFacade::new(
            gated.clone(),
            store.clone(),
            AlertSink::default(),
        ));

        let first = tokio::spawn({
            let facade = facade.clone();
            async move { facade.mark_read("n1").await }
        });

        // Wait until the first call is parked inside the API
        while gated.mark_read_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(facade.is_marking_read("n1"));

        // The duplicate is skipped without reaching the API
        facade.mark_read("n1").await.unwrap();
        assert_eq!(gated.mark_read_calls.load(Ordering::SeqCst), 1);

        gate.notify_one();
        first.await.unwrap().unwrap();

        // Released after completion; a fresh call goes through
        assert!(!facade.is_marking_read("n1"));
    }

    #[tokio::test]
    async fn test_operations_on_different_notifications_do_not_block() {
        let env = create_test_environment();
        env.api.seed(notification("n1"));
        env.api.seed(notification("n2"));

        env.facade.mark_read("n1").await.unwrap();
        env.facade.mark_read("n2").await.unwrap();

        assert!(!env.facade.is_marking_read("n1"));
        assert!(!env.facade.is_marking_read("n2"));
    }
}

// =============================================================================
// Bulk operations refresh the server count
// =============================================================================

mod bulk_operation_tests {
    use super::*;

    #[tokio::test]
    async fn test_mark_all_read_scoped_refreshes_count_from_server() {
        let env = create_test_environment();
        for _ in 0..5 {
            env.api
                .seed(Notification::from_draft(draft(NotificationType::Order)));
        }
        for _ in 0..2 {
            env.api
                .seed(Notification::from_draft(draft(NotificationType::Payment)));
        }
        env.facade
            .fetch_page(1, 3, &NotificationFilter::default())
            .await
            .unwrap();

        env.facade
            .mark_all_read(Some(NotificationType::Order))
            .await
            .unwrap();

        // The server marked all five orders read; two payments remain unread
        assert_eq!(env.store.unread_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_all_clears_store_and_refreshes_count() {
        let env = create_test_environment();
        for _ in 0..4 {
            env.api
                .seed(Notification::from_draft(draft(NotificationType::Order)));
        }
        env.facade
            .fetch_page(1, 2, &NotificationFilter::default())
            .await
            .unwrap();

        env.facade.delete_all().await.unwrap();

        let snap = env.store.snapshot();
        assert!(snap.notifications.is_empty());
        assert_eq!(snap.pagination.total, 0);
        assert_eq!(snap.unread_count, 0);
        assert_eq!(env.api.unread_count(None).await.unwrap(), 0);
    }
}

// =============================================================================
// Push listener + facade reconciliation
// =============================================================================

mod push_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_pushed_notification_reconciles_with_fetch() {
        let env = create_test_environment();
        let transport = Arc::new(MemoryPushTransport::new());
        let listener = Arc::new(PushListener::new(
            PushConfig {
                reconnect_delay_seconds: 0,
                ..Default::default()
            },
            "user-1",
            transport.clone(),
            env.store.clone(),
            env.alerts.clone(),
        ));

        let handle = tokio::spawn({
            let listener = listener.clone();
            async move { listener.start().await }
        });
        while transport.open_connections() == 0 {
            tokio::task::yield_now().await;
        }

        // The same record is delivered by push and present in the next fetch
        let n = notification("n1");
        env.api.seed(n.clone());
        transport.inject_notification(&n).await;
        while env.store.snapshot().notifications.is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(env.store.unread_count(), 1);

        env.facade
            .fetch_page(1, 10, &NotificationFilter::default())
            .await
            .unwrap();

        // One entry, not fetch-length + 1
        let snap = env.store.snapshot();
        assert_eq!(snap.notifications.len(), 1);
        assert_eq!(snap.notifications[0].id, "n1");

        listener.shutdown_signal().send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_high_priority_push_raises_warning_alert() {
        let env = create_test_environment();
        let transport = Arc::new(MemoryPushTransport::new());
        let listener = Arc::new(PushListener::new(
            PushConfig {
                reconnect_delay_seconds: 0,
                ..Default::default()
            },
            "user-1",
            transport.clone(),
            env.store.clone(),
            env.alerts.clone(),
        ));
        let mut alerts = env.alerts.subscribe();

        let handle = tokio::spawn({
            let listener = listener.clone();
            async move { listener.start().await }
        });
        while transport.open_connections() == 0 {
            tokio::task::yield_now().await;
        }

        let n = Notification::from_draft(
            NotificationBuilder::new("Security alert", "New login", NotificationType::Security)
                .priority(Priority::High)
                .build(),
        );
        transport.inject_notification(&n).await;

        let alert = alerts.recv().await.unwrap();
        assert_eq!(alert.level, AlertLevel::Warning);
        assert_eq!(alert.message, "Security alert");

        listener.shutdown_signal().send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}

// =============================================================================
// Admin surface
// =============================================================================

mod admin_tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_with_empty_recipients_makes_no_call() {
        let env = create_test_environment();
        let mut alerts = env.alerts.subscribe();

        let result = env
            .admin
            .broadcast(
                draft(NotificationType::AdminAlert),
                BroadcastAudience::Users(vec![]),
            )
            .await;

        assert!(matches!(result, Err(ClientError::Validation(_))));
        assert_eq!(alerts.recv().await.unwrap().level, AlertLevel::Error);
        // Nothing was created server-side
        let stats = env.admin.stats().await.unwrap();
        assert_eq!(stats.total, 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_targeted_user() {
        let env = create_test_environment();

        let receipt = env
            .admin
            .broadcast(
                draft(NotificationType::AdminAlert),
                BroadcastAudience::Users(vec!["user-1".to_string(), "user-2".to_string()]),
            )
            .await
            .unwrap();
        assert_eq!(receipt.recipients, 2);

        // The storefront user sees exactly their copy
        env.facade
            .fetch_page(1, 10, &NotificationFilter::default())
            .await
            .unwrap();
        let snap = env.store.snapshot();
        assert_eq!(snap.notifications.len(), 1);
        assert_eq!(snap.notifications[0].kind, NotificationType::AdminAlert);
    }

    #[tokio::test]
    async fn test_broadcast_to_all_users() {
        let env = create_test_environment();

        env.admin
            .broadcast(draft(NotificationType::SystemStatus), BroadcastAudience::All)
            .await
            .unwrap();

        env.facade
            .fetch_page(1, 10, &NotificationFilter::default())
            .await
            .unwrap();
        assert_eq!(env.store.snapshot().notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_admin_list_filters_by_priority() {
        let env = create_test_environment();
        env.api
            .seed(Notification::from_draft(draft(NotificationType::Order)));
        env.api.seed(Notification::from_draft(
            NotificationBuilder::new("t", "m", NotificationType::Security)
                .priority(Priority::High)
                .build(),
        ));

        let filter = AdminFilter {
            priority: Some(Priority::High),
            ..Default::default()
        };
        env.admin.fetch_page(1, 10, &filter).await.unwrap();

        let snap = env.admin_store.snapshot();
        assert_eq!(snap.notifications.len(), 1);
        assert_eq!(snap.notifications[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn test_admin_delete_all_refreshes_counts() {
        let env = create_test_environment();
        for _ in 0..3 {
            env.api
                .seed(Notification::from_draft(draft(NotificationType::Order)));
        }
        env.admin
            .fetch_page(1, 10, &AdminFilter::default())
            .await
            .unwrap();

        env.admin.delete_all().await.unwrap();

        let snap = env.admin_store.snapshot();
        assert!(snap.notifications.is_empty());
        assert_eq!(snap.unread_count, 0);
        let stats = env.admin.stats().await.unwrap();
        assert_eq!(stats.total, 0);
    }

    #[tokio::test]
    async fn test_retry_delivery_reports_count() {
        let env = create_test_environment();
        env.api.record_failed_delivery();
        env.api.record_failed_delivery();
        env.api.record_failed_delivery();

        assert_eq!(env.admin.retry_delivery().await.unwrap(), 3);
        assert_eq!(env.admin.retry_delivery().await.unwrap(), 0);
    }
}

//! Client-side notification store.
//!
//! Single source of truth for the notification list, unread count,
//! pagination, and loading/error flags. All mutation flows through
//! [`NotificationStore::apply`]; components read cloned snapshots and
//! subscribe to changes through a watch channel, so reads never contend
//! with transitions.
//!
//! The store never performs I/O and never retries; confirmed mutations
//! arrive from the facade, optimistic inserts from the push listener.

use std::collections::HashSet;
use std::sync::RwLock;

use tokio::sync::watch;

use crate::notification::{Notification, NotificationType, Pagination};

/// State transitions applied to the store.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A page fetch was issued
    FetchStarted,
    /// A page fetch resolved; replaces the held page
    FetchSucceeded {
        notifications: Vec<Notification>,
        pagination: Pagination,
    },
    /// A page fetch failed; held data is retained
    FetchFailed(String),
    /// A notification arrived on the push channel
    PushReceived(Notification),
    /// The server confirmed a single notification as read
    MarkReadSucceeded(String),
    /// The server confirmed a bulk mark-as-read, optionally scoped to one type
    MarkAllReadSucceeded { kind: Option<NotificationType> },
    /// The server confirmed a single deletion
    DeleteSucceeded(String),
    /// The server confirmed deletion of all notifications
    DeleteAllSucceeded,
    /// A fresh unread count arrived from the server
    UnreadCountFetched(u64),
    /// A mutation failed; only the error surface changes
    MutationFailed(String),
}

/// Point-in-time view of the store, cheap to clone and safe to render from.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub notifications: Vec<Notification>,
    pub pagination: Pagination,
    pub unread_count: u64,
    pub loading: bool,
    pub error: Option<String>,
}

struct StoreState {
    notifications: Vec<Notification>,
    pagination: Pagination,
    unread_count: u64,
    loading: bool,
    error: Option<String>,
    /// Ids inserted by push since the last `FetchStarted`; these survive a
    /// `FetchSucceeded` whose response does not contain them.
    pushed_since_fetch: HashSet<String>,
}

impl StoreState {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            notifications: self.notifications.clone(),
            pagination: self.pagination.clone(),
            unread_count: self.unread_count,
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

/// The notification store.
pub struct NotificationStore {
    state: RwLock<StoreState>,
    changed: watch::Sender<StoreSnapshot>,
}

impl NotificationStore {
    pub fn new() -> Self {
        let state = StoreState {
            notifications: Vec::new(),
            pagination: Pagination::default(),
            unread_count: 0,
            loading: false,
            error: None,
            pushed_since_fetch: HashSet::new(),
        };
        let (changed, _) = watch::channel(state.snapshot());
        Self {
            state: RwLock::new(state),
            changed,
        }
    }

    /// Apply a transition and notify subscribers.
    pub fn apply(&self, event: StoreEvent) {
        let mut state = self.state.write().expect("store lock poisoned");

        match event {
            StoreEvent::FetchStarted => {
                state.loading = true;
                state.error = None;
                state.pushed_since_fetch.clear();
            }
            StoreEvent::FetchSucceeded {
                notifications,
                pagination,
            } => {
                // Push inserts that raced this fetch and are missing from the
                // response are kept at the head; ids present in the response
                // reconcile to the fetched copy.
                let preserved: Vec<Notification> = {
                    let fetched: HashSet<&str> =
                        notifications.iter().map(|n| n.id.as_str()).collect();
                    state
                        .notifications
                        .iter()
                        .filter(|n| {
                            state.pushed_since_fetch.contains(&n.id)
                                && !fetched.contains(n.id.as_str())
                        })
                        .cloned()
                        .collect()
                };

                let mut merged = preserved;
                merged.extend(notifications);
                state.notifications = merged;
                state.pagination = pagination;
                state.pushed_since_fetch.clear();
                state.loading = false;
            }
            StoreEvent::FetchFailed(message) => {
                state.loading = false;
                state.error = Some(message);
                state.pushed_since_fetch.clear();
            }
            StoreEvent::PushReceived(notification) => {
                if state.notifications.iter().any(|n| n.id == notification.id) {
                    tracing::debug!(id = %notification.id, "Duplicate push delivery ignored");
                } else {
                    if !notification.read {
                        state.unread_count += 1;
                    }
                    state.pushed_since_fetch.insert(notification.id.clone());
                    state.notifications.insert(0, notification);
                }
            }
            StoreEvent::MarkReadSucceeded(id) => {
                if let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) {
                    if !n.read {
                        n.read = true;
                        state.unread_count = state.unread_count.saturating_sub(1);
                    }
                }
            }
            StoreEvent::MarkAllReadSucceeded { kind } => match kind {
                None => {
                    for n in state.notifications.iter_mut() {
                        n.read = true;
                    }
                    state.unread_count = 0;
                }
                Some(kind) => {
                    let mut newly_read: u64 = 0;
                    for n in state
                        .notifications
                        .iter_mut()
                        .filter(|n| n.kind == kind && !n.read)
                    {
                        n.read = true;
                        newly_read += 1;
                    }
                    state.unread_count = state.unread_count.saturating_sub(newly_read);
                }
            },
            StoreEvent::DeleteSucceeded(id) => {
                if let Some(pos) = state.notifications.iter().position(|n| n.id == id) {
                    let removed = state.notifications.remove(pos);
                    state.pushed_since_fetch.remove(&removed.id);
                    if !removed.read {
                        state.unread_count = state.unread_count.saturating_sub(1);
                    }
                }
            }
            StoreEvent::DeleteAllSucceeded => {
                // The unread count is left alone here; the server may hold
                // notifications outside the current page window, so the
                // facade refetches the count after every bulk operation.
                state.notifications.clear();
                state.pushed_since_fetch.clear();
                state.pagination.total = 0;
                state.pagination.pages = 0;
            }
            StoreEvent::UnreadCountFetched(count) => {
                state.unread_count = count;
            }
            StoreEvent::MutationFailed(message) => {
                state.error = Some(message);
            }
        }

        self.changed.send_replace(state.snapshot());
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.read().expect("store lock poisoned").snapshot()
    }

    /// Subscribe to state changes. The receiver always yields the latest
    /// snapshot first.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.changed.subscribe()
    }

    pub fn unread_count(&self) -> u64 {
        self.state.read().expect("store lock poisoned").unread_count
    }

    pub fn find(&self, id: &str) -> Option<Notification> {
        self.state
            .read()
            .expect("store lock poisoned")
            .notifications
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

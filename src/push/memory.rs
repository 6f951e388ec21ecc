use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::notification::Notification;

use super::transport::{PushTransport, PushTransportError};

/// In-memory push channel for tests and offline operation.
///
/// Frames injected with [`inject`](Self::inject) are delivered to every
/// open connection. Connection failures can be scripted with
/// [`fail_next_connects`](Self::fail_next_connects), and announced
/// identities are recorded for inspection.
pub struct MemoryPushTransport {
    senders: Mutex<Vec<mpsc::Sender<String>>>,
    announced: Mutex<Vec<String>>,
    fail_connects: AtomicU32,
    connect_attempts: AtomicU32,
}

impl MemoryPushTransport {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
            announced: Mutex::new(Vec::new()),
            fail_connects: AtomicU32::new(0),
            connect_attempts: AtomicU32::new(0),
        }
    }

    /// Make the next `n` connection attempts fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.fail_connects.store(n, Ordering::SeqCst);
    }

    /// Deliver a raw frame to every open connection.
    pub async fn inject(&self, frame: impl Into<String>) {
        let frame = frame.into();
        let senders: Vec<mpsc::Sender<String>> = {
            let mut senders = self.senders.lock().expect("senders lock poisoned");
            senders.retain(|tx| !tx.is_closed());
            senders.clone()
        };

        for tx in senders {
            let _ = tx.send(frame.clone()).await;
        }
    }

    /// Deliver a well-formed notification frame to every open connection.
    pub async fn inject_notification(&self, notification: &Notification) {
        let frame = serde_json::json!({
            "event": "notification",
            "payload": notification,
        })
        .to_string();
        self.inject(frame).await;
    }

    /// Close every open connection, as a dropped server would.
    pub fn close_connections(&self) {
        self.senders.lock().expect("senders lock poisoned").clear();
    }

    /// Identities announced so far, in order.
    pub fn announced(&self) -> Vec<String> {
        self.announced.lock().expect("announced lock poisoned").clone()
    }

    /// Total number of connection attempts, including failed ones.
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn open_connections(&self) -> usize {
        let mut senders = self.senders.lock().expect("senders lock poisoned");
        senders.retain(|tx| !tx.is_closed());
        senders.len()
    }
}

impl Default for MemoryPushTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushTransport for MemoryPushTransport {
    async fn connect(
        &self,
        _user_id: &str,
    ) -> Result<mpsc::Receiver<String>, PushTransportError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_connects.store(remaining - 1, Ordering::SeqCst);
            return Err(PushTransportError::Connect(
                "simulated connection failure".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(64);
        self.senders
            .lock()
            .expect("senders lock poisoned")
            .push(tx);
        Ok(rx)
    }

    async fn announce(&self, user_id: &str) -> Result<(), PushTransportError> {
        self.announced
            .lock()
            .expect("announced lock poisoned")
            .push(user_id.to_string());
        Ok(())
    }
}

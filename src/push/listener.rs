use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};

use crate::alert::{AlertLevel, AlertSink};
use crate::auth::SessionToken;
use crate::config::PushConfig;
use crate::notification::{Notification, Priority};
use crate::store::{NotificationStore, StoreEvent};

use super::transport::PushTransport;

/// Frame format received on the push channel.
#[derive(Debug, Deserialize)]
pub struct PushMessage {
    /// Event kind: "notification" is the only one acted on
    pub event: String,
    /// Event payload
    #[serde(default)]
    pub payload: serde_json::Value,
}

enum LoopExit {
    Shutdown,
    StreamEnded,
}

/// Listens on the push channel and feeds the store.
///
/// Owns the connection for the lifetime of the session: connects,
/// announces the session identity once per establishment, and translates
/// each well-formed notification frame into exactly one store insert and
/// one ephemeral alert. Connection failures degrade the feature to
/// poll-on-demand and are never surfaced to the user.
pub struct PushListener {
    config: PushConfig,
    user_id: String,
    transport: Arc<dyn PushTransport>,
    store: Arc<NotificationStore>,
    alerts: AlertSink,
    shutdown: broadcast::Sender<()>,
}

impl PushListener {
    pub fn new(
        config: PushConfig,
        user_id: impl Into<String>,
        transport: Arc<dyn PushTransport>,
        store: Arc<NotificationStore>,
        alerts: AlertSink,
    ) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            config,
            user_id: user_id.into(),
            transport,
            store,
            alerts,
            shutdown,
        }
    }

    /// Build a listener for an authenticated session token.
    pub fn for_session(
        config: PushConfig,
        token: &SessionToken,
        transport: Arc<dyn PushTransport>,
        store: Arc<NotificationStore>,
        alerts: AlertSink,
    ) -> Self {
        Self::new(config, token.user_id(), transport, store, alerts)
    }

    /// Get a shutdown signal sender.
    pub fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    /// Run the listener until shutdown or until reconnection attempts are
    /// exhausted.
    ///
    /// Exhaustion is not an error: the channel goes silent until the next
    /// session and the rest of the application keeps working.
    pub async fn start(&self) -> anyhow::Result<()> {
        let mut shutdown_rx = self.shutdown.subscribe();
        let mut failed_attempts: u32 = 0;

        loop {
            match self.transport.connect(&self.user_id).await {
                Ok(frames) => {
                    if let Err(e) = self.transport.announce(&self.user_id).await {
                        tracing::warn!(error = %e, "Failed to announce identity on push channel");
                        failed_attempts += 1;
                        if self.attempts_exhausted(failed_attempts) {
                            break;
                        }
                        if !self.wait_before_reconnect(&mut shutdown_rx).await {
                            break;
                        }
                        continue;
                    }

                    failed_attempts = 0;
                    tracing::info!(user_id = %self.user_id, "Push channel connected");

                    match self.run_receive_loop(frames, &mut shutdown_rx).await {
                        LoopExit::Shutdown => {
                            tracing::info!("Push listener stopped");
                            break;
                        }
                        LoopExit::StreamEnded => {
                            tracing::warn!("Push channel stream ended, reconnecting");
                            if !self.wait_before_reconnect(&mut shutdown_rx).await {
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    failed_attempts += 1;
                    if self.attempts_exhausted(failed_attempts) {
                        tracing::warn!(
                            error = %e,
                            attempts = failed_attempts,
                            "Push channel unavailable, staying silent until next session"
                        );
                        break;
                    }
                    tracing::debug!(
                        error = %e,
                        attempt = failed_attempts,
                        "Push connection failed, retrying"
                    );
                    if !self.wait_before_reconnect(&mut shutdown_rx).await {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn attempts_exhausted(&self, failed_attempts: u32) -> bool {
        failed_attempts >= self.config.max_reconnect_attempts
    }

    /// Fixed-delay wait between connection attempts. Returns false when
    /// shutdown was requested during the wait.
    async fn wait_before_reconnect(&self, shutdown_rx: &mut broadcast::Receiver<()>) -> bool {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => false,
            _ = tokio::time::sleep(Duration::from_secs(self.config.reconnect_delay_seconds)) => true,
        }
    }

    async fn run_receive_loop(
        &self,
        mut frames: mpsc::Receiver<String>,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> LoopExit {
        loop {
            tokio::select! {
                // Shutdown wins over frames already in flight
                biased;
                _ = shutdown_rx.recv() => return LoopExit::Shutdown,
                frame = frames.recv() => match frame {
                    Some(raw) => self.handle_frame(&raw),
                    None => return LoopExit::StreamEnded,
                },
            }
        }
    }

    /// Handle a single raw frame; malformed frames are dropped.
    fn handle_frame(&self, raw: &str) {
        let message: PushMessage = match serde_json::from_str(raw) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse push frame, dropping");
                return;
            }
        };

        match message.event.as_str() {
            "notification" => {
                let notification: Notification = match serde_json::from_value(message.payload) {
                    Ok(n) => n,
                    Err(e) => {
                        tracing::warn!(error = %e, "Malformed notification payload, dropping");
                        return;
                    }
                };

                tracing::debug!(
                    id = %notification.id,
                    kind = %notification.kind.as_str(),
                    "Notification received on push channel"
                );

                let level = if notification.priority == Priority::High {
                    AlertLevel::Warning
                } else {
                    AlertLevel::Info
                };
                let title = notification.title.clone();

                self.store.apply(StoreEvent::PushReceived(notification));
                self.alerts.publish(level, title);
            }
            other => {
                tracing::debug!(event = %other, "Ignoring push event");
            }
        }
    }
}

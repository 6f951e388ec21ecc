use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use tokio::sync::mpsc;

use crate::config::PushConfig;

use super::transport::{PushTransport, PushTransportError};

/// Push channel over Redis Pub/Sub.
///
/// Subscribes to the user's own channel plus the broadcast channel and
/// announces the session identity on the presence channel.
pub struct RedisPushTransport {
    config: PushConfig,
}

impl RedisPushTransport {
    pub fn new(config: PushConfig) -> Self {
        Self { config }
    }

    fn user_channel(&self, user_id: &str) -> String {
        format!("{}:user:{}", self.config.channel_prefix, user_id)
    }

    fn broadcast_channel(&self) -> String {
        format!("{}:broadcast", self.config.channel_prefix)
    }

    fn presence_channel(&self) -> String {
        format!("{}:presence", self.config.channel_prefix)
    }
}

#[async_trait]
impl PushTransport for RedisPushTransport {
    async fn connect(
        &self,
        user_id: &str,
    ) -> Result<mpsc::Receiver<String>, PushTransportError> {
        let client = redis::Client::open(self.config.url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        pubsub.subscribe(self.user_channel(user_id)).await?;
        pubsub.subscribe(self.broadcast_channel()).await?;

        tracing::debug!(user_id = %user_id, "Push channel subscription established");

        let (tx, rx) = mpsc::channel(64);

        // Pump frames until the subscription ends or the receiver is
        // dropped; either way the connection closes with this task.
        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read push message payload");
                        continue;
                    }
                };
                if tx.send(payload).await.is_err() {
                    break;
                }
            }
            tracing::debug!("Push channel pump stopped");
        });

        Ok(rx)
    }

    async fn announce(&self, user_id: &str) -> Result<(), PushTransportError> {
        let client = redis::Client::open(self.config.url.as_str())?;
        let mut conn = client.get_multiplexed_async_connection().await?;

        let frame = serde_json::json!({
            "event": "authenticate",
            "userId": user_id,
        })
        .to_string();

        let _: () = conn.publish(self.presence_channel(), frame).await?;

        tracing::debug!(user_id = %user_id, "Announced identity on push channel");
        Ok(())
    }
}

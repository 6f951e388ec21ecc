use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur on the push channel.
#[derive(Debug, Error)]
pub enum PushTransportError {
    /// Connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Redis operation failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// A persistent server-to-client event channel.
///
/// `connect` opens a connection scoped to one user and yields raw inbound
/// frames; dropping the receiver tears the connection down. `announce`
/// publishes the authenticated identity and is called by the listener
/// exactly once per connection establishment.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(
        &self,
        user_id: &str,
    ) -> Result<mpsc::Receiver<String>, PushTransportError>;

    async fn announce(&self, user_id: &str) -> Result<(), PushTransportError>;
}

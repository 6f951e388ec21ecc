//! Push channel: real-time notification delivery.
//!
//! The listener owns a persistent connection to the push channel and
//! turns inbound events into store transitions. Transports are
//! interchangeable:
//!
//! - `RedisPushTransport`: Redis Pub/Sub (default)
//! - `MemoryPushTransport`: in-process channel for tests and offline use
//!
//! Use `create_push_transport()` to create the appropriate transport
//! based on configuration.

mod listener;
mod memory;
mod redis;
mod transport;

use std::sync::Arc;

use crate::config::PushConfig;

pub use listener::{PushListener, PushMessage};
pub use memory::MemoryPushTransport;
pub use redis::RedisPushTransport;
pub use transport::{PushTransport, PushTransportError};

/// Create a push transport based on configuration.
///
/// - `"redis"` (default): Redis Pub/Sub transport
/// - anything else: in-memory transport
pub fn create_push_transport(config: &PushConfig) -> Arc<dyn PushTransport> {
    match config.backend.as_str() {
        "redis" => {
            tracing::info!(backend = "redis", url = %config.url, "Creating Redis push transport");
            Arc::new(RedisPushTransport::new(config.clone()))
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory push transport");
            Arc::new(MemoryPushTransport::new())
        }
    }
}

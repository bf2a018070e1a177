//! In-memory pub/sub implementation.
//!
//! This is a fallback when Redis is not available.
//! Works within a single process only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

use wall_core::ports::{
    MessageHandler, PubSub, PubSubError, PubSubMessage, StatusHandler, SubscriptionId,
};

struct Listener {
    id: SubscriptionId,
    task: JoinHandle<()>,
    on_status: Arc<StatusHandler>,
}

impl Listener {
    fn stop(self) {
        self.task.abort();
        (self.on_status)(false);
    }
}

struct Channel {
    sender: broadcast::Sender<String>,
    listeners: Vec<Listener>,
}

/// In-memory pub/sub system.
pub struct InMemoryPubSub {
    channels: Arc<RwLock<HashMap<String, Channel>>>,
    buffer_size: usize,
}

impl InMemoryPubSub {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            buffer_size,
        }
    }

    /// Active subscriptions on `channel`.
    pub async fn listener_count(&self, channel: &str) -> usize {
        self.channels
            .read()
            .await
            .get(channel)
            .map_or(0, |entry| entry.listeners.len())
    }
}

impl Default for InMemoryPubSub {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl PubSub for InMemoryPubSub {
    async fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError> {
        let channels = self.channels.read().await;

        match channels.get(channel) {
            Some(entry) => {
                // Ignore send errors (no subscribers)
                let receivers = entry.sender.send(message.to_string()).unwrap_or(0);
                tracing::debug!(channel = %channel, receivers, "Message published");
            }
            None => tracing::debug!(channel = %channel, "No subscribers for channel"),
        }

        Ok(())
    }

    async fn subscribe_with_status(
        &self,
        channel: &str,
        handler: MessageHandler,
        on_status: StatusHandler,
    ) -> Result<SubscriptionId, PubSubError> {
        let mut channels = self.channels.write().await;

        // Create channel if it doesn't exist
        let entry = channels.entry(channel.to_string()).or_insert_with(|| Channel {
            sender: broadcast::channel(self.buffer_size).0,
            listeners: Vec::new(),
        });

        let mut receiver = entry.sender.subscribe();
        let channel_name = channel.to_string();
        let on_status = Arc::new(on_status);
        let status = on_status.clone();

        let task = tokio::spawn(async move {
            tracing::info!(channel = %channel_name, "Subscribed to channel");

            loop {
                match receiver.recv().await {
                    Ok(payload) => {
                        let msg = PubSubMessage {
                            channel: channel_name.clone(),
                            payload,
                        };
                        handler(msg).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        tracing::warn!(
                            channel = %channel_name,
                            lagged = count,
                            "Subscriber lagged behind"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!(channel = %channel_name, "Channel closed");
                        status(false);
                        break;
                    }
                }
            }
        });

        let id = SubscriptionId::new();
        entry.listeners.push(Listener {
            id,
            task,
            on_status,
        });

        Ok(id)
    }

    async fn cancel(&self, id: SubscriptionId) -> Result<(), PubSubError> {
        let mut channels = self.channels.write().await;
        for (name, entry) in channels.iter_mut() {
            if let Some(index) = entry.listeners.iter().position(|l| l.id == id) {
                entry.listeners.swap_remove(index).stop();
                tracing::debug!(channel = %name, "Subscription cancelled");
                break;
            }
        }
        Ok(())
    }

    async fn unsubscribe(&self, channel: &str) -> Result<(), PubSubError> {
        if let Some(entry) = self.channels.write().await.remove(channel) {
            entry.listeners.into_iter().for_each(Listener::stop);
            tracing::info!(channel = %channel, "Unsubscribed from channel");
        }
        Ok(())
    }
}

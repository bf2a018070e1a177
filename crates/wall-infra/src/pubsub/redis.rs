//! Redis pub/sub transport, so every server process and viewer shares one wall.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::{ConnectionManager, PubSub as RedisSubscription};
use redis::{AsyncCommands, Client};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use wall_core::ports::{
    MessageHandler, PubSub, PubSubError, PubSubMessage, StatusHandler, SubscriptionId,
};

use super::InMemoryPubSub;

const DEFAULT_URL: &str = "redis://localhost:6379";
const MAX_RESUBSCRIBE_DELAY: Duration = Duration::from_secs(30);

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// Broadcast in-process only when Redis cannot be reached.
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::with_url(DEFAULT_URL)
    }
}

impl RedisConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(5),
            fallback_to_memory: true,
        }
    }

    /// `REDIS_URL`, `REDIS_CONNECT_TIMEOUT_SECS`, `REDIS_FALLBACK_TO_MEMORY`.
    pub fn from_env() -> Self {
        let mut config = Self::with_url(
            std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_URL.to_string()),
        );
        if let Some(secs) = std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Ok(v) = std::env::var("REDIS_FALLBACK_TO_MEMORY") {
            config.fallback_to_memory = v == "true" || v == "1";
        }
        config
    }
}

/// Connect to Redis, or fall back to an in-process transport when allowed.
pub async fn connect_or_fallback(config: RedisConfig) -> Result<Arc<dyn PubSub>, PubSubError> {
    let fallback = config.fallback_to_memory;
    match RedisPubSub::new(config).await {
        Ok(pubsub) => Ok(Arc::new(pubsub)),
        Err(e) if fallback => {
            tracing::warn!(error = %e, "Redis unavailable, broadcasting in-process only");
            Ok(Arc::new(InMemoryPubSub::default()))
        }
        Err(e) => Err(e),
    }
}

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

/// Publishing shares one managed connection; every subscription owns a
/// dedicated connection on a listener task that resubscribes after drops.
pub struct RedisPubSub {
    publisher: ConnectionManager,
    client: Client,
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl RedisPubSub {
    pub async fn new(config: RedisConfig) -> Result<Self, PubSubError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| PubSubError::Connection(e.to_string()))?;

        let publisher = tokio::time::timeout(
            config.connect_timeout,
            ConnectionManager::new(client.clone()),
        )
        .await
        .map_err(|_| PubSubError::Connection("Connection timed out".to_string()))?
        .map_err(|e| PubSubError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis pub/sub");

        Ok(Self {
            publisher,
            client,
            listeners: RwLock::new(HashMap::new()),
        })
    }
}

async fn open_subscription(client: &Client, channel: &str) -> Result<RedisSubscription, PubSubError> {
    let mut subscription = client
        .get_async_pubsub()
        .await
        .map_err(|e| PubSubError::Connection(e.to_string()))?;
    subscription
        .subscribe(channel)
        .await
        .map_err(|e| PubSubError::SubscribeError(e.to_string()))?;
    Ok(subscription)
}

/// Feed messages to `handler` until aborted, reopening the subscription with
/// capped exponential backoff whenever the connection drops. `on_status`
/// follows each drop and recovery.
async fn listen(
    client: Client,
    channel: String,
    mut subscription: RedisSubscription,
    handler: MessageHandler,
    on_status: Arc<StatusHandler>,
) {
    loop {
        {
            let mut messages = subscription.on_message();
            while let Some(msg) = messages.next().await {
                match msg.get_payload::<String>() {
                    Ok(payload) => {
                        handler(PubSubMessage {
                            channel: msg.get_channel_name().to_string(),
                            payload,
                        })
                        .await
                    }
                    Err(e) => tracing::warn!(channel = %channel, error = %e, "Unreadable payload"),
                }
            }
        }

        tracing::warn!(channel = %channel, "Subscription dropped, resubscribing");
        on_status(false);
        let mut delay = Duration::from_secs(1);
        subscription = loop {
            tokio::time::sleep(delay).await;
            match open_subscription(&client, &channel).await {
                Ok(fresh) => break fresh,
                Err(e) => {
                    tracing::warn!(channel = %channel, error = %e, retry_in = ?delay, "Resubscribe failed");
                    delay = (delay * 2).min(MAX_RESUBSCRIBE_DELAY);
                }
            }
        };
        tracing::info!(channel = %channel, "Resubscribed");
        on_status(true);
    }
}

#[async_trait]
impl PubSub for RedisPubSub {
    async fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError> {
        let mut conn = self.publisher.clone();
        let receivers: i64 = conn
            .publish(channel, message)
            .await
            .map_err(|e| PubSubError::PublishError(e.to_string()))?;
        tracing::debug!(channel = %channel, receivers, "Message published");
        Ok(())
    }

    async fn subscribe_with_status(
        &self,
        channel: &str,
        handler: MessageHandler,
        on_status: StatusHandler,
    ) -> Result<SubscriptionId, PubSubError> {
        // The first subscription is opened here so failures reach the caller.
        let subscription = open_subscription(&self.client, channel).await?;
        tracing::debug!(channel = %channel, "Subscribed to Redis channel");

        let on_status = Arc::new(on_status);
        let task = tokio::spawn(listen(
            self.client.clone(),
            channel.to_string(),
            subscription,
            handler,
            on_status.clone(),
        ));

        let id = SubscriptionId::new();
        self.listeners
            .write()
            .await
            .entry(channel.to_string())
            .or_default()
            .push(Listener {
                id,
                task,
                on_status,
            });
        Ok(id)
    }

    async fn cancel(&self, id: SubscriptionId) -> Result<(), PubSubError> {
        let mut listeners = self.listeners.write().await;
        for (channel, active) in listeners.iter_mut() {
            if let Some(index) = active.iter().position(|l| l.id == id) {
                active.swap_remove(index).stop();
                tracing::debug!(channel = %channel, "Redis subscription cancelled");
                break;
            }
        }
        Ok(())
    }

    async fn unsubscribe(&self, channel: &str) -> Result<(), PubSubError> {
        if let Some(listeners) = self.listeners.write().await.remove(channel) {
            listeners.into_iter().for_each(Listener::stop);
            tracing::debug!(channel = %channel, "Unsubscribed from Redis channel");
        }
        Ok(())
    }
}

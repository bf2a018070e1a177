//! Pub/Sub port - abstraction over pub/sub backends.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// Message received from a channel.
#[derive(Debug, Clone)]
pub struct PubSubMessage {
    pub channel: String,
    pub payload: String,
}

/// Handler for incoming messages.
pub type MessageHandler =
    Box<dyn Fn(PubSubMessage) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Box an async closure into a [`MessageHandler`].
pub fn handler<F, Fut>(f: F) -> MessageHandler
where
    F: Fn(PubSubMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move |msg| Box::pin(f(msg)))
}

/// Told `false` when a subscription loses its transport and `true` once it is
/// delivering again.
pub type StatusHandler = Box<dyn Fn(bool) + Send + Sync>;

/// Handle to one subscription, for [`PubSub::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Pub/Sub trait - abstraction over pub/sub backends.
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Publish a message to a channel.
    async fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError>;

    /// Subscribe to a channel, reporting connection changes to `on_status`.
    ///
    /// `on_status(false)` is also called when the subscription is cancelled.
    async fn subscribe_with_status(
        &self,
        channel: &str,
        handler: MessageHandler,
        on_status: StatusHandler,
    ) -> Result<SubscriptionId, PubSubError>;

    /// Subscribe to a channel with a handler.
    async fn subscribe(
        &self,
        channel: &str,
        handler: MessageHandler,
    ) -> Result<SubscriptionId, PubSubError> {
        self.subscribe_with_status(channel, handler, Box::new(|_: bool| {}))
            .await
    }

    /// Stop a single subscription. Unknown ids are ignored.
    async fn cancel(&self, id: SubscriptionId) -> Result<(), PubSubError>;

    /// Stop every subscription on a channel.
    async fn unsubscribe(&self, channel: &str) -> Result<(), PubSubError>;
}

/// Pub/Sub errors.
#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    #[error("Failed to publish: {0}")]
    PublishError(String),

    #[error("Failed to subscribe: {0}")]
    SubscribeError(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Malformed payload: {0}")]
    Payload(String),
}

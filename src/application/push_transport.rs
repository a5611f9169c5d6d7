// Transport trait for server push subscriptions
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Message bodies received on one subscription. The stream ends when the
/// connection closes.
pub type MessageStream = BoxStream<'static, anyhow::Result<String>>;

#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Opens a fresh connection subscribed to `topic`.
    async fn subscribe(&self, topic: &str) -> anyhow::Result<MessageStream>;
}

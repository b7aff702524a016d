//! The uniform adapter surface the Agent Loop drives (spec.md §6.2).

use async_trait::async_trait;
use vigil_core::Message;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns only messages not previously returned.
    async fn poll(&mut self) -> anyhow::Result<Vec<Message>>;

    /// Returns true iff the transport accepted the message.
    async fn send(&mut self, recipient: &str, text: &str) -> anyhow::Result<bool>;

    /// Flush adapter-side state.
    async fn close(&mut self) -> anyhow::Result<()>;
}

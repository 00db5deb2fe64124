//! Trait seams between the dispatch engine and concrete channels.

use async_trait::async_trait;

use crate::error::Result;

/// Sends one message to one recipient chat.
///
/// Implemented by the Telegram client; the dispatcher only sees this
/// contract so fan-out logic can be tested against a mock.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()>;
}

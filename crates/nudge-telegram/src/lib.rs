//! Telegram Bot channel — REST API for sending, long polling for updates.
//!
//! Only the three endpoints the bot needs: `getMe` (startup credential
//! check), `sendMessage` (delivery), and `getUpdates` (inbound commands).

pub mod polling;

use async_trait::async_trait;
use nudge_core::error::{NudgeError, Result};
use nudge_core::traits::Delivery;
use serde::Deserialize;
use std::time::Duration;

pub use polling::UpdateStream;

/// Bound on a single delivery call.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Server-side long-poll window for getUpdates.
const POLL_SECS: u64 = 30;

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: format!("https://api.telegram.org/bot{token}"),
        }
    }

    /// Verify the token and return the bot identity (`getMe`).
    pub async fn get_me(&self) -> Result<BotIdentity> {
        let response = self
            .client
            .get(format!("{}/getMe", self.base))
            .timeout(SEND_TIMEOUT)
            .send()
            .await
            .map_err(|e| NudgeError::AuthFailed(format!("getMe failed: {e}")))?;

        let body: ApiResponse<BotIdentity> = response
            .json()
            .await
            .map_err(|e| NudgeError::AuthFailed(format!("Invalid getMe response: {e}")))?;
        body.into_result()
            .map_err(|desc| NudgeError::AuthFailed(format!("Token rejected: {desc}")))
    }

    /// Send one text message to one chat (`sendMessage`).
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = serde_json::json!({ "chat_id": chat_id, "text": text });

        let response = self
            .client
            .post(format!("{}/sendMessage", self.base))
            .timeout(SEND_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| NudgeError::delivery(format!("sendMessage failed: {e}")))?;

        let status = response.status();
        let body: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| NudgeError::delivery(format!("Invalid sendMessage response: {e}")))?;
        body.into_result()
            .map(|_| ())
            .map_err(|desc| NudgeError::delivery(format!("Telegram {status}: {desc}")))
    }

    /// Fetch inbound updates past `offset` (`getUpdates`, long poll).
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let response = self
            .client
            .get(format!("{}/getUpdates", self.base))
            .timeout(Duration::from_secs(POLL_SECS + 10))
            .query(&[("offset", offset), ("timeout", POLL_SECS as i64)])
            .send()
            .await
            .map_err(|e| NudgeError::delivery(format!("getUpdates failed: {e}")))?;

        let body: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .map_err(|e| NudgeError::delivery(format!("Invalid getUpdates response: {e}")))?;
        body.into_result()
            .map_err(|desc| NudgeError::delivery(format!("getUpdates rejected: {desc}")))
    }
}

#[async_trait]
impl Delivery for TelegramClient {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }
}

// --- Telegram API types ---

/// Standard Bot API envelope: `{"ok": true, "result": ...}`.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the envelope, yielding the API's description on failure.
    pub fn into_result(self) -> std::result::Result<T, String> {
        if self.ok {
            self.result.ok_or_else(|| "ok response without result".into())
        } else {
            Err(self.description.unwrap_or_else(|| "no description".into()))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_me_envelope() {
        let raw = r#"{"ok":true,"result":{"id":42,"is_bot":true,"first_name":"Nudge","username":"nudge_bot"}}"#;
        let parsed: ApiResponse<BotIdentity> = serde_json::from_str(raw).unwrap();
        let me = parsed.into_result().unwrap();
        assert_eq!(me.id, 42);
        assert_eq!(me.username.as_deref(), Some("nudge_bot"));
    }

    #[test]
    fn test_error_envelope_surfaces_description() {
        let raw = r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;
        let parsed: ApiResponse<BotIdentity> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_result().unwrap_err(), "Unauthorized");
    }

    #[test]
    fn test_update_parsing() {
        let raw = r#"{"ok":true,"result":[
            {"update_id":7,"message":{"message_id":1,"chat":{"id":-100,"type":"group"},
             "from":{"id":9,"is_bot":false,"username":"alice"},"text":"/start"}},
            {"update_id":8,"edited_message":{"message_id":2,"chat":{"id":-100,"type":"group"}}}
        ]}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let updates = parsed.into_result().unwrap();
        assert_eq!(updates.len(), 2);
        let first = updates[0].message.as_ref().unwrap();
        assert_eq!(first.chat.id, -100);
        assert_eq!(first.text.as_deref(), Some("/start"));
        assert!(updates[1].message.is_none());
    }
}

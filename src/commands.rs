//! Inbound command surface: /start, /stop, /now.
//!
//! Every handler error is caught here — the sender gets a generic failure
//! reply and the loop keeps running.

use std::sync::Arc;
use tokio::sync::Mutex;

use nudge_core::Result;
use nudge_scheduler::Dispatcher;
use nudge_store::SubscriberStore;
use nudge_telegram::{TelegramClient, TelegramMessage};

const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Subscribe,
    Unsubscribe,
    SendNow,
}

/// Parse the leading bot command from a message, tolerating the
/// `@botname` suffix Telegram appends in group chats.
pub fn parse_command(text: &str) -> Option<Command> {
    let first = text.trim().split_whitespace().next()?;
    let name = first.strip_prefix('/')?.split('@').next()?;
    match name {
        "start" => Some(Command::Subscribe),
        "stop" => Some(Command::Unsubscribe),
        "now" => Some(Command::SendNow),
        _ => None,
    }
}

/// Handle one inbound message. Non-commands and unknown commands are ignored.
pub async fn handle_message(
    message: &TelegramMessage,
    client: &TelegramClient,
    store: &Arc<Mutex<SubscriberStore>>,
    dispatcher: &Dispatcher<TelegramClient>,
) {
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let Some(command) = parse_command(text) else {
        return;
    };

    let chat_id = message.chat.id;
    let result = match command {
        Command::Subscribe => subscribe(chat_id, client, store).await,
        Command::Unsubscribe => unsubscribe(chat_id, client, store).await,
        Command::SendNow => send_now(chat_id, dispatcher).await,
    };

    if let Err(e) = result {
        tracing::error!("Command {text:?} from chat {chat_id} failed: {e}");
        let _ = client.send_message(chat_id, GENERIC_FAILURE).await;
    }
}

async fn subscribe(
    chat_id: i64,
    client: &TelegramClient,
    store: &Arc<Mutex<SubscriberStore>>,
) -> Result<()> {
    let added = store.lock().await.add(chat_id);
    let reply = if added {
        "Subscribed — you will now receive the scheduled nudges. 🎉"
    } else {
        "You are already subscribed."
    };
    client.send_message(chat_id, reply).await
}

async fn unsubscribe(
    chat_id: i64,
    client: &TelegramClient,
    store: &Arc<Mutex<SubscriberStore>>,
) -> Result<()> {
    let removed = store.lock().await.remove(chat_id);
    let reply = if removed {
        "Unsubscribed — no more nudges. 🙏"
    } else {
        "You were not subscribed."
    };
    client.send_message(chat_id, reply).await
}

/// Immediate trigger: one message to the caller only, bypassing the store.
/// Per-recipient delivery failures are already logged by the dispatcher.
async fn send_now(chat_id: i64, dispatcher: &Dispatcher<TelegramClient>) -> Result<()> {
    dispatcher.dispatch_single(chat_id).await;
    Ok(())
}

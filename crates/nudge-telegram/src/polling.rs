//! Long-polling update loop — returns a stream of inbound messages.
//! Transport errors back off exponentially (capped at 60s) and the loop
//! keeps polling; only a dropped receiver stops it.

use futures::stream::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use nudge_core::error::Result;

use crate::{TelegramClient, TelegramMessage, Update};

impl TelegramClient {
    /// Start the getUpdates loop on a background task.
    pub fn start_polling(&self) -> UpdateStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.clone();

        tokio::spawn(poll_loop(
            move |offset| {
                let client = client.clone();
                async move { client.get_updates(offset).await }
            },
            tx,
        ));

        UpdateStream { rx }
    }
}

/// The poll loop itself, generic over the fetch call so tests can drive it.
async fn poll_loop<F, Fut>(mut fetch: F, tx: mpsc::UnboundedSender<TelegramMessage>)
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<Vec<Update>>>,
{
    let mut offset: i64 = 0;
    let mut backoff_secs: u64 = 5;

    loop {
        match fetch(offset).await {
            Ok(updates) => {
                backoff_secs = 5;
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let Some(message) = update.message else {
                        continue;
                    };
                    if tx.send(message).is_err() {
                        tracing::info!("Update stream closed (receiver dropped)");
                        return;
                    }
                }
            }
            Err(e) => {
                // Errors never send, so check for a gone receiver here too.
                if tx.is_closed() {
                    tracing::info!("Update stream closed (receiver dropped)");
                    return;
                }
                tracing::warn!("Polling error: {e}, retrying in {backoff_secs}s...");
                tokio::time::sleep(tokio::time::Duration::from_secs(backoff_secs)).await;
                backoff_secs = (backoff_secs * 2).min(60);
            }
        }
    }
}

/// Stream of inbound Telegram messages.
pub struct UpdateStream {
    rx: mpsc::UnboundedReceiver<TelegramMessage>,
}

impl Stream for UpdateStream {
    type Item = TelegramMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Unpin for UpdateStream {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chat;
    use futures::StreamExt;
    use nudge_core::error::NudgeError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn message(text: &str) -> TelegramMessage {
        TelegramMessage {
            chat: Chat { id: 1 },
            from: None,
            text: Some(text.into()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_on_dropped_receiver_while_erroring() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let result = tokio::time::timeout(
            Duration::from_secs(600),
            poll_loop(|_| async { Err(NudgeError::delivery("provider down")) }, tx),
        )
        .await;
        assert!(result.is_ok(), "loop must exit once the receiver is gone");
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_forwards_messages_and_acknowledges_offset() {
        let offsets = Arc::new(Mutex::new(Vec::new()));
        let served = Arc::new(AtomicBool::new(false));

        let (tx, rx) = mpsc::unbounded_channel();
        let mut stream = UpdateStream { rx };

        let offsets_in_fetch = offsets.clone();
        tokio::spawn(poll_loop(
            move |offset| {
                offsets_in_fetch.lock().unwrap().push(offset);
                let first = !served.swap(true, Ordering::SeqCst);
                async move {
                    if first {
                        Ok(vec![
                            Update {
                                update_id: 7,
                                message: Some(message("/start")),
                            },
                            // No message payload — must be skipped, still acked.
                            Update {
                                update_id: 8,
                                message: None,
                            },
                        ])
                    } else {
                        futures::future::pending().await
                    }
                }
            },
            tx,
        ));

        let received = stream.next().await.expect("one message forwarded");
        assert_eq!(received.text.as_deref(), Some("/start"));

        // Give the loop a chance to issue the follow-up poll.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*offsets.lock().unwrap(), vec![0, 9]);
    }
}

//! Fan-out dispatch: one message, every current subscriber, failures isolated.

use std::sync::Arc;
use tokio::sync::Mutex;

use nudge_core::traits::Delivery;
use nudge_store::{MessagePool, SubscriberStore};

/// Per-dispatch outcome counts. Logged, never persisted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Composes one message and delivers it to the resolved audience.
pub struct Dispatcher<D: Delivery> {
    delivery: Arc<D>,
    store: Arc<Mutex<SubscriberStore>>,
    pool: MessagePool,
    mention: String,
    /// Fixed recipient override: when set, fan-out is disabled entirely.
    override_chat: Option<i64>,
}

impl<D: Delivery> Dispatcher<D> {
    pub fn new(
        delivery: Arc<D>,
        store: Arc<Mutex<SubscriberStore>>,
        pool: MessagePool,
        mention: String,
        override_chat: Option<i64>,
    ) -> Self {
        Self {
            delivery,
            store,
            pool,
            mention,
            override_chat,
        }
    }

    /// Random body plus the configured footer, separated by a blank line.
    pub fn compose(&self) -> String {
        format!("{}\n\n{}", self.pool.pick(), self.mention)
    }

    /// Scheduled path: deliver one message to the whole audience.
    /// An empty audience is not a failure. Never propagates delivery errors.
    pub async fn dispatch_scheduled(&self) -> DispatchSummary {
        let targets = match self.override_chat {
            Some(id) => vec![id],
            None => self.store.lock().await.snapshot(),
        };
        if targets.is_empty() {
            tracing::info!("No subscribers registered, nothing to send");
            return DispatchSummary::default();
        }

        let text = self.compose();
        self.deliver_all(&targets, &text).await
    }

    /// Immediate path: deliver one message to the calling chat only,
    /// without touching the subscriber store. The fixed override, when
    /// configured, redirects this too.
    pub async fn dispatch_single(&self, chat_id: i64) -> DispatchSummary {
        let target = self.override_chat.unwrap_or(chat_id);
        let text = self.compose();
        self.deliver_all(&[target], &text).await
    }

    async fn deliver_all(&self, targets: &[i64], text: &str) -> DispatchSummary {
        let sends = targets.iter().map(|&chat_id| {
            let delivery = self.delivery.clone();
            async move { (chat_id, delivery.send(chat_id, text).await) }
        });
        let results = futures::future::join_all(sends).await;

        let mut summary = DispatchSummary {
            attempted: targets.len(),
            ..Default::default()
        };
        for (chat_id, result) in results {
            match result {
                Ok(()) => {
                    tracing::info!("Message sent to {chat_id}");
                    summary.delivered += 1;
                }
                Err(e) => {
                    tracing::warn!("Delivery to {chat_id} failed: {e}");
                    summary.failed += 1;
                }
            }
        }
        tracing::info!(
            "Dispatch complete: {}/{} delivered",
            summary.delivered,
            summary.attempted
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nudge_core::error::{NudgeError, Result};
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    struct MockDelivery {
        fail_for: HashSet<i64>,
        calls: StdMutex<Vec<i64>>,
    }

    impl MockDelivery {
        fn new(fail_for: &[i64]) -> Arc<Self> {
            Arc::new(Self {
                fail_for: fail_for.iter().copied().collect(),
                calls: StdMutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<i64> {
            let mut calls = self.calls.lock().unwrap().clone();
            calls.sort_unstable();
            calls
        }
    }

    #[async_trait]
    impl Delivery for MockDelivery {
        async fn send(&self, chat_id: i64, _text: &str) -> Result<()> {
            self.calls.lock().unwrap().push(chat_id);
            if self.fail_for.contains(&chat_id) {
                return Err(NudgeError::delivery(format!("rejected {chat_id}")));
            }
            Ok(())
        }
    }

    fn empty_store(dir: &TempDir) -> Arc<Mutex<SubscriberStore>> {
        Arc::new(Mutex::new(SubscriberStore::open(
            dir.path().join("subscribers.json"),
        )))
    }

    fn dispatcher(
        delivery: Arc<MockDelivery>,
        store: Arc<Mutex<SubscriberStore>>,
        override_chat: Option<i64>,
    ) -> Dispatcher<MockDelivery> {
        Dispatcher::new(
            delivery,
            store,
            MessagePool::fallback(),
            "@team".into(),
            override_chat,
        )
    }

    #[tokio::test]
    async fn test_empty_audience_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let delivery = MockDelivery::new(&[]);
        let d = dispatcher(delivery.clone(), empty_store(&dir), None);

        let summary = d.dispatch_scheduled().await;
        assert_eq!(summary, DispatchSummary::default());
        assert!(delivery.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let dir = TempDir::new().unwrap();
        let store = empty_store(&dir);
        {
            let mut s = store.lock().await;
            s.add(1);
            s.add(2);
            s.add(3);
        }
        let delivery = MockDelivery::new(&[2]);
        let d = dispatcher(delivery.clone(), store, None);

        let summary = d.dispatch_scheduled().await;
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.delivered, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(delivery.calls(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_compose_is_body_blank_line_footer() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(MockDelivery::new(&[]), empty_store(&dir), None);

        let pool = MessagePool::fallback();
        for _ in 0..10 {
            let text = d.compose();
            let (body, footer) = text.rsplit_once("\n\n").unwrap();
            assert!(pool.contains(body));
            assert_eq!(footer, "@team");
        }
    }

    #[tokio::test]
    async fn test_single_dispatch_never_touches_store() {
        let dir = TempDir::new().unwrap();
        let store = empty_store(&dir);
        let delivery = MockDelivery::new(&[]);
        let d = dispatcher(delivery.clone(), store.clone(), None);

        let summary = d.dispatch_single(77).await;
        assert_eq!(summary.delivered, 1);
        assert_eq!(delivery.calls(), vec![77]);
        assert!(store.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_override_redirects_both_paths() {
        let dir = TempDir::new().unwrap();
        let store = empty_store(&dir);
        store.lock().await.add(1);
        let delivery = MockDelivery::new(&[]);
        let d = dispatcher(delivery.clone(), store, Some(999));

        let summary = d.dispatch_scheduled().await;
        assert_eq!(summary.attempted, 1);
        let summary = d.dispatch_single(77).await;
        assert_eq!(summary.attempted, 1);
        assert_eq!(delivery.calls(), vec![999, 999]);
    }

    #[tokio::test]
    async fn test_failed_single_dispatch_completes() {
        let dir = TempDir::new().unwrap();
        let delivery = MockDelivery::new(&[77]);
        let d = dispatcher(delivery, empty_store(&dir), None);

        let summary = d.dispatch_single(77).await;
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.delivered, 0);
    }
}

//! The wait-and-fire loop.

use chrono::Utc;
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;

use nudge_core::traits::Delivery;

use crate::dispatch::Dispatcher;
use crate::schedule::{next_fire, ScheduleEntry};

/// Recheck interval when no valid schedule entries exist.
const EMPTY_SCHEDULE_RECHECK: Duration = Duration::from_secs(300);

/// Continuously running scheduler: recompute the next fire instant,
/// sleep until it, dispatch, repeat.
pub struct SchedulerEngine<D: Delivery> {
    entries: Vec<ScheduleEntry>,
    tz: Tz,
    dispatcher: Arc<Dispatcher<D>>,
}

impl<D: Delivery> SchedulerEngine<D> {
    pub fn new(entries: Vec<ScheduleEntry>, tz: Tz, dispatcher: Arc<Dispatcher<D>>) -> Self {
        Self {
            entries,
            tz,
            dispatcher,
        }
    }

    /// Run forever. Recomputing each cycle (instead of a fixed-interval
    /// timer) keeps the loop correct across DST shifts and restarts; a
    /// missed instant during downtime is not caught up.
    pub async fn run(self) {
        for entry in &self.entries {
            tracing::info!(
                "Scheduled daily at {:02}:{:02} ({})",
                entry.hour,
                entry.minute,
                self.tz
            );
        }

        loop {
            let now = Utc::now();
            match next_fire(now, &self.entries, self.tz) {
                Some(at) => {
                    let wait = (at - now).to_std().unwrap_or(Duration::ZERO);
                    tracing::info!("Next dispatch at {}", at.with_timezone(&self.tz));
                    tokio::time::sleep(wait).await;
                    self.dispatcher.dispatch_scheduled().await;
                }
                None => {
                    tracing::warn!(
                        "No valid schedule times configured, rechecking in {}s",
                        EMPTY_SCHEDULE_RECHECK.as_secs()
                    );
                    tokio::time::sleep(EMPTY_SCHEDULE_RECHECK).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Timelike;
    use chrono_tz::Tz;
    use nudge_core::error::Result;
    use nudge_store::{MessagePool, SubscriberStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    struct CountingDelivery {
        sends: AtomicUsize,
    }

    #[async_trait]
    impl Delivery for CountingDelivery {
        async fn send(&self, _chat_id: i64, _text: &str) -> Result<()> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn dispatcher(
        dir: &TempDir,
        delivery: Arc<CountingDelivery>,
    ) -> Arc<Dispatcher<CountingDelivery>> {
        let mut store = SubscriberStore::open(dir.path().join("subscribers.json"));
        store.add(1);
        Arc::new(Dispatcher::new(
            delivery,
            Arc::new(Mutex::new(store)),
            MessagePool::fallback(),
            "@team".into(),
            None,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_fires_when_the_instant_arrives() {
        let dir = TempDir::new().unwrap();
        let delivery = Arc::new(CountingDelivery {
            sends: AtomicUsize::new(0),
        });

        // A target ~12h out, so exactly one fire lands inside a 13h window.
        let target = Utc::now() + chrono::Duration::hours(12);
        let entry = ScheduleEntry {
            hour: target.hour(),
            minute: target.minute(),
        };
        let engine = SchedulerEngine::new(vec![entry], Tz::UTC, dispatcher(&dir, delivery.clone()));
        let handle = tokio::spawn(engine.run());

        tokio::time::sleep(Duration::from_secs(13 * 3600)).await;
        assert_eq!(delivery.sends.load(Ordering::SeqCst), 1);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_schedule_rechecks_without_dispatching() {
        let dir = TempDir::new().unwrap();
        let delivery = Arc::new(CountingDelivery {
            sends: AtomicUsize::new(0),
        });

        let engine = SchedulerEngine::new(vec![], Tz::UTC, dispatcher(&dir, delivery.clone()));
        let handle = tokio::spawn(engine.run());

        // Several recheck intervals pass: no sends, no exit, no busy loop.
        tokio::time::sleep(EMPTY_SCHEDULE_RECHECK * 4).await;
        assert_eq!(delivery.sends.load(Ordering::SeqCst), 0);
        assert!(!handle.is_finished());
        handle.abort();
    }
}

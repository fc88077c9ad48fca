//! Periodic price notifications.
//!
//! One fixed-period tick drives one pass over a registry snapshot. Within a
//! pass chats are served one after another, and after each send attempt the
//! pass sleeps for that chat's interval before moving on, whether or not the
//! send went through. Chats skipped before sending do not sleep. A chat's interval is
//! therefore the gap the scheduler leaves before the *next* chat in the same
//! pass, not an independent per-chat timer: sends are globally serialized.
//!
//! Passes never overlap. A tick that comes due while a pass is still sleeping
//! is delayed until the pass ends.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::ChatId,
    formatting::{escape_html, format_duration, format_usd},
    messaging::port::MessagingPort,
    price::{cache::PriceCache, CoinId, PriceError},
    registry::{NotificationRegistry, NotificationSetting},
};

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Period between passes.
    pub tick: Duration,
    /// Coin every notification reports on.
    pub coin: CoinId,
    /// Prices below this are treated as placeholder values and never sent.
    pub sanity_floor: f64,
}

/// What happened to each enabled chat during one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub sent: usize,
    pub rate_limited: usize,
    pub fetch_failed: usize,
    pub below_floor: usize,
    pub send_failed: usize,
}

enum ChatOutcome {
    Sent,
    RateLimited,
    FetchFailed,
    BelowFloor,
    SendFailed,
}

#[derive(Clone)]
pub struct NotificationScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    cfg: SchedulerConfig,
    registry: Arc<NotificationRegistry>,
    cache: Arc<PriceCache>,
    messenger: Arc<dyn MessagingPort>,
}

impl NotificationScheduler {
    pub fn new(
        cfg: SchedulerConfig,
        registry: Arc<NotificationRegistry>,
        cache: Arc<PriceCache>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                cfg,
                registry,
                cache,
                messenger,
            }),
        }
    }

    /// Run the tick loop on a background task until `cancel` fires.
    pub fn spawn(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run(cancel).await })
    }

    pub async fn run(&self, cancel: CancellationToken) {
        let period = self.inner.cfg.tick;
        let mut tick = interval_at(Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            coin = %self.inner.cfg.coin,
            tick = %format_duration(period),
            "notification scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {
                    let report = self.run_pass(&cancel).await;
                    if report != PassReport::default() {
                        tracing::info!(?report, "notification pass finished");
                    }
                }
            }
        }

        tracing::info!("notification scheduler stopped");
    }

    /// One pass over every enabled chat. Returns early if `cancel` fires.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> PassReport {
        let mut report = PassReport::default();

        for (chat_id, setting) in self.inner.registry.snapshot().await {
            if cancel.is_cancelled() {
                break;
            }
            if !setting.enabled {
                continue;
            }

            match self.notify_chat(chat_id, setting).await {
                ChatOutcome::RateLimited => report.rate_limited += 1,
                ChatOutcome::FetchFailed => report.fetch_failed += 1,
                ChatOutcome::BelowFloor => report.below_floor += 1,
                outcome @ (ChatOutcome::Sent | ChatOutcome::SendFailed) => {
                    if matches!(outcome, ChatOutcome::Sent) {
                        report.sent += 1;
                    } else {
                        report.send_failed += 1;
                    }
                    // Sends are fire-and-forget: pace after every attempt.
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = sleep(setting.interval) => {}
                    }
                }
            }
        }

        report
    }

    async fn notify_chat(&self, chat_id: ChatId, setting: NotificationSetting) -> ChatOutcome {
        let cfg = &self.inner.cfg;

        let quote = match self.inner.cache.get(&cfg.coin).await {
            Ok(q) => q,
            Err(e @ PriceError::RateLimited(_)) => {
                tracing::debug!(chat_id = chat_id.0, error = %e, "rate limited, skipping notification");
                return ChatOutcome::RateLimited;
            }
            Err(e) => {
                tracing::warn!(chat_id = chat_id.0, coin = %cfg.coin, error = %e, "price fetch failed, skipping notification");
                return ChatOutcome::FetchFailed;
            }
        };

        if quote.price_usd < cfg.sanity_floor {
            tracing::warn!(
                chat_id = chat_id.0,
                price = quote.price_usd,
                floor = cfg.sanity_floor,
                "price below sanity floor, skipping notification"
            );
            return ChatOutcome::BelowFloor;
        }

        let msg = format!(
            "⏰ <b>{} Price Update</b>\n💰 {}\n📊 Interval: {}",
            escape_html(&cfg.coin.ticker()),
            format_usd(quote.price_usd),
            format_duration(setting.interval),
        );

        match self.inner.messenger.send_html(chat_id, &msg).await {
            Ok(_) => ChatOutcome::Sent,
            Err(e) => {
                tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send price notification");
                ChatOutcome::SendFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        price::adapter::PriceAdapter,
        testing::{FakeMessenger, FakeSource},
    };

    struct Harness {
        registry: Arc<NotificationRegistry>,
        messenger: Arc<FakeMessenger>,
        source: Arc<FakeSource>,
        scheduler: NotificationScheduler,
    }

    fn harness(source: FakeSource) -> Harness {
        let source = Arc::new(source);
        let primary = Arc::new(FakeSource::new("primary").only(&[]));
        let cache = Arc::new(PriceCache::new(
            PriceAdapter::new(primary, source.clone()),
            Duration::from_secs(180),
        ));
        let registry = Arc::new(NotificationRegistry::new(Duration::from_secs(120)));
        let messenger = Arc::new(FakeMessenger::default());
        let scheduler = NotificationScheduler::new(
            SchedulerConfig {
                tick: Duration::from_secs(30),
                coin: CoinId::parse("zcash").unwrap(),
                sanity_floor: 0.1,
            },
            registry.clone(),
            cache,
            messenger.clone(),
        );
        Harness {
            registry,
            messenger,
            source,
            scheduler,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pass_is_paced_by_each_chats_interval() {
        let h = harness(FakeSource::new("gecko").with_price("zcash", 35.5));
        h.registry.set_interval(ChatId(1), Duration::from_secs(30)).await;
        h.registry.set_interval(ChatId(2), Duration::from_secs(60)).await;
        h.registry.enable(ChatId(1)).await;
        h.registry.enable(ChatId(2)).await;

        let start = Instant::now();
        let report = h.scheduler.run_pass(&CancellationToken::new()).await;

        assert_eq!(report.sent, 2);
        assert!(start.elapsed() >= Duration::from_secs(90));

        let sends = h.messenger.sends.lock().unwrap();
        assert_eq!(sends[0].0, ChatId(1));
        assert_eq!(sends[1].0, ChatId(2));
        assert!(sends[1].2 - sends[0].2 >= Duration::from_secs(30));
        assert!(sends[0].1.contains("ZEC Price Update"));
        assert!(sends[0].1.contains("$35.50"));
        assert!(sends[1].1.contains("Interval: 1m"));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_chats_are_skipped() {
        let h = harness(FakeSource::new("gecko").with_price("zcash", 35.5));
        h.registry.set_interval(ChatId(1), Duration::from_secs(30)).await;
        h.registry.enable(ChatId(2)).await;

        let report = h.scheduler.run_pass(&CancellationToken::new()).await;
        assert_eq!(report.sent, 1);
        assert_eq!(h.messenger.sent_to(), vec![ChatId(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn price_below_floor_sends_nothing() {
        let h = harness(FakeSource::new("gecko").with_price("zcash", 0.0));
        h.registry.enable(ChatId(1)).await;

        let start = Instant::now();
        let report = h.scheduler.run_pass(&CancellationToken::new()).await;

        assert_eq!(report.below_floor, 1);
        assert!(h.messenger.sent_to().is_empty());
        // No send means no pacing sleep either.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_and_failed_fetches_are_skipped_quietly() {
        let h = harness(
            FakeSource::new("gecko").failing(PriceError::RateLimited("gecko".into())),
        );
        h.registry.enable(ChatId(1)).await;
        h.registry.enable(ChatId(2)).await;

        let report = h.scheduler.run_pass(&CancellationToken::new()).await;
        assert_eq!(report.rate_limited, 2);
        assert!(h.messenger.sent_to().is_empty());

        let h = harness(FakeSource::new("gecko").failing(PriceError::Unavailable("x".into())));
        h.registry.enable(ChatId(1)).await;
        let report = h.scheduler.run_pass(&CancellationToken::new()).await;
        assert_eq!(report.fetch_failed, 1);
        assert!(h.messenger.sent_to().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn send_failure_still_paces_before_next_chat() {
        let h = harness(FakeSource::new("gecko").with_price("zcash", 35.5));
        h.registry.set_interval(ChatId(1), Duration::from_secs(60)).await;
        h.registry.enable(ChatId(1)).await;
        h.registry.enable(ChatId(2)).await;
        h.messenger.fail_for.lock().unwrap().push(ChatId(1));

        let start = Instant::now();
        let report = h.scheduler.run_pass(&CancellationToken::new()).await;
        assert_eq!(report.send_failed, 1);
        assert_eq!(report.sent, 1);
        assert_eq!(h.messenger.sent_to(), vec![ChatId(2)]);

        let sends = h.messenger.sends.lock().unwrap();
        assert!(sends[0].2 - start >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn one_pass_shares_a_single_fetch_through_the_cache() {
        let h = harness(FakeSource::new("gecko").with_price("zcash", 35.5));
        for id in 1..=3 {
            h.registry.set_interval(ChatId(id), Duration::from_secs(30)).await;
            h.registry.enable(ChatId(id)).await;
        }

        h.scheduler.run_pass(&CancellationToken::new()).await;
        assert_eq!(h.source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_ticks_until_cancelled() {
        let h = harness(FakeSource::new("gecko").with_price("zcash", 35.5));
        h.registry.set_interval(ChatId(1), Duration::from_secs(30)).await;
        h.registry.enable(ChatId(1)).await;

        let cancel = CancellationToken::new();
        let handle = h.scheduler.spawn(cancel.clone());

        // Nothing before the first tick.
        sleep(Duration::from_secs(29)).await;
        assert!(h.messenger.sent_to().is_empty());

        sleep(Duration::from_secs(2)).await;
        assert_eq!(h.messenger.sent_to(), vec![ChatId(1)]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_pacing_sleep() {
        let h = harness(FakeSource::new("gecko").with_price("zcash", 35.5));
        h.registry.set_interval(ChatId(1), Duration::from_secs(3600)).await;
        h.registry.enable(ChatId(1)).await;
        h.registry.enable(ChatId(2)).await;

        let cancel = CancellationToken::new();
        let scheduler = h.scheduler.clone();
        let token = cancel.clone();
        let pass = tokio::spawn(async move { scheduler.run_pass(&token).await });

        sleep(Duration::from_secs(5)).await;
        cancel.cancel();
        let report = pass.await.unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(h.messenger.sent_to(), vec![ChatId(1)]);
    }
}

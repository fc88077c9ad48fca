use std::sync::Arc;

use teloxide::Bot;
use tokio_util::sync::CancellationToken;

use ptb_core::{
    config::Config,
    messaging::port::MessagingPort,
    price::{adapter::PriceAdapter, cache::PriceCache},
    registry::NotificationRegistry,
    scheduler::NotificationScheduler,
};
use ptb_feeds::{BinanceTicker, CoinGeckoSimplePrice, MagicEdenCollections};
use ptb_telegram::{
    router::{run_polling, AppState},
    TelegramMessenger,
};

mod health;

#[tokio::main]
async fn main() -> Result<(), ptb_core::Error> {
    ptb_core::logging::init("ptb")?;

    let cfg = Arc::new(Config::load()?);

    let http = ptb_feeds::http_client(cfg.http_timeout)?;
    let adapter = PriceAdapter::new(
        Arc::new(BinanceTicker::new(http.clone(), cfg.binance_base_url.clone())),
        Arc::new(CoinGeckoSimplePrice::new(
            http.clone(),
            cfg.coingecko_base_url.clone(),
        )),
    );
    let prices = Arc::new(PriceCache::new(adapter, cfg.price_cache_ttl));
    let collections = Arc::new(MagicEdenCollections::new(
        http,
        cfg.magiceden_base_url.clone(),
    ));
    let registry = Arc::new(NotificationRegistry::new(cfg.notify_default_interval));

    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

    let cancel = CancellationToken::new();

    let scheduler = NotificationScheduler::new(
        cfg.scheduler_config(),
        registry.clone(),
        prices.clone(),
        messenger.clone(),
    );
    let scheduler_task = scheduler.spawn(cancel.clone());

    let health_task = {
        let cancel = cancel.clone();
        let port = cfg.port;
        tokio::spawn(async move {
            if let Err(e) = health::serve(port, cancel).await {
                tracing::error!(error = %e, "liveness server stopped");
            }
        })
    };

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
            }
            cancel.cancel();
        });
    }

    let state = Arc::new(AppState {
        cfg,
        messenger,
        registry,
        prices,
        collections,
    });

    let polled = run_polling(bot, state, cancel.clone()).await;

    // Polling ending for any reason takes the background tasks down with it.
    cancel.cancel();
    let _ = scheduler_task.await;
    let _ = health_task.await;

    polled.map_err(|e| ptb_core::Error::External(format!("telegram bot failed: {e:#}")))
}

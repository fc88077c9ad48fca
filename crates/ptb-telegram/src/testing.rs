//! Fakes shared by the handler and router tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{http::Uri, Json, Router};
use serde_json::{json, Value};

use ptb_core::{
    config::Config,
    domain::{ChatId, MessageId, MessageRef},
    messaging::port::MessagingPort,
    ports::{CollectionSource, PriceSource},
    price::{adapter::PriceAdapter, cache::PriceCache, CoinId, CollectionStats, CollectionSymbol, PriceError},
    registry::NotificationRegistry,
    Result,
};

use crate::router::AppState;

struct FakeSource {
    name: &'static str,
    result: std::result::Result<f64, PriceError>,
    calls: AtomicUsize,
}

impl FakeSource {
    fn new(name: &'static str, result: std::result::Result<f64, PriceError>) -> Self {
        Self {
            name,
            result,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PriceSource for FakeSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, coin: &CoinId) -> bool {
        coin.as_str() == "bitcoin"
    }

    async fn spot_usd(&self, _coin: &CoinId) -> std::result::Result<f64, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[derive(Default)]
pub(crate) struct FakeCollections {
    pub(crate) requested: Mutex<Vec<String>>,
}

#[async_trait]
impl CollectionSource for FakeCollections {
    async fn collection_stats(
        &self,
        symbol: &CollectionSymbol,
    ) -> std::result::Result<CollectionStats, PriceError> {
        self.requested.lock().unwrap().push(symbol.to_string());
        if symbol.as_str() != "mad_lads" {
            return Err(PriceError::NotFound(symbol.to_string()));
        }
        Ok(CollectionStats {
            symbol: symbol.clone(),
            floor_price_lamports: 98_500_000_000,
            listed_count: 412,
            volume_all: None,
        })
    }
}

struct NullMessenger;

#[async_trait]
impl MessagingPort for NullMessenger {
    async fn send_html(&self, chat_id: ChatId, _html: &str) -> Result<MessageRef> {
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(1),
        })
    }
}

fn test_config() -> Config {
    // Avoid Config::load() env dependency: hand-roll config.
    Config {
        telegram_bot_token: "x".to_string(),
        port: 8080,
        http_timeout: Duration::from_secs(10),
        binance_base_url: "http://unused".to_string(),
        coingecko_base_url: "http://unused".to_string(),
        magiceden_base_url: "http://unused".to_string(),
        price_cache_ttl: Duration::from_secs(180),
        notify_tick: Duration::from_secs(30),
        notify_default_interval: Duration::from_secs(120),
        notify_min_interval: Duration::from_secs(30),
        notify_coin: CoinId::parse("zcash").unwrap(),
        price_sanity_floor: 0.1,
    }
}

pub(crate) struct Fixture {
    pub(crate) state: AppState,
    pub(crate) collections: Arc<FakeCollections>,
}

pub(crate) fn fixture(
    primary: std::result::Result<f64, PriceError>,
    secondary: std::result::Result<f64, PriceError>,
) -> Fixture {
    let cfg = Arc::new(test_config());
    let adapter = PriceAdapter::new(
        Arc::new(FakeSource::new("primary", primary)),
        Arc::new(FakeSource::new("secondary", secondary)),
    );
    let collections = Arc::new(FakeCollections::default());
    let state = AppState {
        registry: Arc::new(NotificationRegistry::new(cfg.notify_default_interval)),
        prices: Arc::new(PriceCache::new(adapter, cfg.price_cache_ttl)),
        collections: collections.clone(),
        messenger: Arc::new(NullMessenger),
        cfg,
    };
    Fixture { state, collections }
}

pub(crate) fn ok_fixture() -> Fixture {
    fixture(Ok(50000.12), Ok(31.5))
}

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub(crate) async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

/// Minimal Bot API: `getMe` answers with a bot user, every other method
/// succeeds with an empty result. Counts requests per lowercased method name.
#[derive(Clone, Default)]
pub(crate) struct FakeBotApi {
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
}

impl FakeBotApi {
    pub(crate) fn router(&self) -> Router {
        let calls = self.calls.clone();
        Router::new().fallback(move |uri: Uri| {
            let calls = calls.clone();
            async move {
                let method = uri
                    .path()
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_lowercase();
                calls.lock().unwrap().push(method.clone());
                Json(bot_api_reply(&method))
            }
        })
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.as_str() == method)
            .count()
    }
}

fn bot_api_reply(method: &str) -> Value {
    match method {
        "getme" => json!({
            "ok": true,
            "result": {"id": 42, "is_bot": true, "first_name": "Price Bot", "username": "price_bot", "can_join_groups": true, "can_read_all_group_messages": false, "supports_inline_queries": false}
        }),
        "deletewebhook" => json!({"ok": true, "result": true}),
        _ => json!({"ok": true, "result": []}),
    }
}

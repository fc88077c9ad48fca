//! In-memory fakes shared by the core unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::port::MessagingPort,
    ports::PriceSource,
    price::{CoinId, PriceError},
    Result,
};

pub struct FakeSource {
    name: &'static str,
    only: Option<Vec<String>>,
    prices: HashMap<String, f64>,
    failure: Option<PriceError>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            only: None,
            prices: HashMap::new(),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Restrict `supports()` to the given coin ids.
    pub fn only(mut self, coins: &[&str]) -> Self {
        self.only = Some(coins.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_price(mut self, coin: &str, price: f64) -> Self {
        self.prices.insert(coin.to_string(), price);
        self
    }

    pub fn failing(mut self, err: PriceError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for FakeSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, coin: &CoinId) -> bool {
        match &self.only {
            Some(list) => list.iter().any(|c| c == coin.as_str()),
            None => true,
        }
    }

    async fn spot_usd(&self, coin: &CoinId) -> std::result::Result<f64, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        self.prices
            .get(coin.as_str())
            .copied()
            .ok_or_else(|| PriceError::NotFound(coin.to_string()))
    }
}

/// Records every send together with the (tokio) time it happened.
#[derive(Default)]
pub struct FakeMessenger {
    pub sends: Mutex<Vec<(ChatId, String, Instant)>>,
    pub fail_for: Mutex<Vec<ChatId>>,
}

impl FakeMessenger {
    pub fn sent_to(&self) -> Vec<ChatId> {
        self.sends.lock().unwrap().iter().map(|s| s.0).collect()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        if self.fail_for.lock().unwrap().contains(&chat_id) {
            return Err(Error::External("chat unavailable".to_string()));
        }
        let mut sends = self.sends.lock().unwrap();
        sends.push((chat_id, html.to_string(), Instant::now()));
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(sends.len() as i32),
        })
    }
}

//! Price model shared by the adapter, cache, scheduler and command handlers.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

pub mod adapter;
pub mod cache;

/// Ticker aliases accepted wherever a coin id is expected.
const COIN_ALIASES: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("zec", "zcash"),
    ("eth", "ethereum"),
    ("sol", "solana"),
];

/// Normalized coin identifier (CoinGecko-style id, e.g. `bitcoin`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CoinId(String);

impl CoinId {
    /// Trim + lowercase, then resolve ticker aliases (`BTC` -> `bitcoin`).
    ///
    /// Returns `None` for empty input or characters a coin id never contains.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim().to_lowercase();
        if s.is_empty()
            || !s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return None;
        }

        let id = COIN_ALIASES
            .iter()
            .find(|(alias, _)| *alias == s)
            .map(|(_, id)| (*id).to_string())
            .unwrap_or(s);
        Some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short display label: the known ticker, or the id upper-cased.
    pub fn ticker(&self) -> String {
        COIN_ALIASES
            .iter()
            .find(|(_, id)| *id == self.0)
            .map(|(alias, _)| alias.to_uppercase())
            .unwrap_or_else(|| self.0.to_uppercase())
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized NFT collection symbol (`" Mad Lads "` -> `mad_lads`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionSymbol(String);

impl CollectionSymbol {
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim().to_lowercase().replace(' ', "_");
        if s.is_empty() {
            return None;
        }
        Some(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A spot price as produced by the adapter. Never mutated after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceQuote {
    pub symbol: CoinId,
    pub price_usd: f64,
    pub source: &'static str,
    /// Monotonic fetch time; drives cache expiry.
    pub fetched_at: Instant,
    /// Wall-clock fetch time for display.
    pub as_of: DateTime<Utc>,
}

/// Lamports per SOL; collection floor prices are reported in lamports.
pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

#[derive(Clone, Debug, PartialEq)]
pub struct CollectionStats {
    pub symbol: CollectionSymbol,
    pub floor_price_lamports: i64,
    pub listed_count: u64,
    pub volume_all: Option<f64>,
}

impl CollectionStats {
    pub fn floor_price_sol(&self) -> f64 {
        self.floor_price_lamports as f64 / LAMPORTS_PER_SOL
    }
}

/// Failure taxonomy for price and collection lookups.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PriceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("rate limited by {0}")]
    RateLimited(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl PriceError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, price::CoinId, scheduler::SchedulerConfig, Result};

/// Typed runtime configuration, read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,

    // Liveness endpoint
    pub port: u16,

    // Upstream providers
    pub http_timeout: Duration,
    pub binance_base_url: String,
    pub coingecko_base_url: String,
    pub magiceden_base_url: String,

    // Price cache
    pub price_cache_ttl: Duration,

    // Notifications
    pub notify_tick: Duration,
    pub notify_default_interval: Duration,
    pub notify_min_interval: Duration,
    pub notify_coin: CoinId,
    pub price_sanity_floor: f64,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let telegram_bot_token =
            bot_token(env_str("TELEGRAM_TOKEN"), env_str("TELEGRAM_BOT_TOKEN"))?;

        let port = match env_str("PORT").and_then(non_empty) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("invalid PORT: {raw}")))?,
            None => 8080,
        };

        let http_timeout = Duration::from_secs(env_u64("HTTP_TIMEOUT_SECS").unwrap_or(10).max(1));
        let binance_base_url = env_url("BINANCE_BASE_URL", "https://api.binance.com");
        let coingecko_base_url = env_url("COINGECKO_BASE_URL", "https://api.coingecko.com");
        let magiceden_base_url =
            env_url("MAGICEDEN_BASE_URL", "https://api-mainnet.magiceden.dev");

        let price_cache_ttl = Duration::from_secs(env_u64("PRICE_CACHE_TTL_SECS").unwrap_or(180));

        let notify_tick = Duration::from_secs(env_u64("NOTIFY_TICK_SECS").unwrap_or(30).max(1));
        let notify_min_interval =
            Duration::from_secs(env_u64("NOTIFY_MIN_INTERVAL_SECS").unwrap_or(30));
        let notify_default_interval = Duration::from_secs(
            env_u64("NOTIFY_DEFAULT_INTERVAL_SECS").unwrap_or(120),
        )
        .max(notify_min_interval);

        let coin_raw = env_str("NOTIFY_COIN").unwrap_or_else(|| "zcash".to_string());
        let notify_coin = CoinId::parse(&coin_raw)
            .ok_or_else(|| Error::Config(format!("invalid NOTIFY_COIN: {coin_raw}")))?;

        let price_sanity_floor = env_f64("PRICE_SANITY_FLOOR").unwrap_or(0.1);

        Ok(Self {
            telegram_bot_token,
            port,
            http_timeout,
            binance_base_url,
            coingecko_base_url,
            magiceden_base_url,
            price_cache_ttl,
            notify_tick,
            notify_default_interval,
            notify_min_interval,
            notify_coin,
            price_sanity_floor,
        })
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick: self.notify_tick,
            coin: self.notify_coin.clone(),
            sanity_floor: self.price_sanity_floor,
        }
    }
}

fn bot_token(primary: Option<String>, fallback: Option<String>) -> Result<String> {
    primary
        .and_then(non_empty)
        .or_else(|| fallback.and_then(non_empty))
        .ok_or_else(|| Error::Config("TELEGRAM_TOKEN environment variable is required".to_string()))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_f64(key: &str) -> Option<f64> {
    env_str(key)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn env_url(key: &str, default: &str) -> String {
    env_str(key)
        .and_then(non_empty)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .trim_end_matches('/')
        .to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

use std::time::Duration;

use ptb_core::{
    domain::ChatId,
    formatting::{collection_display_name, escape_html, format_duration, format_usd},
    interval::parse_interval_at_least,
    price::{CoinId, CollectionSymbol, PriceError},
};

use crate::router::AppState;

pub const HINT: &str = "Type /start to see the list of commands 🚀";

const POPULAR: &[&str] = &[
    "mad_lads",
    "degods",
    "famous_fox_federation",
    "solana_monkey_business",
];

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Build the reply for one command message. Never fails: every error path
/// becomes a user-facing message.
pub async fn reply_to(state: &AppState, chat_id: ChatId, text: &str) -> String {
    let (cmd, arg) = parse_command(text);
    let coin = &state.cfg.notify_coin;

    match cmd.as_str() {
        "start" | "help" => help_text(state),

        "popular" => {
            let mut lines = vec!["🌟 <b>Popular collections:</b>\n".to_string()];
            for sym in POPULAR {
                lines.push(format!("• <code>{sym}</code> - {}", collection_display_name(sym)));
            }
            lines.join("\n")
        }

        "btc" => price_reply(state, "bitcoin").await,
        "zec" => price_reply(state, "zcash").await,
        "price" => {
            if arg.is_empty() {
                return "❌ Specify a coin\nExample: /price eth".to_string();
            }
            price_reply(state, &arg).await
        }

        "notify" | "notify_zec" => {
            let s = state.registry.enable(chat_id).await;
            tracing::info!(chat_id = chat_id.0, interval = ?s.interval, "notifications enabled");
            format!(
                "✅ {} notifications enabled!\nInterval: {}",
                escape_html(&coin.ticker()),
                format_duration(s.interval)
            )
        }

        "stop" => match state.registry.disable(chat_id).await {
            Some(_) => {
                tracing::info!(chat_id = chat_id.0, "notifications disabled");
                format!("⏹️ {} notifications stopped", escape_html(&coin.ticker()))
            }
            None => format!(
                "ℹ️ {} notifications were not enabled",
                escape_html(&coin.ticker())
            ),
        },

        "interval" => {
            if arg.is_empty() {
                return "❌ Specify an interval\nExamples: /interval 5, /interval 90s, /interval 1h"
                    .to_string();
            }
            match parse_interval_at_least(&arg, state.cfg.notify_min_interval) {
                Ok(d) => set_interval_reply(state, chat_id, d).await,
                Err(e) => format!("❌ {}", escape_html(&e.to_string())),
            }
        }

        "status" => match state.registry.get(chat_id).await {
            Some(s) => format!(
                "📊 {} notifications: {}\nInterval: {}",
                escape_html(&coin.ticker()),
                if s.enabled { "on" } else { "off" },
                format_duration(s.interval)
            ),
            None => format!(
                "📊 {} notifications: off\nInterval: {} (default)",
                escape_html(&coin.ticker()),
                format_duration(state.registry.default_interval())
            ),
        },

        "nft" => {
            let Some(symbol) = CollectionSymbol::parse(&arg) else {
                return "❌ Specify a collection symbol\nExample: /nft mad_lads".to_string();
            };
            nft_reply(state, &symbol).await
        }

        _ => HINT.to_string(),
    }
}

fn help_text(state: &AppState) -> String {
    let ticker = escape_html(&state.cfg.notify_coin.ticker());
    format!(
        "👋 <b>Crypto &amp; NFT Tracker Bot</b>\n\n\
<b>💰 Crypto:</b>\n\
/btc - Bitcoin price\n\
/zec - Zcash price\n\
/price &lt;coin&gt; - any coin (e.g. eth, solana)\n\
/notify - {ticker} price updates (default interval: {default})\n\
/interval &lt;time&gt; - change interval (5, 90s, 1h; min {min})\n\
/status - your notification settings\n\
/stop - stop updates\n\n\
<b>🎨 NFT collections:</b>\n\
/nft &lt;symbol&gt; - collection floor price\n\
/popular - popular collections",
        default = format_duration(state.registry.default_interval()),
        min = format_duration(state.cfg.notify_min_interval),
    )
}

async fn price_reply(state: &AppState, raw: &str) -> String {
    let Some(coin) = CoinId::parse(raw) else {
        return format!("❌ Unknown coin: {}", escape_html(raw.trim()));
    };

    match state.prices.get(&coin).await {
        Ok(q) => format!(
            "💰 <b>{}</b>: {}\n<i>via {}, {} UTC</i>",
            escape_html(&coin.ticker()),
            format_usd(q.price_usd),
            q.source,
            q.as_of.format("%H:%M")
        ),
        Err(PriceError::NotFound(_)) => {
            format!("❌ Unknown coin: {}", escape_html(coin.as_str()))
        }
        Err(e @ PriceError::RateLimited(_)) => {
            tracing::info!(%coin, error = %e, "on-demand price query rate limited");
            "⏳ Price provider is busy, try again in a minute.".to_string()
        }
        Err(e) => {
            tracing::warn!(%coin, error = %e, "on-demand price query failed");
            format!(
                "❌ Couldn't fetch the {} price right now, try again later.",
                escape_html(&coin.ticker())
            )
        }
    }
}

async fn set_interval_reply(state: &AppState, chat_id: ChatId, interval: Duration) -> String {
    let s = state.registry.set_interval(chat_id, interval).await;
    let pretty = format_duration(s.interval);
    if s.enabled {
        format!("✅ Notification interval set: {pretty}")
    } else {
        format!("✅ Notification interval set: {pretty}\nUse /notify to turn notifications on")
    }
}

async fn nft_reply(state: &AppState, symbol: &CollectionSymbol) -> String {
    match state.collections.collection_stats(symbol).await {
        Ok(stats) => format!(
            "🎨 <b>{}</b>\n\n🏷️ Floor Price: {:.2} SOL\n📊 Listed: {} NFTs",
            escape_html(&collection_display_name(symbol.as_str())),
            stats.floor_price_sol(),
            stats.listed_count
        ),
        Err(PriceError::NotFound(_)) => {
            format!("❌ Collection '{}' not found", escape_html(symbol.as_str()))
        }
        Err(PriceError::RateLimited(_)) => {
            "⏳ Collection stats provider is busy, try again in a minute.".to_string()
        }
        Err(e) => {
            tracing::warn!(%symbol, error = %e, "collection stats query failed");
            "❌ Couldn't fetch collection stats right now, try again later.".to_string()
        }
    }
}

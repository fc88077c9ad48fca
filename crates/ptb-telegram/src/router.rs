use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;

use ptb_core::{
    config::Config, messaging::port::MessagingPort, ports::CollectionSource,
    price::cache::PriceCache, registry::NotificationRegistry,
};

use crate::handlers;

/// Everything a command handler needs, shared across updates.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub registry: Arc<NotificationRegistry>,
    pub prices: Arc<PriceCache>,
    pub collections: Arc<dyn CollectionSource>,
}

/// Long-poll Telegram for updates until `cancel` fires.
pub async fn run_polling(
    bot: Bot,
    state: Arc<AppState>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let me = bot
        .get_me()
        .await
        .context("telegram getMe failed (check TELEGRAM_TOKEN)")?;
    tracing::info!(username = %me.username(), "bot started");

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build();

    if cancel.is_cancelled() {
        return Ok(());
    }

    let shutdown = dispatcher.shutdown_token();
    let stop = async {
        cancel.cancelled().await;
        // Idle error: polling hasn't started, dropping the dispatcher is enough.
        if let Ok(done) = shutdown.shutdown() {
            done.await;
        }
    };

    tokio::select! {
        _ = dispatcher.dispatch() => {}
        _ = stop => {}
    }
    tracing::info!("update dispatcher stopped");
    Ok(())
}

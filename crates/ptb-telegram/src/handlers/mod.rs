//! Telegram update handlers.
//!
//! Every text message gets exactly one reply; commands are routed to
//! `commands`, anything else gets a pointer to `/start`.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use ptb_core::domain::ChatId;

use crate::router::AppState;

pub mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = ChatId(msg.chat.id.0);

    tracing::debug!(chat_id = chat_id.0, text, "incoming message");

    let reply = if text.trim_start().starts_with('/') {
        commands::reply_to(&state, chat_id, text).await
    } else {
        commands::HINT.to_string()
    };

    if let Err(e) = state.messenger.send_html(chat_id, &reply).await {
        tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
    }

    Ok(())
}

//! Per-chat notification settings.

use std::{collections::HashMap, time::Duration};

use tokio::sync::Mutex;

use crate::domain::ChatId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotificationSetting {
    pub enabled: bool,
    pub interval: Duration,
}

/// Owns every chat's notification setting.
///
/// Records are created by the first `enable`/`set_interval` and never removed.
/// Interval bounds are checked by the command layer, not here.
pub struct NotificationRegistry {
    default_interval: Duration,
    chats: Mutex<HashMap<ChatId, NotificationSetting>>,
}

impl NotificationRegistry {
    pub fn new(default_interval: Duration) -> Self {
        Self {
            default_interval,
            chats: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    pub async fn enable(&self, chat_id: ChatId) -> NotificationSetting {
        let mut chats = self.chats.lock().await;
        let setting = chats.entry(chat_id).or_insert(NotificationSetting {
            enabled: true,
            interval: self.default_interval,
        });
        setting.enabled = true;
        *setting
    }

    /// Returns `None` when the chat never had notifications configured.
    pub async fn disable(&self, chat_id: ChatId) -> Option<NotificationSetting> {
        let mut chats = self.chats.lock().await;
        let setting = chats.get_mut(&chat_id)?;
        setting.enabled = false;
        Some(*setting)
    }

    /// Store `interval` without touching the enabled flag.
    pub async fn set_interval(&self, chat_id: ChatId, interval: Duration) -> NotificationSetting {
        let mut chats = self.chats.lock().await;
        let setting = chats.entry(chat_id).or_insert(NotificationSetting {
            enabled: false,
            interval,
        });
        setting.interval = interval;
        *setting
    }

    pub async fn get(&self, chat_id: ChatId) -> Option<NotificationSetting> {
        self.chats.lock().await.get(&chat_id).copied()
    }

    /// Copy of all records, ordered by chat id.
    pub async fn snapshot(&self) -> Vec<(ChatId, NotificationSetting)> {
        let mut out: Vec<_> = self
            .chats
            .lock()
            .await
            .iter()
            .map(|(id, s)| (*id, *s))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }
}

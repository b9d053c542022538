use chrono::{Duration as ChronoDuration, NaiveDate};
use std::sync::Arc;
use std::time::Duration;

use crate::conversation::ConversationTable;
use crate::database::Store;

/// Сколько дней храним отметки об отправленных уведомлениях
const NOTIFICATION_LOG_DAYS: i64 = 2;

#[derive(Clone)]
pub struct BotState {
    pub store: Arc<dyn Store>,
    pub conversations: ConversationTable,
}

impl BotState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            conversations: ConversationTable::new(),
        }
    }

    /// Периодическая уборка: забытые диалоги и старые отметки об уведомлениях
    pub async fn cleanup(&self, conversation_ttl: Duration, today: NaiveDate) {
        let evicted = self.conversations.evict_idle(conversation_ttl).await;
        log::debug!("🧹 Conversations cleaned: {} idle entries evicted", evicted);

        let before = today - ChronoDuration::days(NOTIFICATION_LOG_DAYS);
        match self.store.prune_notifications(before).await {
            Ok(0) => {}
            Ok(pruned) => log::debug!("🧹 Notification log cleaned: {} old marks", pruned),
            Err(e) => log::error!("Error pruning notification log: {}", e),
        }
    }
}

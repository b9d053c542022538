use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Event, EventDraft, Profile, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("record not found")]
    NotFound,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Какое уведомление отправлено по событию в этот день
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Событие сегодня
    Today,
    /// Заранее, за notify_days дней
    Ahead,
}

impl NotificationKind {
    pub fn key(self) -> &'static str {
        match self {
            NotificationKind::Today => "today",
            NotificationKind::Ahead => "ahead",
        }
    }
}

/// Хранилище пользователей и событий
#[async_trait]
pub trait Store: Send + Sync {
    /// Идемпотентно: для известного telegram_id возвращает существующий id
    async fn create_user(&self, telegram_id: i64, profile: &Profile) -> StoreResult<i64>;

    async fn get_user_by_identity(&self, telegram_id: i64) -> StoreResult<Option<User>>;

    async fn get_user(&self, user_id: i64) -> StoreResult<Option<User>>;

    async fn set_user_notify_time(&self, user_id: i64, notify_time: &str) -> StoreResult<()>;

    async fn create_event(&self, user_id: i64, draft: &EventDraft) -> StoreResult<i64>;

    async fn get_event(&self, event_id: i64) -> StoreResult<Option<Event>>;

    /// `NotFound`, если события уже нет
    async fn update_event(&self, event: &Event) -> StoreResult<()>;

    async fn delete_event(&self, event_id: i64) -> StoreResult<()>;

    /// События пользователя по дню и месяцу
    async fn list_events_by_user(&self, user_id: i64) -> StoreResult<Vec<Event>>;

    /// Грубая выборка: события, чей ММ-ДД входит в окно
    async fn list_events_in_window(&self, month_days: &[String]) -> StoreResult<Vec<Event>>;

    async fn list_users_with_notify_time(&self, notify_time: &str) -> StoreResult<Vec<User>>;

    /// Атомарно ставит отметку об уведомлении. `true` только у того, кто поставил её первым.
    async fn mark_notified(&self, event_id: i64, day: NaiveDate, kind: NotificationKind) -> StoreResult<bool>;

    /// Удаляет отметки старше `before`
    async fn prune_notifications(&self, before: NaiveDate) -> StoreResult<u64>;
}

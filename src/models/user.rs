use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub notify_time: String, // ЧЧ:ММ
    pub created_at: DateTime<Utc>,
}

/// Данные профиля из Telegram, обновляются при каждой регистрации
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

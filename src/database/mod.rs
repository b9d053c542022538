pub mod store;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::models::{Event, EventDraft, EventRow, Profile, User};
pub use store::{NotificationKind, Store, StoreError, StoreResult};

const USER_COLUMNS: &str =
    "id, telegram_id, username, first_name, last_name, notify_time, created_at";
const EVENT_COLUMNS: &str =
    "id, user_id, title, kind, event_date, notify_days, description, created_at";

#[derive(Clone, Debug)]
pub struct Database {
    pub pool: PgPool,
    default_notify_time: String,
}

impl Database {
    pub async fn new(database_url: &str, default_notify_time: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Database {
            pool,
            default_notify_time: default_notify_time.to_string(),
        })
    }

    pub async fn init(&self) -> Result<(), sqlx::Error> {
        // Пользователи
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                telegram_id BIGINT UNIQUE NOT NULL,
                username TEXT NOT NULL DEFAULT '',
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                notify_time TEXT NOT NULL DEFAULT '09:00',
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // События
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                kind TEXT NOT NULL,
                event_date DATE NOT NULL,
                notify_days SMALLINT NOT NULL DEFAULT 1 CHECK (notify_days BETWEEN 1 AND 30),
                description TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Отметки об отправленных уведомлениях: одно на событие в день
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notification_log (
                event_id BIGINT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                notified_on DATE NOT NULL,
                kind TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                PRIMARY KEY (event_id, notified_on)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_notify_time ON users (notify_time)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_user_id ON events (user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notification_log_day ON notification_log (notified_on)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Store for Database {
    async fn create_user(&self, telegram_id: i64, profile: &Profile) -> StoreResult<i64> {
        // notify_time не трогаем у существующего пользователя
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name, notify_time)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (telegram_id)
            DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name
            RETURNING id
            "#,
        )
        .bind(telegram_id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&self.default_notify_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_user_by_identity(&self, telegram_id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE telegram_id = $1",
            USER_COLUMNS
        ))
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn set_user_notify_time(&self, user_id: i64, notify_time: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET notify_time = $1 WHERE id = $2")
            .bind(notify_time)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_event(&self, user_id: i64, draft: &EventDraft) -> StoreResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO events (user_id, title, kind, event_date, notify_days, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&draft.title)
        .bind(draft.kind.key())
        .bind(draft.event_date)
        .bind(i16::from(draft.notify_days))
        .bind(&draft.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_event(&self, event_id: i64) -> StoreResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Event::from))
    }

    async fn update_event(&self, event: &Event) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $1, kind = $2, event_date = $3, notify_days = $4, description = $5
            WHERE id = $6
            "#,
        )
        .bind(&event.title)
        .bind(event.kind.key())
        .bind(event.event_date)
        .bind(i16::from(event.notify_days))
        .bind(&event.description)
        .bind(event.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_event(&self, event_id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_events_by_user(&self, user_id: i64) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE user_id = $1 \
             ORDER BY EXTRACT(MONTH FROM event_date), EXTRACT(DAY FROM event_date), title",
            EVENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn list_events_in_window(&self, month_days: &[String]) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE to_char(event_date, 'MM-DD') = ANY($1) ORDER BY user_id, id",
            EVENT_COLUMNS
        ))
        .bind(month_days)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn list_users_with_notify_time(&self, notify_time: &str) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE notify_time = $1 ORDER BY id",
            USER_COLUMNS
        ))
        .bind(notify_time)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn mark_notified(&self, event_id: i64, day: NaiveDate, kind: NotificationKind) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO notification_log (event_id, notified_on, kind)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id, notified_on) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(day)
        .bind(kind.key())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn prune_notifications(&self, before: NaiveDate) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM notification_log WHERE notified_on < $1")
            .bind(before)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Birthday,
    Meeting,
    Holiday,
    Anniversary,
    Other,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Birthday,
        EventKind::Meeting,
        EventKind::Holiday,
        EventKind::Anniversary,
        EventKind::Other,
    ];

    /// Ключ для БД и callback-данных
    pub fn key(self) -> &'static str {
        match self {
            EventKind::Birthday => "birthday",
            EventKind::Meeting => "meeting",
            EventKind::Holiday => "holiday",
            EventKind::Anniversary => "anniversary",
            EventKind::Other => "other",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            EventKind::Birthday => "День рождения",
            EventKind::Meeting => "Встреча",
            EventKind::Holiday => "Праздник",
            EventKind::Anniversary => "Годовщина",
            EventKind::Other => "Другое",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub kind: EventKind,
    pub event_date: NaiveDate, // год хранится для справки, повторение по дню и месяцу
    pub notify_days: u8,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Строка таблицы events как её отдаёт sqlx
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub kind: String,
    pub event_date: NaiveDate,
    pub notify_days: i16,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        let kind = EventKind::from_key(&row.kind).unwrap_or_else(|| {
            log::warn!("Unknown event kind '{}' for event {}", row.kind, row.id);
            EventKind::Other
        });

        Event {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            kind,
            event_date: row.event_date,
            notify_days: row.notify_days.clamp(1, 30) as u8,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// Полностью собранное в диалоге событие, ещё не сохранённое
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub kind: EventKind,
    pub event_date: NaiveDate,
    pub notify_days: u8,
    pub description: String,
}

/// Редактируемое поле события
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Title,
    Kind,
    Date,
    NotifyDays,
    Description,
}

impl EventField {
    pub fn key(self) -> &'static str {
        match self {
            EventField::Title => "title",
            EventField::Kind => "type",
            EventField::Date => "date",
            EventField::NotifyDays => "notify_days",
            EventField::Description => "description",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "title" => Some(EventField::Title),
            "type" => Some(EventField::Kind),
            "date" => Some(EventField::Date),
            "notify_days" => Some(EventField::NotifyDays),
            "description" => Some(EventField::Description),
            _ => None,
        }
    }
}

/// Уже проверенное новое значение одного поля
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventChange {
    Title(String),
    Kind(EventKind),
    Date(NaiveDate),
    NotifyDays(u8),
    Description(String),
}

impl EventChange {
    pub fn apply(self, event: &mut Event) {
        match self {
            EventChange::Title(title) => event.title = title,
            EventChange::Kind(kind) => event.kind = kind,
            EventChange::Date(date) => event.event_date = date,
            EventChange::NotifyDays(days) => event.notify_days = days,
            EventChange::Description(description) => event.description = description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_keys_are_stable() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(EventKind::from_key("День рождения"), None);
    }

    #[test]
    fn unknown_kind_in_row_becomes_other() {
        let row = EventRow {
            id: 7,
            user_id: 1,
            title: "Юбилей".to_string(),
            kind: "jubilee".to_string(),
            event_date: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            notify_days: 3,
            description: String::new(),
            created_at: Utc::now(),
        };
        let event = Event::from(row);
        assert_eq!(event.kind, EventKind::Other);
        assert_eq!(event.notify_days, 3);
    }
}

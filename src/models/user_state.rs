use chrono::NaiveDate;

use super::{EventField, EventKind};

/// Состояние диалога пользователя. Каждый шаг несёт только те поля черновика,
/// которые уже собраны к этому моменту.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Default,
    AddTitle,
    AddType {
        title: String,
    },
    AddDate {
        title: String,
        kind: EventKind,
    },
    AddNotifyDays {
        title: String,
        kind: EventKind,
        event_date: NaiveDate,
    },
    AddDescription {
        title: String,
        kind: EventKind,
        event_date: NaiveDate,
        notify_days: u8,
    },
    EditField {
        event_id: i64,
        choosing_type: bool,
    },
    EditValue {
        event_id: i64,
        field: EventField,
    },
    SetNotifyTime,
}

/// Метка шага без данных
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Default,
    AddTitle,
    AddType,
    AddDate,
    AddNotifyDays,
    AddDescription,
    EditField,
    EditValue,
    SetNotifyTime,
}

impl ConversationState {
    pub fn step(&self) -> Step {
        match self {
            ConversationState::Default => Step::Default,
            ConversationState::AddTitle => Step::AddTitle,
            ConversationState::AddType { .. } => Step::AddType,
            ConversationState::AddDate { .. } => Step::AddDate,
            ConversationState::AddNotifyDays { .. } => Step::AddNotifyDays,
            ConversationState::AddDescription { .. } => Step::AddDescription,
            ConversationState::EditField { .. } => Step::EditField,
            ConversationState::EditValue { .. } => Step::EditValue,
            ConversationState::SetNotifyTime => Step::SetNotifyTime,
        }
    }
}

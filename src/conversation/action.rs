use crate::messenger::{Button, Keyboard};
use crate::models::{EventChange, EventDraft, EventField, EventKind};
use crate::Command;

/// Действие за inline-кнопкой. Токен уходит в Telegram и возвращается в callback без изменений.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AddEvent,
    ListEvents,
    Settings,
    Help,
    BackToMenu,
    SetNotifyTime,
    PickType(EventKind),
    ShowEvent(i64),
    Edit(i64),
    EditField(EventField),
    SetType(EventKind),
    Delete(i64),
    ConfirmDelete(i64),
}

impl Action {
    pub fn token(&self) -> String {
        match self {
            Action::AddEvent => "add_event".to_string(),
            Action::ListEvents => "list_events".to_string(),
            Action::Settings => "settings".to_string(),
            Action::Help => "help".to_string(),
            Action::BackToMenu => "back_to_menu".to_string(),
            Action::SetNotifyTime => "set_notify_time".to_string(),
            Action::PickType(kind) => format!("type:{}", kind.key()),
            Action::ShowEvent(id) => format!("event:{}", id),
            Action::Edit(id) => format!("edit:{}", id),
            Action::EditField(field) => format!("edit_field:{}", field.key()),
            Action::SetType(kind) => format!("set_type:{}", kind.key()),
            Action::Delete(id) => format!("delete:{}", id),
            Action::ConfirmDelete(id) => format!("confirm_delete:{}", id),
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "add_event" => return Some(Action::AddEvent),
            "list_events" => return Some(Action::ListEvents),
            "settings" => return Some(Action::Settings),
            "help" => return Some(Action::Help),
            "back_to_menu" => return Some(Action::BackToMenu),
            "set_notify_time" => return Some(Action::SetNotifyTime),
            _ => {}
        }

        let (prefix, value) = token.split_once(':')?;
        let id = || value.parse::<i64>().ok();
        match prefix {
            "type" => EventKind::from_key(value).map(Action::PickType),
            "event" => id().map(Action::ShowEvent),
            "edit" => id().map(Action::Edit),
            "edit_field" => EventField::from_key(value).map(Action::EditField),
            "set_type" => EventKind::from_key(value).map(Action::SetType),
            "delete" => id().map(Action::Delete),
            "confirm_delete" => id().map(Action::ConfirmDelete),
            _ => None,
        }
    }

    pub fn button(&self, label: impl Into<String>) -> Button {
        Button::new(label, self.token())
    }
}

/// Входящее от пользователя
#[derive(Debug, Clone)]
pub enum Input {
    Text(String),
    Command(Command),
    Callback(Action),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Что должно произойти снаружи после перехода. Сам автомат ввод-вывод не выполняет.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Reply(Reply),
    Welcome,
    MainMenu,
    Help,
    ShowEvents,
    ShowSettings,
    ShowEvent(i64),
    ShowEditMenu(i64),
    ConfirmDelete(i64),
    DeleteEvent(i64),
    CreateEvent(EventDraft),
    UpdateEvent { event_id: i64, change: EventChange },
    SetNotifyTime(String),
}

/// Кнопки выбора типа события, по одной в строке
pub fn kinds_keyboard(action: fn(EventKind) -> Action) -> Keyboard {
    Keyboard::new(
        EventKind::ALL
            .into_iter()
            .map(|kind| vec![action(kind).button(kind.label())])
            .collect(),
    )
}

/// Выбор поля для редактирования
pub fn edit_fields_keyboard(event_id: i64) -> Keyboard {
    Keyboard::new(vec![
        vec![
            Action::EditField(EventField::Title).button("🔤 Название"),
            Action::EditField(EventField::Kind).button("🏷 Тип"),
        ],
        vec![
            Action::EditField(EventField::Date).button("📅 Дата"),
            Action::EditField(EventField::NotifyDays).button("🔔 Дни напоминания"),
        ],
        vec![
            Action::EditField(EventField::Description).button("📝 Описание"),
            Action::ShowEvent(event_id).button("⬅️ Назад"),
        ],
    ])
}

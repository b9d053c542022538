use crate::conversation::Action;
use crate::messenger::Keyboard;
use crate::models::Event;
use crate::recurrence::to_display;

pub const HELP_TEXT: &str = "🤖 Справка по командам:\n\n\
    /start - запустить бота и показать главное меню\n\
    /help - показать справку по командам\n\
    /add - добавить новое событие\n\
    /list - показать список ваших событий\n\
    /settings - настройки уведомлений\n\
    /skip - пропустить описание при добавлении события\n\
    /cancel - отменить текущее действие\n\n\
    Вы также можете использовать кнопки меню для более удобной навигации.";

pub const MENU_TEXT: &str = "Что вы хотите сделать?";
pub const NOT_FOUND_TEXT: &str = "❌ Событие не найдено.";
pub const FAILURE_TEXT: &str = "❌ Произошла ошибка. Попробуйте ещё раз позже.";
pub const UNKNOWN_COMMAND_TEXT: &str =
    "Неизвестная команда. Используйте /help для списка доступных команд.";

pub fn welcome_text(first_name: &str) -> String {
    let name = if first_name.is_empty() { "друг" } else { first_name };
    format!(
        "👋 Привет, {}!\n\n\
        Я бот для напоминания о днях рождения и важных событиях. \
        С моей помощью вы не забудете поздравить друзей и близких с праздниками.\n\n\
        Используйте меню для управления вашими событиями и напоминаниями:",
        name
    )
}

/// Главное меню
pub fn main_menu_keyboard() -> Keyboard {
    Keyboard::new(vec![
        vec![
            Action::AddEvent.button("➕ Добавить событие"),
            Action::ListEvents.button("🗓 Мои события"),
        ],
        vec![
            Action::Settings.button("⚙️ Настройки"),
            Action::Help.button("ℹ️ Помощь"),
        ],
    ])
}

fn list_footer() -> Vec<crate::messenger::Button> {
    vec![
        Action::AddEvent.button("➕ Добавить событие"),
        Action::BackToMenu.button("🏠 Главное меню"),
    ]
}

pub fn settings_keyboard() -> Keyboard {
    Keyboard::new(vec![
        vec![Action::SetNotifyTime.button("⏰ Изменить время уведомлений")],
        vec![Action::BackToMenu.button("🏠 Главное меню")],
    ])
}

pub fn settings_text(notify_time: &str) -> String {
    format!(
        "⚙️ Настройки:\n\n⏰ Время уведомлений: {}\n\nВыберите настройку, которую хотите изменить:",
        notify_time
    )
}

/// Кнопки под карточкой события
pub fn event_keyboard(event_id: i64) -> Keyboard {
    Keyboard::new(vec![
        vec![
            Action::Edit(event_id).button("✏️ Редактировать"),
            Action::Delete(event_id).button("❌ Удалить"),
        ],
        vec![Action::ListEvents.button("⬅️ К списку")],
    ])
}

pub fn confirm_delete_keyboard(event_id: i64) -> Keyboard {
    Keyboard::new(vec![vec![
        Action::ConfirmDelete(event_id).button("✅ Да, удалить"),
        Action::ShowEvent(event_id).button("❌ Нет, отменить"),
    ]])
}

pub fn format_days_left(days_left: u32) -> String {
    if days_left == 0 {
        " (сегодня!)".to_string()
    } else {
        format!(" (через {} дн.)", days_left)
    }
}

/// Список событий: по кнопке на событие, ближайшие сверху
pub fn events_list_keyboard(events: &[(Event, u32)]) -> Keyboard {
    let mut rows: Vec<Vec<_>> = events
        .iter()
        .map(|(event, days_left)| {
            let label = format!(
                "{} - {}{}",
                event.title,
                to_display(event.event_date),
                format_days_left(*days_left)
            );
            vec![Action::ShowEvent(event.id).button(label)]
        })
        .collect();

    rows.push(list_footer());
    Keyboard::new(rows)
}

pub fn empty_list_keyboard() -> Keyboard {
    Keyboard::new(vec![list_footer()])
}

fn event_details(event: &Event) -> String {
    let mut text = format!(
        "🏷 Тип: {}\n📅 Дата: {}\n🔔 Напоминание: за {} дн.\n",
        event.kind.label(),
        to_display(event.event_date),
        event.notify_days
    );
    if !event.description.is_empty() {
        text.push_str(&format!("📝 Описание: {}\n", event.description));
    }
    text
}

/// Карточка события
pub fn format_event_card(event: &Event) -> String {
    format!("🗓 {}\n\n{}", event.title, event_details(event))
}

/// Подтверждение после создания или изменения, `header` идёт первой строкой
pub fn format_saved_event(header: &str, event: &Event) -> String {
    format!("{}\n\n🔤 Название: {}\n{}", header, event.title, event_details(event))
}

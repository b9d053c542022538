use crate::models::{ConversationState, EventChange, EventDraft, EventField};
use crate::recurrence::{parse_entry_date, parse_notify_days, parse_notify_hour};
use crate::Command;

use super::action::{kinds_keyboard, Action, Effect, Input, Reply};

pub const TITLE_PROMPT: &str = "Введите название события:";
pub const TYPE_PROMPT: &str = "Выберите тип события:";
pub const DATE_PROMPT: &str = "Введите дату события в формате ДД.ММ.ГГГГ:";
pub const DAYS_PROMPT: &str =
    "За сколько дней до события отправить напоминание? (введите число от 1 до 30):";
pub const DESCRIPTION_PROMPT: &str =
    "Введите описание события (или отправьте /skip, чтобы пропустить):";
pub const TIME_PROMPT: &str =
    "Введите время для получения уведомлений в формате ЧЧ:ММ (например, 09:00):";
pub const STALE_BUTTON: &str = "Эта кнопка уже неактуальна.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: ConversationState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: ConversationState, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }

    fn reset(effects: Vec<Effect>) -> Self {
        Self::to(ConversationState::Default, effects)
    }

    /// Состояние не меняется, пользователь получает одно сообщение
    fn stay(state: ConversationState, reply: Reply) -> Self {
        Self::to(state, vec![Effect::Reply(reply)])
    }
}

/// Один шаг диалога: текущее состояние + ввод -> новое состояние и действия
pub fn advance(state: ConversationState, input: Input) -> Transition {
    match input {
        Input::Command(Command::Skip) => skip(state),
        Input::Command(command) => run_command(command),
        Input::Callback(action) => on_callback(state, action),
        Input::Text(text) => on_text(state, text),
    }
}

/// Команды прерывают любой сценарий и выполняются как из главного меню
fn run_command(command: Command) -> Transition {
    match command {
        Command::Start => Transition::reset(vec![Effect::Welcome, Effect::MainMenu]),
        Command::Help => Transition::reset(vec![Effect::Help]),
        Command::Add => start_adding(),
        Command::List => Transition::reset(vec![Effect::ShowEvents]),
        Command::Settings => Transition::reset(vec![Effect::ShowSettings]),
        Command::Cancel => Transition::reset(vec![
            Effect::Reply(Reply::text("Действие отменено.")),
            Effect::MainMenu,
        ]),
        Command::Skip => skip(ConversationState::Default),
    }
}

fn skip(state: ConversationState) -> Transition {
    match state {
        ConversationState::AddDescription {
            title,
            kind,
            event_date,
            notify_days,
        } => finish_adding(EventDraft {
            title,
            kind,
            event_date,
            notify_days,
            description: String::new(),
        }),
        other => Transition::stay(other, Reply::text("Сейчас нечего пропускать.")),
    }
}

fn start_adding() -> Transition {
    Transition::to(
        ConversationState::AddTitle,
        vec![Effect::Reply(Reply::text(TITLE_PROMPT))],
    )
}

fn finish_adding(draft: EventDraft) -> Transition {
    Transition::reset(vec![Effect::CreateEvent(draft)])
}

fn on_callback(state: ConversationState, action: Action) -> Transition {
    match action {
        Action::AddEvent => start_adding(),
        Action::ListEvents => Transition::reset(vec![Effect::ShowEvents]),
        Action::Settings => Transition::reset(vec![Effect::ShowSettings]),
        Action::Help => Transition::reset(vec![Effect::Help]),
        Action::BackToMenu => Transition::reset(vec![Effect::MainMenu]),
        Action::SetNotifyTime => Transition::to(
            ConversationState::SetNotifyTime,
            vec![Effect::Reply(Reply::text(TIME_PROMPT))],
        ),
        Action::ShowEvent(id) => Transition::reset(vec![Effect::ShowEvent(id)]),
        Action::Delete(id) => Transition::reset(vec![Effect::ConfirmDelete(id)]),
        Action::ConfirmDelete(id) => Transition::reset(vec![Effect::DeleteEvent(id)]),
        Action::Edit(id) => Transition::to(
            ConversationState::EditField {
                event_id: id,
                choosing_type: false,
            },
            vec![Effect::ShowEditMenu(id)],
        ),
        Action::PickType(kind) => match state {
            ConversationState::AddType { title } => Transition::to(
                ConversationState::AddDate { title, kind },
                vec![Effect::Reply(Reply::text(format!(
                    "Тип: {}\n\n{}",
                    kind.label(),
                    DATE_PROMPT
                )))],
            ),
            other => Transition::stay(other, Reply::text(STALE_BUTTON)),
        },
        Action::EditField(field) => match state {
            ConversationState::EditField { event_id, .. } => choose_field(event_id, field),
            other => Transition::stay(other, Reply::text(STALE_BUTTON)),
        },
        Action::SetType(kind) => match state {
            ConversationState::EditField {
                event_id,
                choosing_type: true,
            } => Transition::reset(vec![Effect::UpdateEvent {
                event_id,
                change: EventChange::Kind(kind),
            }]),
            other => Transition::stay(other, Reply::text(STALE_BUTTON)),
        },
    }
}

fn choose_field(event_id: i64, field: EventField) -> Transition {
    let prompt = match field {
        // тип меняется кнопками сразу, без шага ввода значения
        EventField::Kind => {
            return Transition::to(
                ConversationState::EditField {
                    event_id,
                    choosing_type: true,
                },
                vec![Effect::Reply(Reply::with_keyboard(
                    "Выберите новый тип события:",
                    kinds_keyboard(Action::SetType),
                ))],
            );
        }
        EventField::Title => "Введите новое название события:",
        EventField::Date => "Введите новую дату события в формате ДД.ММ.ГГГГ:",
        EventField::NotifyDays => DAYS_PROMPT,
        EventField::Description => "Введите новое описание события:",
    };

    Transition::to(
        ConversationState::EditValue { event_id, field },
        vec![Effect::Reply(Reply::text(prompt))],
    )
}

fn on_text(state: ConversationState, text: String) -> Transition {
    let trimmed = text.trim();

    match state {
        ConversationState::Default => Transition::reset(vec![Effect::MainMenu]),

        ConversationState::AddTitle => {
            if trimmed.is_empty() {
                return Transition::stay(
                    ConversationState::AddTitle,
                    Reply::text(format!("❌ Название не может быть пустым. {}", TITLE_PROMPT)),
                );
            }
            Transition::to(
                ConversationState::AddType {
                    title: trimmed.to_string(),
                },
                vec![Effect::Reply(Reply::with_keyboard(
                    TYPE_PROMPT,
                    kinds_keyboard(Action::PickType),
                ))],
            )
        }

        state @ ConversationState::AddType { .. } => Transition::stay(
            state,
            Reply::with_keyboard(
                "Пожалуйста, выберите тип события кнопкой:",
                kinds_keyboard(Action::PickType),
            ),
        ),

        ConversationState::AddDate { title, kind } => match parse_entry_date(trimmed) {
            Ok(event_date) => Transition::to(
                ConversationState::AddNotifyDays {
                    title,
                    kind,
                    event_date,
                },
                vec![Effect::Reply(Reply::text(DAYS_PROMPT))],
            ),
            Err(e) => Transition::stay(
                ConversationState::AddDate { title, kind },
                Reply::text(format!("❌ {}. Пожалуйста, введите дату в формате ДД.ММ.ГГГГ:", e)),
            ),
        },

        ConversationState::AddNotifyDays {
            title,
            kind,
            event_date,
        } => match parse_notify_days(trimmed) {
            Ok(notify_days) => Transition::to(
                ConversationState::AddDescription {
                    title,
                    kind,
                    event_date,
                    notify_days,
                },
                vec![Effect::Reply(Reply::text(DESCRIPTION_PROMPT))],
            ),
            Err(e) => Transition::stay(
                ConversationState::AddNotifyDays {
                    title,
                    kind,
                    event_date,
                },
                Reply::text(format!("❌ {}. Пожалуйста, введите число от 1 до 30:", e)),
            ),
        },

        ConversationState::AddDescription {
            title,
            kind,
            event_date,
            notify_days,
        } => finish_adding(EventDraft {
            title,
            kind,
            event_date,
            notify_days,
            description: trimmed.to_string(),
        }),

        state @ ConversationState::EditField { choosing_type, .. } => {
            let reply = if choosing_type {
                Reply::with_keyboard(
                    "Пожалуйста, выберите новый тип кнопкой:",
                    kinds_keyboard(Action::SetType),
                )
            } else {
                Reply::text("Пожалуйста, выберите поле для редактирования кнопкой.")
            };
            Transition::stay(state, reply)
        }

        ConversationState::EditValue { event_id, field } => match parse_field_value(field, trimmed) {
            Ok(change) => Transition::reset(vec![Effect::UpdateEvent { event_id, change }]),
            Err(reason) => Transition::stay(
                ConversationState::EditValue { event_id, field },
                Reply::text(reason),
            ),
        },

        ConversationState::SetNotifyTime => match parse_notify_hour(trimmed) {
            Ok(time) => Transition::reset(vec![Effect::SetNotifyTime(time)]),
            Err(e) => Transition::stay(
                ConversationState::SetNotifyTime,
                Reply::text(format!("❌ {}. Пожалуйста, введите время в формате ЧЧ:ММ:", e)),
            ),
        },
    }
}

/// Проверка нового значения поля; в ошибке готовый текст повторного запроса
fn parse_field_value(field: EventField, text: &str) -> Result<EventChange, String> {
    match field {
        EventField::Title => {
            if text.is_empty() {
                Err("❌ Название не может быть пустым. Введите новое название события:".to_string())
            } else {
                Ok(EventChange::Title(text.to_string()))
            }
        }
        EventField::Date => parse_entry_date(text)
            .map(EventChange::Date)
            .map_err(|e| format!("❌ {}. Пожалуйста, введите дату в формате ДД.ММ.ГГГГ:", e)),
        EventField::NotifyDays => parse_notify_days(text)
            .map(EventChange::NotifyDays)
            .map_err(|e| format!("❌ {}. Пожалуйста, введите число от 1 до 30:", e)),
        EventField::Description => Ok(EventChange::Description(text.to_string())),
        EventField::Kind => Err("Пожалуйста, выберите тип кнопкой.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventKind, Step};
    use chrono::NaiveDate;

    fn text(s: &str) -> Input {
        Input::Text(s.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn replies(effects: &[Effect]) -> usize {
        effects.iter().filter(|e| matches!(e, Effect::Reply(_))).count()
    }

    #[test]
    fn add_flow_collects_draft_step_by_step() {
        let t = advance(ConversationState::Default, Input::Command(Command::Add));
        assert_eq!(t.next, ConversationState::AddTitle);

        let t = advance(t.next, text("Mom's Birthday"));
        assert_eq!(
            t.next,
            ConversationState::AddType {
                title: "Mom's Birthday".to_string()
            }
        );
        match &t.effects[..] {
            [Effect::Reply(reply)] => {
                let keyboard = reply.keyboard.as_ref().expect("type keyboard");
                assert!(keyboard.tokens().any(|t| t == "type:birthday"));
            }
            other => panic!("unexpected effects: {:?}", other),
        }

        let t = advance(t.next, Input::Callback(Action::PickType(EventKind::Birthday)));
        assert_eq!(t.next.step(), Step::AddDate);

        let t = advance(t.next, text("15.03.1970"));
        assert_eq!(
            t.next,
            ConversationState::AddNotifyDays {
                title: "Mom's Birthday".to_string(),
                kind: EventKind::Birthday,
                event_date: date(1970, 3, 15),
            }
        );

        let t = advance(t.next, text("3"));
        assert_eq!(t.next.step(), Step::AddDescription);

        let t = advance(t.next, Input::Command(Command::Skip));
        assert_eq!(t.next, ConversationState::Default);
        assert_eq!(
            t.effects,
            vec![Effect::CreateEvent(EventDraft {
                title: "Mom's Birthday".to_string(),
                kind: EventKind::Birthday,
                event_date: date(1970, 3, 15),
                notify_days: 3,
                description: String::new(),
            })]
        );
    }

    #[test]
    fn description_text_is_kept() {
        let state = ConversationState::AddDescription {
            title: "Годовщина".to_string(),
            kind: EventKind::Anniversary,
            event_date: date(2010, 6, 12),
            notify_days: 7,
        };
        let t = advance(state, text("  купить цветы "));
        match &t.effects[..] {
            [Effect::CreateEvent(draft)] => assert_eq!(draft.description, "купить цветы"),
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn invalid_input_keeps_state_and_reprompts_once() {
        let cases = vec![
            (ConversationState::AddTitle, text("   ")),
            (
                ConversationState::AddType {
                    title: "x".to_string(),
                },
                text("Birthday"),
            ),
            (
                ConversationState::AddDate {
                    title: "x".to_string(),
                    kind: EventKind::Other,
                },
                text("31.02.2024"),
            ),
            (
                ConversationState::AddNotifyDays {
                    title: "x".to_string(),
                    kind: EventKind::Other,
                    event_date: date(2000, 1, 1),
                },
                text("31"),
            ),
            (
                ConversationState::EditField {
                    event_id: 1,
                    choosing_type: false,
                },
                text("title"),
            ),
            (
                ConversationState::EditField {
                    event_id: 1,
                    choosing_type: true,
                },
                text("Встреча"),
            ),
            (
                ConversationState::EditValue {
                    event_id: 1,
                    field: EventField::Date,
                },
                text("31.13.2024"),
            ),
            (
                ConversationState::EditValue {
                    event_id: 1,
                    field: EventField::NotifyDays,
                },
                text("0"),
            ),
            (
                ConversationState::EditValue {
                    event_id: 1,
                    field: EventField::Title,
                },
                text(""),
            ),
            (ConversationState::SetNotifyTime, text("25:00")),
            (
                ConversationState::AddDate {
                    title: "x".to_string(),
                    kind: EventKind::Other,
                },
                Input::Command(Command::Skip),
            ),
            (
                ConversationState::AddTitle,
                Input::Callback(Action::SetType(EventKind::Meeting)),
            ),
            (
                ConversationState::Default,
                Input::Callback(Action::PickType(EventKind::Meeting)),
            ),
            (
                ConversationState::EditField {
                    event_id: 1,
                    choosing_type: false,
                },
                Input::Callback(Action::SetType(EventKind::Meeting)),
            ),
        ];

        for (state, input) in cases {
            let t = advance(state.clone(), input.clone());
            assert_eq!(t.next, state, "state changed on {:?}", input);
            assert_eq!(t.effects.len(), 1, "effects for {:?}: {:?}", input, t.effects);
            assert_eq!(replies(&t.effects), 1);
        }
    }

    #[test]
    fn date_error_names_the_reason() {
        let state = ConversationState::AddDate {
            title: "x".to_string(),
            kind: EventKind::Holiday,
        };
        let t = advance(state, text("31.02.2024"));
        match &t.effects[..] {
            [Effect::Reply(reply)] => assert!(reply.text.contains("несуществующая дата")),
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn editing_type_skips_value_step() {
        let t = advance(ConversationState::Default, Input::Callback(Action::Edit(9)));
        assert_eq!(t.next.step(), Step::EditField);
        assert_eq!(t.effects, vec![Effect::ShowEditMenu(9)]);

        let t = advance(t.next, Input::Callback(Action::EditField(EventField::Kind)));
        assert_eq!(t.next.step(), Step::EditField);

        let t = advance(t.next, Input::Callback(Action::SetType(EventKind::Meeting)));
        assert_eq!(t.next, ConversationState::Default);
        assert_eq!(
            t.effects,
            vec![Effect::UpdateEvent {
                event_id: 9,
                change: EventChange::Kind(EventKind::Meeting),
            }]
        );
    }

    #[test]
    fn editing_title_goes_through_value_step() {
        let t = advance(ConversationState::Default, Input::Callback(Action::Edit(4)));
        let t = advance(t.next, Input::Callback(Action::EditField(EventField::Title)));
        assert_eq!(
            t.next,
            ConversationState::EditValue {
                event_id: 4,
                field: EventField::Title
            }
        );

        let t = advance(t.next, text("День рождения папы"));
        assert_eq!(t.next, ConversationState::Default);
        assert_eq!(
            t.effects,
            vec![Effect::UpdateEvent {
                event_id: 4,
                change: EventChange::Title("День рождения папы".to_string()),
            }]
        );
    }

    #[test]
    fn commands_abandon_the_active_flow() {
        let state = ConversationState::AddNotifyDays {
            title: "x".to_string(),
            kind: EventKind::Other,
            event_date: date(2000, 1, 1),
        };

        let t = advance(state.clone(), Input::Command(Command::List));
        assert_eq!(t.next, ConversationState::Default);
        assert_eq!(t.effects, vec![Effect::ShowEvents]);

        let t = advance(state.clone(), Input::Command(Command::Add));
        assert_eq!(t.next, ConversationState::AddTitle);

        let t = advance(state, Input::Callback(Action::BackToMenu));
        assert_eq!(t.next, ConversationState::Default);
        assert_eq!(t.effects, vec![Effect::MainMenu]);
    }

    #[test]
    fn notify_time_is_canonicalized_before_saving() {
        let t = advance(ConversationState::Default, Input::Callback(Action::SetNotifyTime));
        assert_eq!(t.next, ConversationState::SetNotifyTime);

        let t = advance(t.next, text("7:30"));
        assert_eq!(t.next, ConversationState::Default);
        assert_eq!(t.effects, vec![Effect::SetNotifyTime("07:30".to_string())]);
    }

    #[test]
    fn start_registers_and_shows_menu() {
        let t = advance(ConversationState::SetNotifyTime, Input::Command(Command::Start));
        assert_eq!(t.next, ConversationState::Default);
        assert_eq!(t.effects, vec![Effect::Welcome, Effect::MainMenu]);
    }

    #[test]
    fn free_text_in_default_shows_menu() {
        let t = advance(ConversationState::Default, text("привет"));
        assert_eq!(t.next, ConversationState::Default);
        assert_eq!(t.effects, vec![Effect::MainMenu]);
    }
}

use chrono::NaiveDate;

use crate::conversation::action::edit_fields_keyboard;
use crate::conversation::{ConversationTable, Effect, Reply};
use crate::database::{Store, StoreError};
use crate::handlers::utils::{
    confirm_delete_keyboard, empty_list_keyboard, event_keyboard, events_list_keyboard,
    format_event_card, format_saved_event, main_menu_keyboard, settings_keyboard, settings_text,
    welcome_text, FAILURE_TEXT, HELP_TEXT, MENU_TEXT, NOT_FOUND_TEXT,
};
use crate::messenger::{Keyboard, Messenger};
use crate::models::{Event, Profile, User};
use crate::recurrence::days_until_next_occurrence;

/// Откуда пришло обновление
#[derive(Debug, Clone)]
pub struct Origin {
    pub identity: i64,
    pub chat_id: i64,
    pub profile: Profile,
}

/// Почему выполнение эффектов прервано
enum Abort {
    Store(StoreError),
    Send(anyhow::Error),
}

impl From<StoreError> for Abort {
    fn from(err: StoreError) -> Self {
        Abort::Store(err)
    }
}

impl From<anyhow::Error> for Abort {
    fn from(err: anyhow::Error) -> Self {
        Abort::Send(err)
    }
}

/// Выполняет эффекты перехода: обращается к хранилищу и отправляет ответы
pub struct Executor<'a> {
    store: &'a dyn Store,
    messenger: &'a dyn Messenger,
    conversations: &'a ConversationTable,
    origin: &'a Origin,
    today: NaiveDate,
    user: Option<User>,
}

impl<'a> Executor<'a> {
    pub fn new(
        store: &'a dyn Store,
        messenger: &'a dyn Messenger,
        conversations: &'a ConversationTable,
        origin: &'a Origin,
        today: NaiveDate,
    ) -> Self {
        Self {
            store,
            messenger,
            conversations,
            origin,
            today,
            user: None,
        }
    }

    /// Ошибка возвращается только при сбое отправки сообщения
    pub async fn run(mut self, effects: Vec<Effect>) -> anyhow::Result<()> {
        for effect in effects {
            let reset_on_missing = matches!(effect, Effect::ShowEditMenu(_));

            match self.apply(effect).await {
                Ok(()) => {}
                Err(Abort::Send(e)) => return Err(e),
                Err(Abort::Store(StoreError::NotFound)) => {
                    if reset_on_missing {
                        self.conversations.reset(self.origin.identity).await;
                    }
                    self.say(NOT_FOUND_TEXT, None).await?;
                    return Ok(());
                }
                Err(Abort::Store(e)) => {
                    log::error!("Store error for user {}: {}", self.origin.identity, e);
                    self.conversations.reset(self.origin.identity).await;
                    self.say(FAILURE_TEXT, Some(main_menu_keyboard())).await?;
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    async fn say(&self, text: &str, keyboard: Option<Keyboard>) -> anyhow::Result<()> {
        self.messenger.send_text(self.origin.chat_id, text, keyboard).await
    }

    /// Пользователь по telegram_id; при первом обращении регистрируется
    async fn user(&mut self) -> Result<User, Abort> {
        if let Some(user) = &self.user {
            return Ok(user.clone());
        }

        let user = match self.store.get_user_by_identity(self.origin.identity).await? {
            Some(user) => user,
            None => self.register().await?,
        };
        self.user = Some(user.clone());
        Ok(user)
    }

    async fn register(&mut self) -> Result<User, Abort> {
        let id = self
            .store
            .create_user(self.origin.identity, &self.origin.profile)
            .await?;
        let user = self.store.get_user(id).await?.ok_or(StoreError::NotFound)?;
        self.user = Some(user.clone());
        Ok(user)
    }

    /// Событие текущего пользователя. Чужие события выглядят как отсутствующие.
    async fn owned_event(&mut self, event_id: i64) -> Result<Event, Abort> {
        let user = self.user().await?;
        match self.store.get_event(event_id).await? {
            Some(event) if event.user_id == user.id => Ok(event),
            Some(_) => {
                log::warn!("⚠️ User {} asked for someone else's event {}", user.id, event_id);
                Err(StoreError::NotFound.into())
            }
            None => Err(StoreError::NotFound.into()),
        }
    }

    /// Список событий, ближайшие сверху
    async fn show_events(&mut self) -> Result<(), Abort> {
        let user = self.user().await?;
        let today = self.today;
        let mut events: Vec<(Event, u32)> = self
            .store
            .list_events_by_user(user.id)
            .await?
            .into_iter()
            .map(|event| {
                let days_left = days_until_next_occurrence(event.event_date, today);
                (event, days_left)
            })
            .collect();

        if events.is_empty() {
            self.say(
                "У вас пока нет добавленных событий. Добавьте первое событие!",
                Some(empty_list_keyboard()),
            )
            .await?;
            return Ok(());
        }

        events.sort_by_key(|(_, days_left)| *days_left);
        self.say("🗓 Ваши события:", Some(events_list_keyboard(&events)))
            .await?;
        Ok(())
    }

    async fn apply(&mut self, effect: Effect) -> Result<(), Abort> {
        match effect {
            Effect::Reply(Reply { text, keyboard }) => self.say(&text, keyboard).await?,

            Effect::Welcome => {
                self.register().await?;
                log::info!("👤 User {} registered", self.origin.identity);
                self.say(&welcome_text(&self.origin.profile.first_name), None).await?;
            }

            Effect::MainMenu => self.say(MENU_TEXT, Some(main_menu_keyboard())).await?,

            Effect::Help => self.say(HELP_TEXT, Some(main_menu_keyboard())).await?,

            Effect::ShowEvents => self.show_events().await?,

            Effect::ShowSettings => {
                let user = self.user().await?;
                self.say(&settings_text(&user.notify_time), Some(settings_keyboard()))
                    .await?;
            }

            Effect::ShowEvent(event_id) => {
                let event = self.owned_event(event_id).await?;
                self.say(&format_event_card(&event), Some(event_keyboard(event.id)))
                    .await?;
            }

            Effect::ShowEditMenu(event_id) => {
                let event = self.owned_event(event_id).await?;
                self.say(
                    &format!("Что вы хотите изменить в событии «{}»?", event.title),
                    Some(edit_fields_keyboard(event.id)),
                )
                .await?;
            }

            Effect::ConfirmDelete(event_id) => {
                let event = self.owned_event(event_id).await?;
                self.say(
                    "❓ Вы уверены, что хотите удалить это событие? Это действие нельзя отменить.",
                    Some(confirm_delete_keyboard(event.id)),
                )
                .await?;
            }

            Effect::DeleteEvent(event_id) => {
                let event = self.owned_event(event_id).await?;
                self.store.delete_event(event.id).await?;
                log::info!("🗑 Event {} deleted by user {}", event.id, event.user_id);
                self.say("✅ Событие успешно удалено!", None).await?;
                self.show_events().await?;
            }

            Effect::CreateEvent(draft) => {
                let user = self.user().await?;
                let id = self.store.create_event(user.id, &draft).await?;
                log::info!("📅 Event {} created by user {}", id, user.id);

                let event = self.store.get_event(id).await?.ok_or(StoreError::NotFound)?;
                self.say(
                    &format_saved_event("✅ Событие успешно добавлено!", &event),
                    None,
                )
                .await?;
                self.say(MENU_TEXT, Some(main_menu_keyboard())).await?;
            }

            Effect::UpdateEvent { event_id, change } => {
                let mut event = self.owned_event(event_id).await?;
                change.apply(&mut event);
                self.store.update_event(&event).await?;
                log::info!("✏️ Event {} updated by user {}", event.id, event.user_id);

                self.say(
                    &format_saved_event("✅ Событие успешно обновлено!", &event),
                    Some(event_keyboard(event.id)),
                )
                .await?;
            }

            Effect::SetNotifyTime(time) => {
                let user = self.user().await?;
                self.store.set_user_notify_time(user.id, &time).await?;
                log::info!("⏰ User {} notify time set to {}", user.id, time);

                self.say(&format!("✅ Время уведомлений установлено на {}", time), None)
                    .await?;
                self.say(MENU_TEXT, Some(main_menu_keyboard())).await?;
            }
        }
        Ok(())
    }
}

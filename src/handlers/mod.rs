pub mod callbacks;
pub mod commands;
pub mod executor;
pub mod messages;
pub mod utils;

pub use callbacks::callback_handler;
pub use commands::command_handler;
pub use messages::message_handler;

use chrono::{Local, NaiveDate};
use std::error::Error;
use teloxide::types::{ChatId, User as TelegramUser};

use crate::bot_state::BotState;
use crate::conversation::Input;
use crate::messenger::Messenger;
use crate::models::Profile;
use executor::{Executor, Origin};

pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

pub fn origin(from: &TelegramUser, chat_id: ChatId) -> Origin {
    Origin {
        identity: from.id.0 as i64,
        chat_id: chat_id.0,
        profile: Profile {
            username: from.username.clone().unwrap_or_default(),
            first_name: from.first_name.clone(),
            last_name: from.last_name.clone().unwrap_or_default(),
        },
    }
}

/// Шаг диалога и выполнение его эффектов
pub async fn process(
    state: &BotState,
    messenger: &dyn Messenger,
    origin: Origin,
    input: Input,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let effects = state.conversations.advance(origin.identity, input).await;
    Executor::new(
        state.store.as_ref(),
        messenger,
        &state.conversations,
        &origin,
        today,
    )
    .run(effects)
    .await
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

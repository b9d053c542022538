use teloxide::prelude::*;

use crate::bot_state::BotState;
use crate::conversation::{Action, Input};
use crate::handlers::{origin, process, today, HandlerResult};
use crate::messenger::TelegramMessenger;

pub async fn callback_handler(bot: Bot, q: CallbackQuery, state: BotState) -> HandlerResult {
    // Снимаем «часики» с кнопки сразу
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;

    let Some(action) = Action::parse(data) else {
        log::warn!("⚠️ Unknown callback data from user {}: {}", q.from.id, data);
        return Ok(());
    };

    let messenger = TelegramMessenger::new(bot);
    process(
        &state,
        &messenger,
        origin(&q.from, chat_id),
        Input::Callback(action),
        today(),
    )
    .await?;

    Ok(())
}

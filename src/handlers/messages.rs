use teloxide::prelude::*;

use crate::bot_state::BotState;
use crate::conversation::Input;
use crate::handlers::utils::UNKNOWN_COMMAND_TEXT;
use crate::handlers::{origin, process, today, HandlerResult};
use crate::messenger::TelegramMessenger;

pub async fn message_handler(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };

    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Пожалуйста, отправьте текстовое сообщение.")
            .await?;
        return Ok(());
    };

    // Известные команды уже разобраны в command_handler
    if text.starts_with('/') {
        bot.send_message(msg.chat.id, UNKNOWN_COMMAND_TEXT).await?;
        return Ok(());
    }

    let messenger = TelegramMessenger::new(bot);
    process(
        &state,
        &messenger,
        origin(from, msg.chat.id),
        Input::Text(text.to_string()),
        today(),
    )
    .await?;

    Ok(())
}

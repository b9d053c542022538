use teloxide::prelude::*;

use crate::bot_state::BotState;
use crate::conversation::Input;
use crate::handlers::{origin, process, today, HandlerResult};
use crate::messenger::TelegramMessenger;
use crate::Command;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: BotState,
) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };

    log::debug!("📨 Command {:?} from user {}", cmd, from.id);
    let messenger = TelegramMessenger::new(bot);
    process(
        &state,
        &messenger,
        origin(from, msg.chat.id),
        Input::Command(cmd),
        today(),
    )
    .await?;

    Ok(())
}

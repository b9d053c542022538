use std::env;
use std::sync::Arc;
use std::time::Duration;
use teloxide::{prelude::*, utils::command::BotCommands};
use tokio::time;

mod bot_state;
mod config;
mod conversation;
mod database;
mod handlers;
mod messenger;
mod models;
mod recurrence;
mod scheduler;

use crate::bot_state::BotState;
use crate::config::Config;
use crate::database::Database;
use crate::handlers::{callback_handler, command_handler, message_handler};
use crate::messenger::TelegramMessenger;
use crate::scheduler::Scheduler;

/// Раз в сколько секунд убираем забытые диалоги и старые отметки
const HOUSEKEEPING_SECS: u64 = 600;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "запустить бота и показать главное меню")]
    Start,
    #[command(description = "показать справку по командам")]
    Help,
    #[command(description = "добавить новое событие")]
    Add,
    #[command(description = "показать список ваших событий")]
    List,
    #[command(description = "настройки уведомлений")]
    Settings,
    #[command(description = "пропустить описание события")]
    Skip,
    #[command(description = "отменить текущее действие")]
    Cancel,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Загружаем .env и инициализируем логирование
    dotenvy::dotenv().ok();
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
    log::info!("Starting reminder bot with PostgreSQL...");

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url, &config.default_notify_time).await?;
    db.init().await?;
    log::info!("✅ Database initialized");

    let bot = Bot::new(&config.bot_token);
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("⚠️ Failed to register bot commands: {}", e);
    }

    let state = BotState::new(Arc::new(db));
    let scheduler = Scheduler::new(state.store.clone(), Arc::new(TelegramMessenger::new(bot.clone())));

    // Напоминания по времени пользователя
    let timer_scheduler = scheduler.clone();
    let tick = config.notify_tick;
    tokio::spawn(async move {
        scheduler::notification_loop(timer_scheduler, tick).await;
    });

    // Полный проход при старте
    let catch_all_interval = config.catch_all_interval;
    tokio::spawn(async move {
        scheduler::catch_all_loop(scheduler, catch_all_interval).await;
    });

    // Фоновая уборка
    let state_clone = state.clone();
    let conversation_ttl = config.conversation_ttl;
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(HOUSEKEEPING_SECS));
        loop {
            interval.tick().await;
            state_clone.cleanup(conversation_ttl, handlers::today()).await;
        }
    });

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

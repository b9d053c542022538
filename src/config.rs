use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

use crate::recurrence::parse_notify_hour;

const DEFAULT_NOTIFY_TIME: &str = "09:00";
const DEFAULT_NOTIFY_TICK_SECS: u64 = 60;
const DEFAULT_CONVERSATION_TTL_SECS: u64 = 24 * 60 * 60;

/// Настройки процесса из переменных окружения (и .env)
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_url: String,
    pub default_notify_time: String,
    pub notify_tick: Duration,
    /// `None`: полный проход только при старте
    pub catch_all_interval: Option<Duration>,
    pub conversation_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("TELOXIDE_TOKEN")
            .or_else(|| lookup("BOT_TOKEN"))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("TELOXIDE_TOKEN or BOT_TOKEN must be set"))?;

        let database_url = lookup("DATABASE_URL")
            .filter(|u| !u.is_empty())
            .ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let raw_time = lookup("DEFAULT_NOTIFY_TIME").unwrap_or_else(|| DEFAULT_NOTIFY_TIME.to_string());
        let default_notify_time = parse_notify_hour(&raw_time)
            .with_context(|| format!("invalid DEFAULT_NOTIFY_TIME: {}", raw_time))?;

        let secs = |key: &str, default: u64| -> u64 {
            match lookup(key).map(|v| v.trim().parse::<u64>()) {
                Some(Ok(value)) => value,
                Some(Err(_)) => {
                    log::warn!("⚠️ {} is not a number, using {}", key, default);
                    default
                }
                None => default,
            }
        };

        let notify_tick = Duration::from_secs(secs("NOTIFY_TICK_SECS", DEFAULT_NOTIFY_TICK_SECS).max(1));
        let catch_all_interval = match secs("CATCH_ALL_INTERVAL_SECS", 0) {
            0 => None,
            n => Some(Duration::from_secs(n)),
        };
        let conversation_ttl =
            Duration::from_secs(secs("CONVERSATION_TTL_SECS", DEFAULT_CONVERSATION_TTL_SECS));

        Ok(Config {
            bot_token,
            database_url,
            default_notify_time,
            notify_tick,
            catch_all_interval,
            conversation_ttl,
        })
    }
}

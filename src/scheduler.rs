use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, Timelike};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::database::{NotificationKind, Store, StoreResult};
use crate::messenger::Messenger;
use crate::models::{Event, User};
use crate::recurrence::{days_until_next_occurrence, is_due, notification_window};

/// Дольше суток минуты не догоняем: такие пропуски закрывает полный проход при старте
const MAX_CATCH_UP_MINUTES: i64 = 24 * 60;

/// Итог одного прохода планировщика
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub checked: usize,
    pub sent: usize,
    pub skipped_duplicates: usize,
    pub failed: usize,
}

/// Текст напоминания
pub fn notification_text(event: &Event, days_left: u32) -> String {
    let mut text = if days_left == 0 {
        format!("🎉 Сегодня: {} ({})", event.title, event.kind.label())
    } else {
        format!(
            "🔔 Через {} дн.: {} ({})",
            days_left,
            event.title,
            event.kind.label()
        )
    };
    if !event.description.is_empty() {
        text.push('\n');
        text.push_str(&event.description);
    }
    text
}

#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn Store>,
    messenger: Arc<dyn Messenger>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn Store>, messenger: Arc<dyn Messenger>) -> Self {
        Self { store, messenger }
    }

    /// Пользователи, у которых сейчас время уведомлений, и все их события
    pub async fn run_timer_pass(&self, now: NaiveDateTime) -> StoreResult<PassReport> {
        let today = now.date();
        let notify_time = now.format("%H:%M").to_string();
        let mut report = PassReport::default();

        let users = self.store.list_users_with_notify_time(&notify_time).await?;
        for user in users {
            let events = match self.store.list_events_by_user(user.id).await {
                Ok(events) => events,
                Err(e) => {
                    log::error!("Error loading events for user {}: {}", user.id, e);
                    report.failed += 1;
                    continue;
                }
            };

            for event in &events {
                self.consider(&user, event, today, &mut report).await;
            }
        }

        Ok(report)
    }

    /// Все события в окне ближайших дней, независимо от времени пользователя
    pub async fn run_catch_all(&self, today: NaiveDate) -> StoreResult<PassReport> {
        let mut report = PassReport::default();
        let mut owners: HashMap<i64, Option<User>> = HashMap::new();

        let events = self
            .store
            .list_events_in_window(&notification_window(today))
            .await?;

        for event in &events {
            let owner = match owners.get(&event.user_id) {
                Some(owner) => owner.clone(),
                None => {
                    let owner = match self.store.get_user(event.user_id).await {
                        Ok(owner) => owner,
                        Err(e) => {
                            log::error!("Error loading owner of event {}: {}", event.id, e);
                            report.failed += 1;
                            continue;
                        }
                    };
                    owners.insert(event.user_id, owner.clone());
                    owner
                }
            };

            match owner {
                Some(user) => self.consider(&user, event, today, &mut report).await,
                None => log::warn!("⚠️ Event {} has no owner {}", event.id, event.user_id),
            }
        }

        Ok(report)
    }

    /// Проходит все непроверенные минуты по порядку. Возвращает последнюю
    /// успешно проверенную минуту; на ошибке хранилища останавливается,
    /// чтобы следующий тик повторил оставшиеся минуты.
    pub async fn catch_up(
        &self,
        last: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> (Option<NaiveDateTime>, PassReport) {
        let mut cursor = last;
        let mut total = PassReport::default();

        for minute in pending_minutes(last, now) {
            match self.run_timer_pass(minute).await {
                Ok(report) => {
                    total.checked += report.checked;
                    total.sent += report.sent;
                    total.skipped_duplicates += report.skipped_duplicates;
                    total.failed += report.failed;
                    cursor = Some(minute);
                }
                Err(e) => {
                    log::error!("Timer pass for {} failed: {}", minute.format("%H:%M"), e);
                    break;
                }
            }
        }

        (cursor, total)
    }

    async fn consider(&self, user: &User, event: &Event, today: NaiveDate, report: &mut PassReport) {
        report.checked += 1;

        let days_left = days_until_next_occurrence(event.event_date, today);
        if !is_due(days_left, event.notify_days) {
            return;
        }

        let kind = if days_left == 0 {
            NotificationKind::Today
        } else {
            NotificationKind::Ahead
        };

        // Отправляет только тот, кто первым поставил отметку
        match self.store.mark_notified(event.id, today, kind).await {
            Ok(true) => {}
            Ok(false) => {
                report.skipped_duplicates += 1;
                return;
            }
            Err(e) => {
                log::error!("Error marking event {} as notified: {}", event.id, e);
                report.failed += 1;
                return;
            }
        }

        let text = notification_text(event, days_left);
        match self.messenger.send_text(user.telegram_id, &text, None).await {
            Ok(()) => {
                report.sent += 1;
                log::info!("🔔 Reminder for event {} sent to user {}", event.id, user.id);
            }
            Err(e) => {
                report.failed += 1;
                log::error!("Error sending reminder for event {} to user {}: {}", event.id, user.id, e);
            }
        }
    }
}

fn start_of_minute(moment: NaiveDateTime) -> NaiveDateTime {
    moment
        .date()
        .and_hms_opt(moment.hour(), moment.minute(), 0)
        .unwrap_or(moment)
}

/// Минуты, которые ещё не проверены: всё после `last` до текущей включительно
pub fn pending_minutes(last: Option<NaiveDateTime>, now: NaiveDateTime) -> Vec<NaiveDateTime> {
    let current = start_of_minute(now);
    let last = match last {
        None => return vec![current],
        Some(last) if last == current => return Vec::new(),
        // часы ушли назад
        Some(last) if last > current => return vec![current],
        Some(last) => last.max(current - ChronoDuration::minutes(MAX_CATCH_UP_MINUTES)),
    };

    let mut minutes = Vec::new();
    let mut minute = last + ChronoDuration::minutes(1);
    while minute <= current {
        minutes.push(minute);
        minute += ChronoDuration::minutes(1);
    }
    minutes
}

/// Проход по таймеру, раз в `tick`. Пропущенные минуты догоняются.
pub async fn notification_loop(scheduler: Scheduler, tick: Duration) {
    let mut interval = time::interval(tick);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
    let mut last_minute: Option<NaiveDateTime> = None;

    loop {
        interval.tick().await;

        let now = Local::now().naive_local();
        let (cursor, report) = scheduler.catch_up(last_minute, now).await;
        last_minute = cursor;

        if report.sent > 0 || report.failed > 0 {
            log::info!("⏰ Timer pass at {}: {:?}", now.format("%H:%M"), report);
        }
    }
}

/// Полный проход при старте и, если задан интервал, периодически
pub async fn catch_all_loop(scheduler: Scheduler, every: Option<Duration>) {
    run_catch_all_once(&scheduler).await;

    let Some(every) = every else {
        return;
    };

    let mut interval = time::interval(every);
    // первый тик срабатывает сразу, а проход только что был
    interval.tick().await;
    loop {
        interval.tick().await;
        run_catch_all_once(&scheduler).await;
    }
}

async fn run_catch_all_once(scheduler: &Scheduler) {
    let today = Local::now().date_naive();
    match scheduler.run_catch_all(today).await {
        Ok(report) => log::info!("📋 Catch-all pass for {}: {:?}", today, report),
        Err(e) => log::error!("Catch-all pass failed: {}", e),
    }
}

use chrono::{Datelike, Duration, NaiveDate};
use thiserror::Error;

/// Максимальный срок напоминания в днях
pub const MAX_NOTIFY_DAYS: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("неверный формат даты, используйте ДД.ММ.ГГГГ")]
    InvalidFormat,
    #[error("неверный день")]
    InvalidDay,
    #[error("неверный месяц")]
    InvalidMonth,
    #[error("неверный год")]
    InvalidYear,
    #[error("несуществующая дата")]
    NonexistentDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("неверный формат времени, используйте ЧЧ:ММ")]
    InvalidFormat,
    #[error("неверный час (0-23)")]
    InvalidHour,
    #[error("неверная минута (0-59)")]
    InvalidMinute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotifyDaysError {
    #[error("это не число")]
    NotANumber,
    #[error("число должно быть от 1 до 30")]
    OutOfRange,
}

/// Разбор даты, введённой пользователем в формате ДД.ММ.ГГГГ
pub fn parse_entry_date(text: &str) -> Result<NaiveDate, DateError> {
    let parts: Vec<&str> = text.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(DateError::InvalidFormat);
    }

    let day = parts[0]
        .parse::<u32>()
        .ok()
        .filter(|d| (1..=31).contains(d))
        .ok_or(DateError::InvalidDay)?;
    let month = parts[1]
        .parse::<u32>()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or(DateError::InvalidMonth)?;
    let year = parts[2]
        .parse::<i32>()
        .ok()
        .filter(|y| (1900..=2100).contains(y))
        .ok_or(DateError::InvalidYear)?;

    // 31.02 и подобные: компоненты построенной даты должны совпасть с введёнными
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::NonexistentDate)?;
    if date.day() != day || date.month() != month || date.year() != year {
        return Err(DateError::NonexistentDate);
    }
    Ok(date)
}

/// Дата для показа пользователю: ДД.ММ.ГГГГ
pub fn to_display(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Дата ежегодного события в заданном году.
/// 29 февраля в невисокосном году переносится на 1 марта.
pub fn occurrence_in_year(date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(date)
}

/// Сколько полных дней до ближайшего (сегодня или позже) повторения события
pub fn days_until_next_occurrence(date: NaiveDate, today: NaiveDate) -> u32 {
    let mut next = occurrence_in_year(date, today.year());
    if next < today {
        next = occurrence_in_year(date, today.year() + 1);
    }
    (next - today).num_days().max(0) as u32
}

/// Событие подлежит уведомлению сегодня: либо оно сегодня, либо осталось ровно `notify_days`
pub fn is_due(days_left: u32, notify_days: u8) -> bool {
    days_left == 0 || days_left == u32::from(notify_days)
}

/// Разбор времени уведомлений ЧЧ:ММ с приведением к двузначному виду
pub fn parse_notify_hour(text: &str) -> Result<String, TimeError> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() != 2 {
        return Err(TimeError::InvalidFormat);
    }

    let hour = parts[0]
        .parse::<u32>()
        .ok()
        .filter(|h| *h <= 23)
        .ok_or(TimeError::InvalidHour)?;
    let minute = parts[1]
        .parse::<u32>()
        .ok()
        .filter(|m| *m <= 59)
        .ok_or(TimeError::InvalidMinute)?;

    Ok(format!("{:02}:{:02}", hour, minute))
}

/// Разбор количества дней для напоминания (1..=30)
pub fn parse_notify_days(text: &str) -> Result<u8, NotifyDaysError> {
    let days = text
        .trim()
        .parse::<i64>()
        .map_err(|_| NotifyDaysError::NotANumber)?;
    if !(1..=i64::from(MAX_NOTIFY_DAYS)).contains(&days) {
        return Err(NotifyDaysError::OutOfRange);
    }
    Ok(days as u8)
}

/// Ключи ММ-ДД для всех дней от сегодня до сегодня + 30.
/// Грубое окно для выборки событий, которые могут наступить в пределах срока напоминания.
pub fn notification_window(today: NaiveDate) -> Vec<String> {
    let mut keys = Vec::with_capacity(usize::from(MAX_NOTIFY_DAYS) + 2);
    for offset in 0..=i64::from(MAX_NOTIFY_DAYS) {
        let day = today + Duration::days(offset);
        keys.push(day.format("%m-%d").to_string());
        if day.month() == 3 && day.day() == 1 && !is_leap_year(day.year()) {
            keys.push("02-29".to_string());
        }
    }
    keys
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

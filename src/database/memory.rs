//! Хранилище в памяти для тестов диалога и планировщика.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::store::{NotificationKind, Store, StoreError, StoreResult};
use crate::models::{Event, EventDraft, Profile, User};

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    events: BTreeMap<i64, Event>,
    notified: HashMap<(i64, NaiveDate), NotificationKind>,
    next_user_id: i64,
    next_event_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Все операции начнут возвращать ошибку БД
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().unwrap().events.values().cloned().collect()
    }

    pub fn notified(&self) -> Vec<(i64, NaiveDate, NotificationKind)> {
        let inner = self.inner.lock().unwrap();
        let mut marks: Vec<_> = inner
            .notified
            .iter()
            .map(|((event_id, day), kind)| (*event_id, *day, *kind))
            .collect();
        marks.sort_by_key(|(event_id, day, _)| (*event_id, *day));
        marks
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, telegram_id: i64, profile: &Profile) -> StoreResult<i64> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.values_mut().find(|u| u.telegram_id == telegram_id) {
            user.username = profile.username.clone();
            user.first_name = profile.first_name.clone();
            user.last_name = profile.last_name.clone();
            return Ok(user.id);
        }

        inner.next_user_id += 1;
        let id = inner.next_user_id;
        inner.users.insert(
            id,
            User {
                id,
                telegram_id,
                username: profile.username.clone(),
                first_name: profile.first_name.clone(),
                last_name: profile.last_name.clone(),
                notify_time: "09:00".to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get_user_by_identity(&self, telegram_id: i64) -> StoreResult<Option<User>> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.telegram_id == telegram_id).cloned())
    }

    async fn get_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        self.check()?;
        Ok(self.inner.lock().unwrap().users.get(&user_id).cloned())
    }

    async fn set_user_notify_time(&self, user_id: i64, notify_time: &str) -> StoreResult<()> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let user = inner.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        user.notify_time = notify_time.to_string();
        Ok(())
    }

    async fn create_event(&self, user_id: i64, draft: &EventDraft) -> StoreResult<i64> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        if !inner.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }

        inner.next_event_id += 1;
        let id = inner.next_event_id;
        inner.events.insert(
            id,
            Event {
                id,
                user_id,
                title: draft.title.clone(),
                kind: draft.kind,
                event_date: draft.event_date,
                notify_days: draft.notify_days,
                description: draft.description.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get_event(&self, event_id: i64) -> StoreResult<Option<Event>> {
        self.check()?;
        Ok(self.inner.lock().unwrap().events.get(&event_id).cloned())
    }

    async fn update_event(&self, event: &Event) -> StoreResult<()> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let stored = inner.events.get_mut(&event.id).ok_or(StoreError::NotFound)?;
        *stored = event.clone();
        Ok(())
    }

    async fn delete_event(&self, event_id: i64) -> StoreResult<()> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.events.remove(&event_id);
        inner.notified.retain(|(id, _), _| *id != event_id);
        Ok(())
    }

    async fn list_events_by_user(&self, user_id: i64) -> StoreResult<Vec<Event>> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        let mut events: Vec<Event> = inner
            .events
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            (a.event_date.month(), a.event_date.day(), &a.title)
                .cmp(&(b.event_date.month(), b.event_date.day(), &b.title))
        });
        Ok(events)
    }

    async fn list_events_in_window(&self, month_days: &[String]) -> StoreResult<Vec<Event>> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .values()
            .filter(|e| month_days.contains(&e.event_date.format("%m-%d").to_string()))
            .cloned()
            .collect())
    }

    async fn list_users_with_notify_time(&self, notify_time: &str) -> StoreResult<Vec<User>> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .values()
            .filter(|u| u.notify_time == notify_time)
            .cloned()
            .collect())
    }

    async fn mark_notified(&self, event_id: i64, day: NaiveDate, kind: NotificationKind) -> StoreResult<bool> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        if inner.notified.contains_key(&(event_id, day)) {
            return Ok(false);
        }
        inner.notified.insert((event_id, day), kind);
        Ok(true)
    }

    async fn prune_notifications(&self, before: NaiveDate) -> StoreResult<u64> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        let previous = inner.notified.len();
        inner.notified.retain(|(_, day), _| *day >= before);
        Ok((previous - inner.notified.len()) as u64)
    }
}

pub mod action;
pub mod machine;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::models::ConversationState;
pub use action::{Action, Effect, Input, Reply};
pub use machine::advance;

struct Entry {
    state: ConversationState,
    touched: Instant,
}

type Entries = Arc<RwLock<HashMap<i64, Arc<Mutex<Entry>>>>>;

/// Состояния диалогов по telegram_id. Изменения одного пользователя
/// выполняются под его собственным мьютексом.
#[derive(Clone, Default)]
pub struct ConversationTable {
    entries: Entries,
}

impl ConversationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Запись пользователя, уже захваченная. Блокировка берётся под защитой карты,
    /// поэтому `evict_idle` не может убрать запись между поиском и захватом.
    async fn lock_entry(&self, user: i64) -> OwnedMutexGuard<Entry> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&user) {
                return entry.clone().lock_owned().await;
            }
        }

        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(user)
            .or_insert_with(|| {
                Arc::new(Mutex::new(Entry {
                    state: ConversationState::Default,
                    touched: Instant::now(),
                }))
            })
            .clone();
        entry.lock_owned().await
    }

    /// Прочитать состояние, применить ввод и сохранить результат одной операцией
    pub async fn advance(&self, user: i64, input: Input) -> Vec<Effect> {
        let mut entry = self.lock_entry(user).await;

        let previous = entry.state.step();
        let transition = advance(std::mem::take(&mut entry.state), input);
        log::debug!("💬 User {}: {:?} -> {:?}", user, previous, transition.next.step());

        entry.state = transition.next;
        entry.touched = Instant::now();
        transition.effects
    }

    pub async fn reset(&self, user: i64) {
        let mut entry = self.lock_entry(user).await;
        entry.state = ConversationState::Default;
        entry.touched = Instant::now();
    }

    /// Убирает записи, к которым давно не обращались. Занятые записи не трогаем.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut entries = self.entries.write().await;
        let previous = entries.len();

        entries.retain(|_, entry| match entry.try_lock() {
            Ok(entry) => entry.touched.elapsed() < max_idle,
            Err(_) => true,
        });

        previous - entries.len()
    }

    #[cfg(test)]
    pub async fn state(&self, user: i64) -> ConversationState {
        let entries = self.entries.read().await;
        match entries.get(&user) {
            Some(entry) => entry.lock().await.state.clone(),
            None => ConversationState::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Step;
    use crate::Command;

    #[tokio::test]
    async fn unknown_user_starts_in_default() {
        let table = ConversationTable::new();
        assert_eq!(table.state(42).await, ConversationState::Default);
    }

    #[tokio::test]
    async fn users_do_not_share_state() {
        let table = ConversationTable::new();
        table.advance(1, Input::Command(Command::Add)).await;
        table.advance(2, Input::Command(Command::Settings)).await;

        assert_eq!(table.state(1).await.step(), Step::AddTitle);
        assert_eq!(table.state(2).await.step(), Step::Default);
    }

    #[tokio::test]
    async fn concurrent_inputs_for_one_user_are_serialized() {
        let table = ConversationTable::new();
        table.advance(7, Input::Command(Command::Add)).await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let table = table.clone();
            handles.push(tokio::spawn(async move {
                table.advance(7, Input::Text(format!("title {}", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // первый ввод задал название, остальные упёрлись в выбор типа
        match table.state(7).await {
            ConversationState::AddType { title } => assert!(title.starts_with("title ")),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn reset_drops_scratch() {
        let table = ConversationTable::new();
        table.advance(3, Input::Command(Command::Add)).await;
        table.advance(3, Input::Text("Встреча выпускников".to_string())).await;

        table.reset(3).await;
        assert_eq!(table.state(3).await, ConversationState::Default);
    }

    #[tokio::test]
    async fn idle_entries_are_evicted() {
        let table = ConversationTable::new();
        table.advance(5, Input::Command(Command::Add)).await;

        assert_eq!(table.evict_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(table.evict_idle(Duration::ZERO).await, 1);
        assert_eq!(table.state(5).await, ConversationState::Default);
    }

    #[tokio::test]
    async fn entry_in_use_survives_eviction() {
        let table = ConversationTable::new();
        table.advance(6, Input::Command(Command::Add)).await;

        let guard = table.lock_entry(6).await;
        assert_eq!(table.evict_idle(Duration::ZERO).await, 0);
        drop(guard);

        table.advance(6, Input::Text("Свадьба".to_string())).await;
        assert_eq!(table.state(6).await.step(), Step::AddType);
    }
}

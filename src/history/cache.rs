use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::RwLock;

use super::{ group_messages, HistoryError };
use crate::models::chat::Conversation;
use crate::store::RecordStore;

/// Grouped chat history per agent.
///
/// Each agent's most recent message page is fetched once, grouped, and reused
/// until the caller refreshes it or a realtime notification invalidates it.
pub struct ChatHistory {
    store: Arc<dyn RecordStore>,
    page_size: usize,
    cache: RwLock<HashMap<String, Arc<Vec<Conversation>>>>,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn RecordStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The agent's conversations, newest first. Served from cache when a
    /// previous fetch is still valid.
    pub async fn conversations(
        &self,
        agent_id: &str
    ) -> Result<Arc<Vec<Conversation>>, HistoryError> {
        if let Some(cached) = self.cache.read().await.get(agent_id) {
            debug!("history cache hit for agent {}", agent_id);
            return Ok(cached.clone());
        }
        self.refresh(agent_id).await
    }

    /// Refetch the agent's message page and replace the cached grouping.
    pub async fn refresh(&self, agent_id: &str) -> Result<Arc<Vec<Conversation>>, HistoryError> {
        let messages = self.store.list_messages(agent_id, self.page_size).await?;
        debug!("grouping {} messages for agent {}", messages.len(), agent_id);
        let grouped = Arc::new(group_messages(&messages)?);
        self.cache.write().await.insert(agent_id.to_string(), grouped.clone());
        Ok(grouped)
    }

    /// Drop the cached entry for an agent. Call this when the store signals
    /// a change to the agent's history (e.g., a realtime update).
    pub async fn invalidate(&self, agent_id: &str) {
        self.cache.write().await.remove(agent_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;
    use crate::store::memory::MemoryRecordStore;

    fn store_with_message(id: &str, created: &str) -> Arc<MemoryRecordStore> {
        let store = Arc::new(MemoryRecordStore::new());
        store.seed_message("agent1", id, "c1", Role::User, "hi", created);
        store
    }

    #[tokio::test]
    async fn caches_until_invalidated() {
        let store = store_with_message("m1", "2024-01-01 10:00:00.000Z");
        let history = ChatHistory::new(store.clone(), 500);

        let first = history.conversations("agent1").await.unwrap();
        assert_eq!(first[0].messages.len(), 1);

        // A write that lands after the fetch is not visible until the entry
        // is invalidated.
        store.seed_message("agent1", "m2", "c1", Role::Assistant, "hello", "2024-01-01 10:00:05.000Z");
        let cached = history.conversations("agent1").await.unwrap();
        assert_eq!(cached[0].messages.len(), 1);

        history.invalidate("agent1").await;
        let fresh = history.conversations("agent1").await.unwrap();
        assert_eq!(fresh[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn refresh_bypasses_the_cache() {
        let store = store_with_message("m1", "2024-01-01 10:00:00.000Z");
        let history = ChatHistory::new(store.clone(), 500);

        history.conversations("agent1").await.unwrap();
        store.seed_message("agent1", "m2", "c2", Role::User, "new chat", "2024-01-02 09:00:00.000Z");

        let refreshed = history.refresh("agent1").await.unwrap();
        assert_eq!(refreshed.len(), 2);
        assert_eq!(refreshed[0].id, "c2");

        // The refreshed grouping replaces the cached entry.
        let cached = history.conversations("agent1").await.unwrap();
        assert_eq!(cached.len(), 2);
    }

    #[tokio::test]
    async fn respects_the_page_size_cap() {
        let store = Arc::new(MemoryRecordStore::new());
        for i in 0..6 {
            store.seed_message(
                "agent1",
                &format!("m{}", i),
                "c1",
                Role::User,
                "msg",
                &format!("2024-01-01 10:00:0{}.000Z", i)
            );
        }

        let history = ChatHistory::new(store, 4);
        let conversations = history.conversations("agent1").await.unwrap();
        // The page keeps the 4 most recent messages.
        let ids: Vec<&str> = conversations[0].messages
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["m2", "m3", "m4", "m5"]);
    }

    #[tokio::test]
    async fn agents_are_cached_independently() {
        let store = store_with_message("m1", "2024-01-01 10:00:00.000Z");
        store.seed_message("agent2", "m2", "c9", Role::User, "other", "2024-01-03 10:00:00.000Z");
        let history = ChatHistory::new(store, 500);

        let first = history.conversations("agent1").await.unwrap();
        let second = history.conversations("agent2").await.unwrap();
        assert_eq!(first[0].id, "c1");
        assert_eq!(second[0].id, "c9");
    }
}

// In-memory implementation of CommunityStore.
// Used when no database is configured and by tests.

use crate::core::community::{CommunityError, CommunityMessage, CommunityStore};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Message history kept in insertion order.
#[derive(Default)]
pub struct InMemoryCommunityStore {
    messages: RwLock<Vec<CommunityMessage>>,
}

impl InMemoryCommunityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommunityStore for InMemoryCommunityStore {
    async fn post_message(&self, message: &CommunityMessage) -> Result<(), CommunityError> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<CommunityMessage>, CommunityError> {
        let messages = self.messages.read().await;
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn message_count(&self) -> Result<usize, CommunityError> {
        Ok(self.messages.read().await.len())
    }

    async fn prune(&self, keep: usize) -> Result<u64, CommunityError> {
        let mut messages = self.messages.write().await;
        let excess = messages.len().saturating_sub(keep);
        messages.drain(..excess);
        Ok(excess as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryCommunityStore::new();
        assert_eq!(store.message_count().await.unwrap(), 0);

        for text in ["a", "b", "c"] {
            store
                .post_message(&CommunityMessage::new("You", "👤", text))
                .await
                .unwrap();
        }

        let latest = store.recent_messages(2).await.unwrap();
        assert_eq!(latest[0].text, "b");
        assert_eq!(latest[1].text, "c");

        assert_eq!(store.prune(1).await.unwrap(), 2);
        assert_eq!(store.message_count().await.unwrap(), 1);
    }
}

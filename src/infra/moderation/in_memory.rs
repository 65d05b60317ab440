// In-memory implementation of ModerationStore.
//
// Nothing survives a restart, so a ban issued here lasts only as long as the
// process. Good for tests and throwaway sessions.

use crate::core::moderation::{ModerationError, ModerationStore};
use dashmap::DashMap;

/// Key-value moderation record held in a `DashMap`.
#[derive(Debug, Default)]
pub struct InMemoryModerationStore {
    values: DashMap<String, String>,
}

impl InMemoryModerationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModerationStore for InMemoryModerationStore {
    fn get(&self, key: &str) -> Result<Option<String>, ModerationError> {
        // get() hands back a guard; clone the value out before it drops
        Ok(self.values.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ModerationError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ModerationError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryModerationStore::new();

        // Missing key reads as None
        assert_eq!(store.get("violationCount").unwrap(), None);

        store.set("violationCount", "2").unwrap();
        assert_eq!(store.get("violationCount").unwrap().as_deref(), Some("2"));

        // Overwrite
        store.set("violationCount", "0").unwrap();
        assert_eq!(store.get("violationCount").unwrap().as_deref(), Some("0"));

        // Remove is idempotent
        store.remove("violationCount").unwrap();
        store.remove("violationCount").unwrap();
        assert_eq!(store.get("violationCount").unwrap(), None);
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::mock_behaviour::MockBehaviour;
use crate::storage::StorageError;
use crate::traits::KeyValueStorage;

/// A storage that only lives in memory.
///
/// Clones share the same contents, so that a test can keep a handle to a storage it has given to a store.
/// Failures can be injected with a [`MockBehaviour`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    mock_behaviour: Arc<Mutex<MockBehaviour>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_mock_behaviour(mock_behaviour: Arc<Mutex<MockBehaviour>>) -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
            mock_behaviour,
        }
    }

    /// Create a storage that already contains `value` at `key`
    pub fn with_item(key: &str, value: &str) -> Self {
        let storage = Self::new();
        if let Ok(mut items) = storage.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
        storage
    }

    /// Read a value without going through the (possibly failing) mocked behaviour
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn check(&self, allowed: impl FnOnce(&mut MockBehaviour) -> Result<(), String>) -> Result<(), StorageError> {
        let mut behaviour = self.mock_behaviour.lock()
            .map_err(|_| StorageError::Backend("mock behaviour lock is poisoned".to_string()))?;
        allowed(&mut behaviour).map_err(StorageError::Backend)
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.items.lock()
            .map_err(|_| StorageError::Backend("storage lock is poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check(MockBehaviour::can_get_item)?;
        Ok(self.items()?.get(key).cloned())
    }

    async fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check(MockBehaviour::can_set_item)?;
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.check(MockBehaviour::can_remove_item)?;
        self.items()?.remove(key);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_contents() {
        let mut storage = MemoryStorage::new();
        let observer = storage.clone();

        assert_eq!(storage.get_item("tasks").await.unwrap(), None);
        storage.set_item("tasks", "{}").await.unwrap();
        assert_eq!(observer.peek("tasks"), Some("{}".to_string()));
        storage.remove_item("tasks").await.unwrap();
        storage.remove_item("tasks").await.unwrap();
        assert_eq!(observer.peek("tasks"), None);
    }

    #[tokio::test]
    async fn injected_failures() {
        let behaviour = Arc::new(Mutex::new(MockBehaviour {
            set_item_behaviour: (1, 1),
            ..MockBehaviour::default()
        }));
        let mut storage = MemoryStorage::new_with_mock_behaviour(behaviour);

        assert!(storage.set_item("tasks", "first").await.is_ok());
        assert!(matches!(storage.set_item("tasks", "second").await, Err(StorageError::Backend(_))));
        assert_eq!(storage.peek("tasks"), Some("first".to_string()));
        assert!(storage.set_item("tasks", "third").await.is_ok());
        assert_eq!(storage.get_item("tasks").await.unwrap(), Some("third".to_string()));
    }
}

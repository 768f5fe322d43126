use std::collections::HashMap;
use std::sync::Mutex;
use crate::history::{ PersistenceError, SessionStorage };

/// Key-value storage that lives as long as the hosting process, which is
/// the browsing session of the console host.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_items<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> T
    ) -> Result<T, PersistenceError> {
        let mut items = self.items
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory storage lock poisoned".into()))?;
        Ok(f(&mut items))
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.with_items(|items| items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.with_items(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistenceError> {
        self.with_items(|items| {
            items.remove(key);
        })
    }
}

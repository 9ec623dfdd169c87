//! In-memory token storage.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::TokenKey;
use crate::domain::ports::{TokenStorage, TokenStorageError};

/// Process-local token storage that forgets everything on drop.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    slots: Mutex<BTreeMap<TokenKey, String>>,
}

impl MemoryTokenStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no token is stored.
    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    fn slots(&self) -> MutexGuard<'_, BTreeMap<TokenKey, String>> {
        // Slot values are replaced whole, so a poisoned map is still consistent.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn read(&self, key: TokenKey) -> Result<Option<String>, TokenStorageError> {
        Ok(self.slots().get(&key).cloned())
    }

    fn write(&self, key: TokenKey, value: &str) -> Result<(), TokenStorageError> {
        self.slots().insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> Result<(), TokenStorageError> {
        self.slots().remove(&key);
        Ok(())
    }
}

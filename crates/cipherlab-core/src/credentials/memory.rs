use super::CredentialStore;
use crate::{LabError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-local store, used in tests and when no database is wanted.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_users(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.users.lock().map_err(|_| LabError::Database {
            message: "Failed to acquire credential store lock".to_string(),
            source: None,
        })
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn exists(&self, username: &str) -> Result<bool> {
        Ok(self.lock_users()?.contains_key(username))
    }

    fn register(&self, username: &str, password_hash: &str) -> Result<()> {
        let mut users = self.lock_users()?;
        if users.contains_key(username) {
            return Err(LabError::UserExists {
                username: username.to_string(),
            });
        }
        users.insert(username.to_string(), password_hash.to_string());
        Ok(())
    }

    fn authenticate(&self, username: &str, password_hash: &str) -> Result<bool> {
        Ok(self
            .lock_users()?
            .get(username)
            .is_some_and(|stored| stored == password_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_authenticate() {
        let store = MemoryCredentialStore::new();
        store.register("dave", "h1").unwrap();
        assert!(store.exists("dave").unwrap());
        assert!(store.authenticate("dave", "h1").unwrap());
        assert!(!store.authenticate("dave", "h2").unwrap());
        assert!(!store.authenticate("erin", "h1").unwrap());
    }

    #[test]
    fn test_duplicate_rejected() {
        let store = MemoryCredentialStore::new();
        store.register("dave", "h1").unwrap();
        assert!(matches!(
            store.register("dave", "h2"),
            Err(LabError::UserExists { .. })
        ));
    }
}

//! Seam for the external identity/role service.
//!
//! The engine never authenticates anyone; it only consumes a resolved
//! numeric identifier when tagging stored reports. A missing account is a
//! normal `None`, not an error.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use storage::repository::StorageError;
use study_core::model::UserId;

/// Role attached to an account by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Teacher,
    Student,
}

/// A resolved account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRecord {
    pub uid: UserId,
    pub role: Role,
}

/// Contract the engine relies on for username resolution.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a stored username to its account record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the service is unavailable; an unknown
    /// username is `Ok(None)`.
    async fn resolve(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;
}

/// In-memory directory for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    users: Arc<Mutex<HashMap<String, UserRecord>>>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) an account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the directory lock is poisoned.
    pub fn insert(&self, username: &str, record: UserRecord) -> Result<(), StorageError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(username.to_owned(), record);
        Ok(())
    }
}

#[async_trait]
impl IdentityResolver for InMemoryDirectory {
    async fn resolve(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(username).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_usernames_resolve_to_their_record() {
        let directory = InMemoryDirectory::new();
        directory
            .insert(
                "ms-rivera",
                UserRecord {
                    uid: UserId::new(7),
                    role: Role::Teacher,
                },
            )
            .unwrap();

        let record = directory.resolve("ms-rivera").await.unwrap().unwrap();
        assert_eq!(record.uid, UserId::new(7));
        assert_eq!(record.role, Role::Teacher);
    }

    #[tokio::test]
    async fn unknown_usernames_are_a_normal_miss() {
        let directory = InMemoryDirectory::new();
        assert_eq!(directory.resolve("nobody").await.unwrap(), None);
    }
}

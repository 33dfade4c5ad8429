//! User credential storage.
//!
//! Stores only ever see the SHA-384 hex digest produced by
//! [`password_hash`]; plaintext passwords stop at the dispatcher.

mod memory;
mod sqlite;

pub use memory::MemoryCredentialStore;
pub use sqlite::SqliteCredentialStore;

use crate::Result;
use sha2::{Digest, Sha384};

/// Lowercase hex SHA-384 of the UTF-8 password.
pub fn password_hash(password: &str) -> String {
    hex::encode(Sha384::digest(password.as_bytes()))
}

/// Keyed username → password-hash table.
///
/// Implementations must make [`register`](Self::register) an atomic
/// check-and-insert: two concurrent registrations of the same name must not
/// both succeed.
pub trait CredentialStore: Send + Sync {
    /// Whether a user with this name exists.
    fn exists(&self, username: &str) -> Result<bool>;

    /// Add a user. Fails with [`LabError::UserExists`](crate::LabError::UserExists)
    /// if the name is taken.
    fn register(&self, username: &str, password_hash: &str) -> Result<()>;

    /// Check a username/hash pair. Unknown users and wrong hashes both
    /// return `Ok(false)`.
    fn authenticate(&self, username: &str, password_hash: &str) -> Result<bool>;
}

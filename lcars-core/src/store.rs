//! The injected key/value persistence contract.

use async_trait::async_trait;

use lcars_types::LcarsError;

/// Durable key/value store with atomic single-key operations.
///
/// Used for the progress list, migration state, open migration transactions,
/// and curated manual records. Values are opaque bytes; callers own the
/// serialization.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a key. `Ok(None)` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LcarsError>;

    /// Write a key atomically (last writer wins).
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), LcarsError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), LcarsError>;

    /// List keys with the given prefix, in unspecified order.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, LcarsError>;
}

//! Generic key/value persistence.
//!
//! Values are JSON documents. Collections are emulated on top by key
//! convention (`kind:{id}`) plus index keys, and enumerated with prefix scans.
//! Stores give no transactional guarantees: last writer wins.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::database::manager::DatabaseError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryKvStore;
pub use postgres::PgKvStore;

#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Value>, DatabaseError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), DatabaseError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, DatabaseError>;

    /// All entries whose key starts with `prefix`, ordered by key.
    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Typed helpers over any `KvStore`.
#[async_trait]
pub trait KvStoreExt: KvStore {
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.get(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| DatabaseError::Corrupt {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let value = serde_json::to_value(value)?;
        self.set(key, value).await
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

/// Escape `LIKE` wildcards so a prefix matches literally.
pub(crate) fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(like_prefix_pattern("request:"), "request:%");
        assert_eq!(like_prefix_pattern("user_email:"), "user\\_email:%");
        assert_eq!(like_prefix_pattern("50%\\"), "50\\%\\\\%");
    }
}

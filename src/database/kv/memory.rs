use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{fs, sync::RwLock};
use tracing::debug;

use super::KvStore;
use crate::database::manager::DatabaseError;

/// Ordered in-process map, optionally snapshotted to a JSON file.
///
/// With a snapshot path every write rewrites the whole file, so this suits
/// demos and single-node development, not large data sets.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    inner: Arc<RwLock<BTreeMap<String, Value>>>,
    file_path: Option<PathBuf>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the snapshot at `path`, creating an empty one if missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let file_path = path.as_ref().to_path_buf();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let map: BTreeMap<String, Value> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| DatabaseError::Corrupt {
                key: file_path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::write(&file_path, b"{}").await?;
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Loaded {} keys from {}", map.len(), file_path.display());
        Ok(Self {
            inner: Arc::new(RwLock::new(map)),
            file_path: Some(file_path),
        })
    }

    async fn save(&self, map: &BTreeMap<String, Value>) -> Result<(), DatabaseError> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let data = serde_json::to_vec_pretty(map)?;
        // Replace via rename so readers never see a half-written file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DatabaseError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), DatabaseError> {
        let mut map = self.inner.write().await;
        let previous = map.insert(key.to_string(), value);
        if let Err(e) = self.save(&map).await {
            // Keep memory in line with the last snapshot that reached disk
            match previous {
                Some(old) => map.insert(key.to_string(), old),
                None => map.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let mut map = self.inner.write().await;
        let Some(removed) = map.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.save(&map).await {
            map.insert(key.to_string(), removed);
            return Err(e);
        }
        Ok(true)
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, DatabaseError> {
        let map = self.inner.read().await;
        Ok(map
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn basic_crud() {
        let store = MemoryKvStore::new();
        assert!(store.get("user:1").await.unwrap().is_none());

        store.set("user:1", json!({"name": "a"})).await.unwrap();
        assert_eq!(store.get("user:1").await.unwrap(), Some(json!({"name": "a"})));

        store.set("user:1", json!({"name": "b"})).await.unwrap();
        assert_eq!(store.get("user:1").await.unwrap(), Some(json!({"name": "b"})));

        assert!(store.delete("user:1").await.unwrap());
        assert!(!store.delete("user:1").await.unwrap());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn prefix_scan_is_ordered_and_exact() {
        let store = MemoryKvStore::new();
        store.set("request:b", json!(2)).await.unwrap();
        store.set("request:a", json!(1)).await.unwrap();
        store.set("requests_by_user:x", json!([])).await.unwrap();
        store.set("req", json!(0)).await.unwrap();
        store.set("user:1", json!(3)).await.unwrap();

        let hits = store.get_by_prefix("request:").await.unwrap();
        let keys: Vec<_> = hits.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["request:a", "request:b"]);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("homeserve_kv_{}.json", Uuid::new_v4()));

        let store = MemoryKvStore::open(&tmp).await?;
        store.set("worker:1", json!({"verified": true})).await?;
        store.set("worker:2", json!({"verified": false})).await?;
        store.delete("worker:2").await?;

        let reopened = MemoryKvStore::open(&tmp).await?;
        assert_eq!(reopened.len().await, 1);
        assert_eq!(reopened.get("worker:1").await?, Some(json!({"verified": true})));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_snapshot_leaves_memory_untouched() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("homeserve_kv_{}", Uuid::new_v4()));
        let store = MemoryKvStore::open(dir.join("store.json")).await?;
        store.set("user:1", json!({"name": "a"})).await?;

        // Writes can no longer reach the snapshot
        tokio::fs::remove_dir_all(&dir).await?;

        assert!(store.set("user:1", json!({"name": "b"})).await.is_err());
        assert!(store.set("user:2", json!({"name": "c"})).await.is_err());
        assert!(store.delete("user:1").await.is_err());

        assert_eq!(store.get("user:1").await?, Some(json!({"name": "a"})));
        assert!(store.get("user:2").await?.is_none());
        assert_eq!(store.len().await, 1);
        Ok(())
    }
}

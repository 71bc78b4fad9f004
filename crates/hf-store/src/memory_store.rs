//! In-memory object storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::{ObjectStore, StoredObject, content_type_for, public_object_url, validate_key};

/// In-memory object store backed by a `RwLock<HashMap>`.
///
/// Useful for testing and for `--memory` runs. Tracks total bytes stored
/// against a configurable maximum.
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    max_bytes: u64,
    public_base: String,
}

impl MemoryObjectStore {
    /// Create a store whose public URLs are rooted at `public_base`.
    pub fn new(public_base: impl Into<String>, max_bytes: u64) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            max_bytes,
            public_base: public_base.into(),
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn used_bytes_unlocked(map: &HashMap<(String, String), StoredObject>) -> u64 {
        map.values().map(|o| o.data.len() as u64).sum()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), StoreError> {
        validate_key(bucket, key)?;

        let mut map = self.objects.write().expect("lock poisoned");
        let used = Self::used_bytes_unlocked(&map);
        let id = (bucket.to_string(), key.to_string());

        // Replacing an object frees its old size.
        let existing_len = map.get(&id).map_or(0, |o| o.data.len() as u64);
        let net_increase = (data.len() as u64).saturating_sub(existing_len);

        if used + net_increase > self.max_bytes {
            return Err(StoreError::CapacityExceeded {
                needed: net_increase,
                available: self.max_bytes.saturating_sub(used),
            });
        }

        debug!(bucket, key, size = data.len(), "storing object in memory");
        let content_type = content_type
            .unwrap_or_else(|| content_type_for(key))
            .to_string();
        map.insert(id, StoredObject { data, content_type });
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, StoreError> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(&(bucket.to_string(), key.to_string())).cloned())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        public_object_url(&self.public_base, bucket, key)
    }
}

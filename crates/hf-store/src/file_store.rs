//! File-based object storage backend.
//!
//! Stores one file per object at `{base_dir}/{bucket}/{key}`, where the
//! key's `/` separators become subdirectories. The content type given at
//! upload lives in a sidecar at `{base_dir}/.content-types/{bucket}/{key}`;
//! bucket names never contain a `.`, so the two trees cannot collide.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::{ObjectStore, StoredObject, content_type_for, public_object_url, validate_key};

/// File-based object store.
///
/// Writes are atomic: data is written to a sibling temporary file first,
/// then renamed into place, so a reader never sees a half-written image.
///
/// Objects uploaded without a content type are served with one guessed
/// from the key's extension.
pub struct FileObjectStore {
    base_dir: PathBuf,
    public_base: String,
}

impl FileObjectStore {
    /// Create a new file store rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(
        base_dir: impl AsRef<Path>,
        public_base: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            public_base: public_base.into(),
        })
    }

    /// Compute the full file path for an object.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(bucket, key)?;
        Ok(key_path(self.base_dir.join(bucket), key))
    }

    /// Path of the content-type sidecar for an already validated key.
    fn content_type_path(&self, bucket: &str, key: &str) -> PathBuf {
        key_path(self.base_dir.join(CONTENT_TYPE_DIR).join(bucket), key)
    }
}

const CONTENT_TYPE_DIR: &str = ".content-types";

fn key_path(mut path: PathBuf, key: &str) -> PathBuf {
    for segment in key.split('/') {
        path.push(segment);
    }
    path
}

/// Write `data` to `path` through a sibling temporary file.
async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = tmp_path_for(path);
    tokio::fs::write(&tmp_path, data).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[async_trait::async_trait]
impl ObjectStore for FileObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        let type_path = self.content_type_path(bucket, key);

        // Sidecar first: new bytes are never served with a stale type.
        match content_type {
            Some(content_type) => write_atomic(&type_path, content_type.as_bytes()).await?,
            None => match tokio::fs::remove_file(&type_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io(e)),
            },
        }
        write_atomic(&path, &data).await?;

        debug!(bucket, key, path = %path.display(), size = data.len(), "stored object to file");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, StoreError> {
        let path = self.object_path(bucket, key)?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => Bytes::from(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let type_path = self.content_type_path(bucket, key);
        let content_type = match tokio::fs::read_to_string(&type_path).await {
            Ok(content_type) => content_type,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => content_type_for(key).to_string(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(Some(StoredObject { data, content_type }))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        public_object_url(&self.public_base, bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (FileObjectStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path(), "http://localhost:8080").unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_upload_get_roundtrip() {
        let (store, _dir) = make_store();
        let data = Bytes::from_static(b"\x89PNG fake");

        store
            .upload("hf-images", "equipment/1700000000000-abc123.png", data.clone(), None)
            .await
            .unwrap();
        let obj = store
            .get("hf-images", "equipment/1700000000000-abc123.png")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(obj.data, data);
        assert_eq!(obj.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_layout_on_disk() {
        let (store, dir) = make_store();
        store
            .upload("hf-images", "gallery/photo.jpg", Bytes::from_static(b"jpg"), None)
            .await
            .unwrap();

        let expected = dir.path().join("hf-images").join("gallery").join("photo.jpg");
        assert_eq!(std::fs::read(&expected).unwrap(), b"jpg");
        assert!(!tmp_path_for(&expected).exists());
    }

    #[tokio::test]
    async fn test_get_nonexistent_returns_none() {
        let (store, _dir) = make_store();
        assert!(store.get("hf-images", "general/none.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_content_type_kept_for_extensionless_key() {
        let (store, _dir) = make_store();
        store
            .upload(
                "hf-images",
                "general/1700000000000-k3x9q2",
                Bytes::from_static(b"png"),
                Some("image/png"),
            )
            .await
            .unwrap();

        let obj = store
            .get("hf-images", "general/1700000000000-k3x9q2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(obj.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_content_type_survives_reopen_and_replace() {
        let (store, dir) = make_store();
        store
            .upload(
                "hf-images",
                "branding/logo",
                Bytes::from_static(b"svg"),
                Some("image/svg+xml"),
            )
            .await
            .unwrap();

        let store = FileObjectStore::new(dir.path(), "http://localhost:8080").unwrap();
        let obj = store.get("hf-images", "branding/logo").await.unwrap().unwrap();
        assert_eq!(obj.content_type, "image/svg+xml");

        // Replacing without a type drops the old one.
        store
            .upload("hf-images", "branding/logo", Bytes::from_static(b"raw"), None)
            .await
            .unwrap();
        let obj = store.get("hf-images", "branding/logo").await.unwrap().unwrap();
        assert_eq!(obj.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (store, _dir) = make_store();
        let err = store
            .upload("hf-images", "../../escape.png", Bytes::from_static(b"x"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }
}

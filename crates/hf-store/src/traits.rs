//! Core trait and helpers for object storage.

use bytes::Bytes;

use crate::error::StoreError;

/// An object as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Trait for storing and serving uploaded objects.
///
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` at `bucket/key`, replacing any existing object.
    ///
    /// `content_type` is served back by [`get`](Self::get); without one the
    /// type is guessed from the key's extension.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Fetch an object. Returns `None` if not found.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, StoreError>;

    /// Publicly resolvable URL of `bucket/key`.
    ///
    /// The URL is valid as soon as [`upload`](Self::upload) returns `Ok`.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Build `{base}/storage/{bucket}/{key}`, the path the HTTP layer serves
/// objects under.
pub fn public_object_url(base: &str, bucket: &str, key: &str) -> String {
    format!("{}/storage/{bucket}/{key}", base.trim_end_matches('/'))
}

/// Reject bucket/key pairs that could escape the store's namespace.
///
/// Buckets are `[a-z0-9-]+`; keys are `/`-separated segments that are
/// neither empty nor `.`/`..`.
pub fn validate_key(bucket: &str, key: &str) -> Result<(), StoreError> {
    let bucket_ok = !bucket.is_empty()
        && bucket
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');

    let key_ok = !key.is_empty()
        && !key.contains('\\')
        && key
            .split('/')
            .all(|seg| !seg.is_empty() && seg != "." && seg != "..");

    if bucket_ok && key_ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey {
            key: format!("{bucket}/{key}"),
        })
    }
}

/// Guess a content type from the key's extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_object_url_trims_base() {
        assert_eq!(
            public_object_url("http://localhost:8080/", "hf-images", "branding/a.png"),
            "http://localhost:8080/storage/hf-images/branding/a.png"
        );
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("hf-images", "branding/1-abc.png").is_ok());
        assert!(validate_key("hf-images", "../etc/passwd").is_err());
        assert!(validate_key("hf-images", "a//b.png").is_err());
        assert!(validate_key("hf-images", "/abs.png").is_err());
        assert!(validate_key("HF", "a.png").is_err());
        assert!(validate_key("hf-images", "").is_err());
    }

    #[test]
    fn test_content_type_for_known_extensions() {
        assert_eq!(content_type_for("branding/site.PNG"), "image/png");
        assert_eq!(content_type_for("x.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}

//! Image upload adapter.
//!
//! Turns a local file into a stored object and hands back its public URL.
//! Keys look like `{folder}/{unix_millis}-{suffix}.{ext}`; the extension is
//! whatever followed the last `.` of the original file name.

use std::sync::Arc;

use bytes::Bytes;
use hf_store::ObjectStore;
use hf_types::events::{EventBus, ObjectUploaded};
use rand::Rng;
use tracing::{info, warn};

use crate::error::SiteError;

/// Bucket images go to unless configured otherwise.
pub const DEFAULT_BUCKET: &str = "hf-images";

/// Folder used when the caller names none.
pub const DEFAULT_FOLDER: &str = "general";

const SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct ImageFile {
    /// Original file name; only its extension is kept.
    pub name: String,
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// The two ways an image field gets its value, plus clearing it.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Upload a file into `folder` and use the resulting URL.
    Upload { file: ImageFile, folder: Option<String> },
    /// Use a pasted URL as-is.
    Url(String),
    /// Empty the field.
    Clear,
}

/// Uploads images to one bucket of an [`ObjectStore`].
pub struct ImageUploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    bus: EventBus,
}

impl ImageUploader {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, bus: EventBus) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            bus,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Store `file` under `folder` and return its public URL.
    ///
    /// An empty folder means [`DEFAULT_FOLDER`]. No URL is produced unless
    /// the store accepted the bytes.
    pub async fn upload(&self, file: ImageFile, folder: &str) -> Result<String, SiteError> {
        let folder = match folder.trim().trim_matches('/') {
            "" => DEFAULT_FOLDER,
            f => f,
        };
        let key = storage_key(
            folder,
            &file.name,
            chrono::Utc::now().timestamp_millis(),
            &random_suffix(),
        );
        let size = file.bytes.len();

        if let Err(e) = self
            .store
            .upload(&self.bucket, &key, file.bytes, file.content_type.as_deref())
            .await
        {
            warn!(bucket = %self.bucket, %key, error = %e, "image upload failed");
            return Err(e.into());
        }

        info!(bucket = %self.bucket, %key, size, "image uploaded");
        self.bus.emit(ObjectUploaded {
            bucket: self.bucket.clone(),
            key: key.clone(),
            size,
        });
        Ok(self.store.public_url(&self.bucket, &key))
    }

    /// Resolve `input` into `field`.
    ///
    /// `field` is only written once the new value is known; a failed upload
    /// leaves it exactly as it was.
    pub async fn apply(&self, input: ImageInput, field: &mut String) -> Result<(), SiteError> {
        let value = match input {
            ImageInput::Upload { file, folder } => {
                self.upload(file, folder.as_deref().unwrap_or(DEFAULT_FOLDER))
                    .await?
            }
            ImageInput::Url(url) => url.trim().to_string(),
            ImageInput::Clear => String::new(),
        };
        *field = value;
        Ok(())
    }
}

/// Build the storage key for `file_name` uploaded at `millis`.
///
/// A name without a `.` (or ending in one) yields a key without extension.
pub fn storage_key(folder: &str, file_name: &str, millis: i64, suffix: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{folder}/{millis}-{suffix}.{ext}"),
        _ => format!("{folder}/{millis}-{suffix}"),
    }
}

/// Short random base-36 suffix.
fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

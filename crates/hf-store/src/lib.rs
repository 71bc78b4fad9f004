//! Object storage for uploaded images.
//!
//! This crate defines the [`ObjectStore`] trait (upload, fetch and public URL
//! resolution for `bucket/key` objects) and two backends:
//!
//! - [`MemoryObjectStore`] — in-memory storage backed by a `RwLock<HashMap>`.
//! - [`FileObjectStore`] — one file per object under `{base_dir}/{bucket}/{key}`,
//!   with its content type in a parallel `.content-types` tree.

mod error;
mod file_store;
mod memory_store;
mod traits;

pub use error::StoreError;
pub use file_store::FileObjectStore;
pub use memory_store::MemoryObjectStore;
pub use traits::{ObjectStore, StoredObject, content_type_for, public_object_url, validate_key};

//! Error types for site operations.

use hf_types::{RowId, TableName};

use crate::validation::ValidationError;

/// Errors that can occur in managers, uploads and public sections.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// A draft failed validation; nothing was sent to the backend.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The table backend rejected or failed the request.
    #[error(transparent)]
    Meta(#[from] hf_meta::MetaError),

    /// Object storage failed.
    #[error("upload failed: {0}")]
    Store(#[from] hf_store::StoreError),

    /// No row with this id exists in the table.
    #[error("no row {id} in {table}")]
    NotFound {
        /// Table that was targeted.
        table: TableName,
        /// Id that matched nothing.
        id: RowId,
    },

    /// A row came back in a shape its record type does not accept.
    #[error("malformed row in {table}: {source}")]
    Decode {
        /// Table the row was read from.
        table: TableName,
        /// Underlying decode failure.
        source: serde_json::Error,
    },

    /// A payload could not be turned into a row.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// `submit` was called with no create or edit in progress.
    #[error("nothing to submit: editor is idle")]
    NotEditing,
}

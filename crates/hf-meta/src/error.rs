//! Error types for table operations.

use hf_types::TableName;

/// Errors returned by [`TableClient`](crate::TableClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// Fjall database error.
    #[error("fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    /// I/O error (e.g. from Fjall guard operations).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Update and delete must be scoped by at least one filter.
    #[error("refusing unscoped write to {table}")]
    MissingFilter {
        /// Table the write targeted.
        table: TableName,
    },

    /// The backend rejected or failed the request.
    #[error("{message}")]
    Backend {
        /// Message passed through verbatim to the user.
        message: String,
    },
}

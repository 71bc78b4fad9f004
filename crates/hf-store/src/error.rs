//! Error types for object storage operations.

/// Errors that can occur during object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The bucket or key is not a safe storage path.
    #[error("invalid object key: {key:?}")]
    InvalidKey {
        /// The rejected `bucket/key`.
        key: String,
    },

    /// The store has reached its capacity limit.
    #[error("store capacity exceeded: need {needed} bytes, only {available} available")]
    CapacityExceeded {
        /// Bytes needed for the operation.
        needed: u64,
        /// Bytes currently available.
        available: u64,
    },
}

//! Error types for authentication.

/// Errors from the auth subsystem.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email unknown or password wrong. Deliberately does not say which.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Hashing or verifying a password failed.
    #[error("password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// The provider itself failed.
    #[error("{message}")]
    Backend {
        /// Message passed through from the provider.
        message: String,
    },
}

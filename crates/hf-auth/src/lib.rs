//! Admin authentication for the H&F dashboard.
//!
//! - [`AuthProvider`] — the seam to the auth subsystem: sign in, look up a
//!   session, sign out.
//! - [`LocalAuth`] — in-process provider with bcrypt-hashed admin accounts
//!   and expiring bearer sessions.
//! - [`SessionGuard`] — decides, before any manager runs, whether a request
//!   may enter the dashboard or must be redirected to [`LOGIN_PATH`].
//!
//! There are no roles: a caller is either authenticated or not.

mod error;
mod guard;
mod local;
mod session;

pub use error::AuthError;
pub use guard::{GuardOutcome, LOGIN_PATH, SessionGuard};
pub use local::{AdminAccount, LocalAuth, hash_password};
pub use session::Session;

/// Source of truth for admin sessions.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange credentials for a fresh session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Resolve a bearer token to its live session, if any.
    ///
    /// Unknown, malformed and expired tokens all yield `Ok(None)`.
    async fn get_session(&self, token: &str) -> Result<Option<Session>, AuthError>;

    /// Invalidate a session. Unknown tokens are not an error.
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;
}

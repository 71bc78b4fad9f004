//! The session value handed out by providers.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Proof of authentication.
///
/// `token` is the bearer value clients present back (cookie or
/// `Authorization: Bearer`). It is skipped when serializing so session
/// details can be echoed to the dashboard without leaking it.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

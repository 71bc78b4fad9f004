//! Dashboard entry check.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::AuthProvider;
use crate::session::Session;

/// Where unauthenticated dashboard requests are sent.
pub const LOGIN_PATH: &str = "/admin/login";

/// Result of a [`SessionGuard::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// An active session exists; the dashboard may run.
    Granted(Session),
    /// No active session; send the caller to this path.
    Redirect(&'static str),
}

/// Gates the dashboard on an active session.
#[derive(Clone)]
pub struct SessionGuard {
    provider: Arc<dyn AuthProvider>,
}

impl SessionGuard {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }

    /// The provider behind this guard.
    pub fn provider(&self) -> &Arc<dyn AuthProvider> {
        &self.provider
    }

    /// Look up the session for `token`.
    ///
    /// Provider failures are treated as "not signed in".
    pub async fn check(&self, token: Option<&str>) -> GuardOutcome {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            debug!("no session token presented");
            return GuardOutcome::Redirect(LOGIN_PATH);
        };

        match self.provider.get_session(token).await {
            Ok(Some(session)) => GuardOutcome::Granted(session),
            Ok(None) => {
                debug!("session token not recognised");
                GuardOutcome::Redirect(LOGIN_PATH)
            }
            Err(e) => {
                warn!(error = %e, "session lookup failed");
                GuardOutcome::Redirect(LOGIN_PATH)
            }
        }
    }

    /// Sign out and return where to send the caller.
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn sign_out(&self, token: Option<&str>) -> &'static str {
        if let Some(token) = token
            && let Err(e) = self.provider.sign_out(token).await
        {
            warn!(error = %e, "sign-out failed");
        }
        LOGIN_PATH
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{AdminAccount, AuthError, LocalAuth, hash_password};

    fn guard() -> (SessionGuard, Arc<LocalAuth>) {
        let auth = Arc::new(LocalAuth::new(
            [AdminAccount {
                email: "admin@hf.example".to_string(),
                password_hash: hash_password("pw", 4).unwrap(),
            }],
            Duration::hours(1),
        ));
        (SessionGuard::new(auth.clone()), auth)
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl AuthProvider for FailingProvider {
        async fn sign_in(&self, _: &str, _: &str) -> Result<Session, AuthError> {
            Err(AuthError::Backend {
                message: "auth service unavailable".to_string(),
            })
        }

        async fn get_session(&self, _: &str) -> Result<Option<Session>, AuthError> {
            Err(AuthError::Backend {
                message: "auth service unavailable".to_string(),
            })
        }

        async fn sign_out(&self, _: &str) -> Result<(), AuthError> {
            Err(AuthError::Backend {
                message: "auth service unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_missing_token_redirects() {
        let (guard, _) = guard();
        assert_eq!(guard.check(None).await, GuardOutcome::Redirect(LOGIN_PATH));
        assert_eq!(guard.check(Some("")).await, GuardOutcome::Redirect(LOGIN_PATH));
    }

    #[tokio::test]
    async fn test_valid_session_granted() {
        let (guard, auth) = guard();
        let session = auth.sign_in("admin@hf.example", "pw").await.unwrap();

        match guard.check(Some(&session.token)).await {
            GuardOutcome::Granted(s) => assert_eq!(s.email, "admin@hf.example"),
            other => panic!("expected Granted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sign_out_redirects_and_revokes() {
        let (guard, auth) = guard();
        let session = auth.sign_in("admin@hf.example", "pw").await.unwrap();

        assert_eq!(guard.sign_out(Some(&session.token)).await, LOGIN_PATH);
        assert_eq!(
            guard.check(Some(&session.token)).await,
            GuardOutcome::Redirect(LOGIN_PATH)
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_fatal() {
        let guard = SessionGuard::new(Arc::new(FailingProvider));
        assert_eq!(
            guard.check(Some("a.b")).await,
            GuardOutcome::Redirect(LOGIN_PATH)
        );
        assert_eq!(guard.sign_out(Some("a.b")).await, LOGIN_PATH);
    }
}

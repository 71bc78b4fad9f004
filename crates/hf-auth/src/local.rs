//! In-process [`AuthProvider`] with bcrypt accounts and expiring sessions.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Duration, Utc};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::session::Session;
use crate::AuthProvider;

/// An admin allowed to sign in.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub email: String,
    /// bcrypt hash, as produced by [`hash_password`].
    pub password_hash: String,
}

struct StoredSession {
    /// Compared in constant time against the presented secret.
    secret: String,
    session: Session,
}

/// Local auth provider.
///
/// Tokens have the shape `<session_id>.<secret>`: the id selects the
/// session, the secret is compared in constant time.
pub struct LocalAuth {
    accounts: HashMap<String, String>,
    /// Verified against on unknown emails, at the accounts' cost, so both
    /// failures take the same time.
    dummy_hash: String,
    sessions: RwLock<HashMap<String, StoredSession>>,
    ttl: Duration,
}

impl LocalAuth {
    /// Create a provider for `accounts` whose sessions live for `ttl`.
    ///
    /// Emails are matched case-insensitively.
    pub fn new(accounts: impl IntoIterator<Item = AdminAccount>, ttl: Duration) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|a| (a.email.trim().to_lowercase(), a.password_hash))
            .collect::<HashMap<_, _>>();
        let cost = accounts
            .values()
            .filter_map(|hash| hash.parse::<bcrypt::HashParts>().ok())
            .map(|parts| parts.get_cost())
            .max()
            .unwrap_or(MIN_COST);
        let dummy_hash = bcrypt::hash(random_hex(16), cost)
            .or_else(|_| bcrypt::hash(random_hex(16), MIN_COST))
            .unwrap_or_default();
        Self {
            accounts,
            dummy_hash,
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of configured admin accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().expect("lock poisoned");
        let before = sessions.len();
        sessions.retain(|_, s| !s.session.is_expired_at(now));
        before - sessions.len()
    }
}

#[async_trait::async_trait]
impl AuthProvider for LocalAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim().to_lowercase();
        let Some(hash) = self.accounts.get(&email).cloned() else {
            // Burn the same bcrypt work a known account would.
            let _ = verify(password, self.dummy_hash.clone()).await;
            warn!(%email, "sign-in for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify(password, hash).await? {
            warn!(%email, "sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let session_id = random_hex(12);
        let secret = random_hex(32);
        let session = Session {
            token: format!("{session_id}.{secret}"),
            email: email.clone(),
            expires_at: Utc::now() + self.ttl,
        };

        self.sessions.write().expect("lock poisoned").insert(
            session_id,
            StoredSession {
                secret,
                session: session.clone(),
            },
        );

        info!(%email, expires_at = %session.expires_at, "admin signed in");
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let Some((session_id, secret)) = token.split_once('.') else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut sessions = self.sessions.write().expect("lock poisoned");

        let Some(stored) = sessions.get(session_id) else {
            return Ok(None);
        };
        if !bool::from(stored.secret.as_bytes().ct_eq(secret.as_bytes())) {
            return Ok(None);
        }
        if stored.session.is_expired_at(now) {
            debug!(email = %stored.session.email, "session expired");
            sessions.remove(session_id);
            return Ok(None);
        }

        Ok(Some(stored.session.clone()))
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let Some((session_id, secret)) = token.split_once('.') else {
            return Ok(());
        };

        let mut sessions = self.sessions.write().expect("lock poisoned");
        let owned = sessions
            .get(session_id)
            .is_some_and(|s| s.secret.as_bytes().ct_eq(secret.as_bytes()).into());
        if owned && let Some(stored) = sessions.remove(session_id) {
            info!(email = %stored.session.email, "admin signed out");
        }
        Ok(())
    }
}

/// Lowest cost bcrypt accepts.
const MIN_COST: u32 = 4;

async fn verify(password: &str, hash: String) -> Result<bool, AuthError> {
    // bcrypt blocks; run it off the async workers.
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Backend {
            message: e.to_string(),
        })?
        .map_err(AuthError::from)
}

/// Hash a password for an [`AdminAccount`].
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// `2 * bytes` lowercase hex characters of fresh randomness.
fn random_hex(bytes: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(ttl: Duration) -> LocalAuth {
        let hash = hash_password("hunter22", 4).unwrap();
        LocalAuth::new(
            [AdminAccount {
                email: "Admin@HF.example".to_string(),
                password_hash: hash,
            }],
            ttl,
        )
    }

    #[tokio::test]
    async fn test_sign_in_then_get_session() {
        let auth = provider(Duration::hours(1));
        let session = auth.sign_in("admin@hf.example", "hunter22").await.unwrap();
        assert_eq!(session.email, "admin@hf.example");

        let found = auth.get_session(&session.token).await.unwrap().unwrap();
        assert_eq!(found, session);
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let auth = provider(Duration::hours(1));
        let err = auth.sign_in("admin@hf.example", "nope").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_account_rejected() {
        let auth = provider(Duration::hours(1));
        let err = auth.sign_in("who@hf.example", "hunter22").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_unknown_account_pays_the_account_cost() {
        let auth = LocalAuth::new(
            [AdminAccount {
                email: "admin@hf.example".to_string(),
                password_hash: hash_password("hunter22", 5).unwrap(),
            }],
            Duration::hours(1),
        );
        let parts: bcrypt::HashParts = auth.dummy_hash.parse().unwrap();
        assert_eq!(parts.get_cost(), 5);

        let nobody = LocalAuth::new(Vec::<AdminAccount>::new(), Duration::hours(1));
        let parts: bcrypt::HashParts = nobody.dummy_hash.parse().unwrap();
        assert_eq!(parts.get_cost(), MIN_COST);
    }

    #[tokio::test]
    async fn test_tampered_secret_has_no_session() {
        let auth = provider(Duration::hours(1));
        let session = auth.sign_in("admin@hf.example", "hunter22").await.unwrap();
        let (id, _) = session.token.split_once('.').unwrap();

        assert!(auth.get_session(&format!("{id}.deadbeef")).await.unwrap().is_none());
        assert!(auth.get_session("garbage").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_invalidates() {
        let auth = provider(Duration::hours(1));
        let session = auth.sign_in("admin@hf.example", "hunter22").await.unwrap();

        auth.sign_out(&session.token).await.unwrap();
        assert!(auth.get_session(&session.token).await.unwrap().is_none());

        // Signing out twice is fine.
        auth.sign_out(&session.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_gone() {
        let auth = provider(Duration::zero());
        let session = auth.sign_in("admin@hf.example", "hunter22").await.unwrap();
        assert!(auth.get_session(&session.token).await.unwrap().is_none());
        assert_eq!(auth.purge_expired(), 0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let auth = provider(Duration::zero());
        auth.sign_in("admin@hf.example", "hunter22").await.unwrap();
        auth.sign_in("admin@hf.example", "hunter22").await.unwrap();
        assert_eq!(auth.purge_expired(), 2);
    }
}

//! Access-code gate for the bot.
//!
//! Authentication is binary and process-wide: a user either has entered the
//! shared access code during this process lifetime or has not. Nothing is
//! persisted, so every restart requires re-entry of the code.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Result of an access-code submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Code matched, user is now authenticated
    Accepted,
    /// User was authenticated before this submission; no state change
    AlreadyAuthenticated,
    /// Code did not match
    Rejected,
}

/// One-way digest comparison against the configured access code.
///
/// The plain code is dropped after hashing so it never sits in memory or in
/// log output alongside user submissions.
pub struct AccessCodeVerifier {
    digest: [u8; 32],
}

impl AccessCodeVerifier {
    #[must_use]
    pub fn new(code: &str) -> Self {
        Self {
            digest: Sha256::digest(code.as_bytes()).into(),
        }
    }

    /// Check a submitted code against the configured one
    #[must_use]
    pub fn verify(&self, submitted: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(submitted.as_bytes()).into();
        candidate == self.digest
    }
}

/// Process-lifetime session map keyed by Telegram user id
pub struct SessionStore {
    verifier: AccessCodeVerifier,
    authenticated: RwLock<HashSet<i64>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(verifier: AccessCodeVerifier) -> Self {
        Self {
            verifier,
            authenticated: RwLock::new(HashSet::new()),
        }
    }

    /// Whether the user has entered the correct access code this process
    pub async fn is_authenticated(&self, user_id: i64) -> bool {
        self.authenticated.read().await.contains(&user_id)
    }

    /// Consume one access-code attempt.
    ///
    /// There is no attempt limit and no expiry; re-submitting after success
    /// yields `AlreadyAuthenticated` rather than a state change.
    pub async fn authenticate(&self, user_id: i64, submitted: &str) -> AuthOutcome {
        let mut authenticated = self.authenticated.write().await;
        if authenticated.contains(&user_id) {
            return AuthOutcome::AlreadyAuthenticated;
        }
        if self.verifier.verify(submitted) {
            authenticated.insert(user_id);
            AuthOutcome::Accepted
        } else {
            AuthOutcome::Rejected
        }
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::CollaboratorError;

pub mod extractors;
pub mod supabase;

/// Session material returned alongside a freshly created identity.
///
/// Refresh and expiry are left to whoever owns the session; the registration
/// workflow only uses `access_token` to authorize the profile write.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(with = "time::serde::timestamp::option", default)]
    pub expires_at: Option<OffsetDateTime>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Identity created by the auth collaborator. `id` is opaque to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub id: String,
    pub email: Option<String>,
    /// `None` when the provider withholds a session until the email is confirmed.
    pub session: Option<AuthSession>,
}

impl AuthIdentity {
    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity, CollaboratorError>;

    /// Resolves the identity an access token was issued to; rejects invalid or expired tokens.
    async fn user(&self, access_token: &str) -> Result<AuthIdentity, CollaboratorError>;
}
